//! One-time passcode and verification link extraction.
//!
//! Both scanners are heuristics. The OTP pattern matches any standalone run of
//! 4 to 8 ASCII digits, so zip codes or short IDs in the text can be returned
//! instead of the code.
//!
//! Word boundaries are ASCII-only: a code glued to a non-ASCII letter
//! (`Код1234`) still counts as standalone.

use crate::{Operation, Result};
use regex::Regex;
use serde::Serialize;

const OTP_PATTERN: &str = r"(?-u:\b)[0-9]{4,8}(?-u:\b)";
const LINK_PATTERN: &str = r#"(?i)https?://[^\s"'<>]+"#;

/// Return the first standalone 4 to 8 digit number in `text`.
///
/// Digits embedded in longer digit runs or glued to ASCII letters do not match.
/// Word boundaries are ASCII-only, so a code right after a non-ASCII letter
/// (`Код1234`) still matches.
pub fn extract_otp(text: &str) -> Result<Option<String>> {
    let re = Regex::new(OTP_PATTERN)?;
    Ok(re.find(text).map(|m| m.as_str().to_string()))
}

/// Return the first `http(s)` URL, ending before whitespace, quotes or angle brackets.
///
/// `html` is scanned when it is non-empty, otherwise `text` is.
pub fn extract_verification_link(html: &str, text: &str) -> Result<Option<String>> {
    let source = if html.is_empty() { text } else { html };
    let re = Regex::new(LINK_PATTERN)?;
    Ok(re.find(source).map(|m| m.as_str().to_string()))
}

/// Outcome of a single extraction.
///
/// `Missing` is a successful scan that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Extraction {
    /// Pattern matched.
    Found(String),
    /// Scan completed without a match.
    Missing,
    /// Scan itself failed; carries the display message.
    Failed(String),
}

impl Extraction {
    /// Fold a scan result into an `Extraction`, logging the cause on failure.
    pub fn from_result(operation: Operation, result: Result<Option<String>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::Missing,
            Err(err) => {
                log::warn!("{}: {err}", operation.failure_message());
                Self::Failed(operation.failure_message().to_string())
            }
        }
    }

    /// Scan `text` for a passcode.
    pub fn otp(text: &str) -> Self {
        Self::from_result(Operation::ExtractOtp, extract_otp(text))
    }

    /// Scan `html`, or `text` when there is no HTML, for a link.
    pub fn verification_link(html: &str, text: &str) -> Self {
        Self::from_result(
            Operation::ExtractLink,
            extract_verification_link(html, text),
        )
    }

    /// The matched value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    /// `false` only when the scan itself failed.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn otp_found_in_sentence() {
        let otp = extract_otp("Your code is 482913, expires in 10 minutes").unwrap();
        assert_eq!(otp.as_deref(), Some("482913"));
    }

    #[test]
    fn otp_respects_length_bounds() {
        assert_eq!(extract_otp("pin 123 only").unwrap(), None);
        assert_eq!(extract_otp("id 1234567890123").unwrap(), None);
        assert_eq!(extract_otp("code 1234").unwrap().as_deref(), Some("1234"));
        assert_eq!(
            extract_otp("code 12345678.").unwrap().as_deref(),
            Some("12345678")
        );
    }

    #[test]
    fn otp_ignores_digits_glued_to_letters() {
        assert_eq!(extract_otp("ref ABC123456 done").unwrap(), None);
        assert_eq!(extract_otp("").unwrap(), None);
    }

    #[test]
    fn otp_found_after_non_ascii_letters() {
        let otp = extract_otp("Код1234 and é5678").unwrap();
        assert_eq!(otp.as_deref(), Some("1234"));
        assert_eq!(extract_otp("café5678").unwrap().as_deref(), Some("5678"));
    }

    #[test]
    fn otp_returns_first_match() {
        let otp = extract_otp("first 1111 then 222222").unwrap();
        assert_eq!(otp.as_deref(), Some("1111"));
    }

    #[test]
    fn link_found_in_anchor() {
        let html = r#"<a href="https://example.com/verify?token=abc">Verify</a>"#;
        let link = extract_verification_link(html, "").unwrap();
        assert_eq!(link.as_deref(), Some("https://example.com/verify?token=abc"));
    }

    #[test]
    fn link_stops_at_terminators() {
        let text = "go to http://a.test/x?y=1 now";
        assert_eq!(
            extract_verification_link("", text).unwrap().as_deref(),
            Some("http://a.test/x?y=1")
        );
        assert_eq!(
            extract_verification_link("<https://b.test/z>", "").unwrap().as_deref(),
            Some("https://b.test/z")
        );
        assert_eq!(
            extract_verification_link("'https://c.test/q'", "").unwrap().as_deref(),
            Some("https://c.test/q")
        );
    }

    #[test]
    fn link_prefers_html_over_text() {
        let link = extract_verification_link(
            r#"<a href="https://html.test/v">v</a>"#,
            "https://text.test/v",
        )
        .unwrap();
        assert_eq!(link.as_deref(), Some("https://html.test/v"));
    }

    #[test]
    fn link_falls_back_to_text_when_html_empty() {
        let link = extract_verification_link("", "visit HTTPS://Text.test/v").unwrap();
        assert_eq!(link.as_deref(), Some("HTTPS://Text.test/v"));
    }

    #[test]
    fn link_missing_is_success() {
        assert_eq!(extract_verification_link("<p>no links</p>", "").unwrap(), None);
        let extraction = Extraction::verification_link("", "");
        assert_eq!(extraction, Extraction::Missing);
        assert!(extraction.is_success());
    }

    #[test]
    fn extraction_serializes_with_status_tag() {
        let found = serde_json::to_value(Extraction::otp("code 9876")).unwrap();
        assert_eq!(found, serde_json::json!({ "status": "found", "value": "9876" }));
        let missing = serde_json::to_value(Extraction::Missing).unwrap();
        assert_eq!(missing, serde_json::json!({ "status": "missing" }));
    }

    #[test]
    fn failed_scan_reports_display_message() {
        let extraction = Extraction::from_result(
            Operation::ExtractOtp,
            Err(Error::InvalidInput("bad".to_string())),
        );
        assert_eq!(extraction, Extraction::Failed("Failed to extract OTP".to_string()));
        assert!(!extraction.is_success());
        assert_eq!(extraction.value(), None);
    }
}
