//! Models for mail.tm accounts and messages.

use crate::extract::Extraction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An authenticated mailbox: the address plus the bearer token for it.
///
/// The token expires on the provider side; nothing here tracks that.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAccount {
    /// Full email address.
    pub email: String,
    /// Bearer token for the mailbox.
    pub token: String,
}

impl fmt::Debug for MailAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailAccount")
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// A domain new addresses can be created under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Domain name, e.g. `example.com`.
    pub domain: String,
    /// Whether the provider currently accepts new accounts on it.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Inbox listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    /// Unique message ID.
    pub id: String,
    /// Sender address.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Short preview of the body.
    pub intro: String,
    /// Whether the message has been marked seen.
    pub seen: bool,
    /// When the provider received the message.
    pub created_at: DateTime<Utc>,
}

/// Full message with extracted OTP and verification link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    /// Unique message ID.
    pub id: String,
    /// Sender address.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body, empty if the message had none.
    pub text: String,
    /// HTML body with all fragments joined, empty if the message had none.
    pub html: String,
    /// Whether the message has been marked seen.
    pub seen: bool,
    /// When the provider received the message.
    pub created_at: DateTime<Utc>,
    /// First numeric one-time passcode found in the text body.
    pub otp: Extraction,
    /// First URL found in the HTML body (or the text body if there is no HTML).
    pub verification_link: Extraction,
}

/// Provider-acknowledged result of a seen/unseen update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeenUpdate {
    /// Message ID that was updated.
    pub id: String,
    /// Seen value as reported back by the provider.
    pub seen: bool,
}

/// Listing wrapper carrying the message count alongside the messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageList {
    /// Number of messages.
    pub count: usize,
    /// Messages in provider order.
    pub messages: Vec<MessageSummary>,
}

impl From<Vec<MessageSummary>> for MessageList {
    fn from(messages: Vec<MessageSummary>) -> Self {
        Self {
            count: messages.len(),
            messages,
        }
    }
}

/// JSON shapes as the provider sends them.
pub(crate) mod wire {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    /// Collection responses come as JSON-LD (`hydra:member`) or a bare array,
    /// depending on the `Accept` header the provider honours.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub(crate) enum Collection<T> {
        Hydra {
            #[serde(rename = "hydra:member")]
            member: Vec<T>,
        },
        Plain(Vec<T>),
    }

    impl<T> Collection<T> {
        pub(crate) fn into_vec(self) -> Vec<T> {
            match self {
                Self::Hydra { member } => member,
                Self::Plain(items) => items,
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub(crate) struct Address {
        pub(crate) address: String,
    }

    #[derive(Debug, Deserialize)]
    pub(crate) struct Token {
        pub(crate) token: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(crate) struct Summary {
        pub(crate) id: String,
        pub(crate) from: Address,
        #[serde(default)]
        pub(crate) subject: String,
        #[serde(default)]
        pub(crate) intro: String,
        #[serde(default)]
        pub(crate) seen: bool,
        pub(crate) created_at: DateTime<Utc>,
    }

    /// `html` arrives as a list of fragments, occasionally as a single string.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub(crate) enum Html {
        Parts(Vec<String>),
        Single(String),
    }

    impl Html {
        pub(crate) fn join(self) -> String {
            match self {
                Self::Parts(parts) => parts.concat(),
                Self::Single(html) => html,
            }
        }
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub(crate) struct Detail {
        pub(crate) id: String,
        pub(crate) from: Address,
        #[serde(default)]
        pub(crate) subject: String,
        #[serde(default)]
        pub(crate) text: Option<String>,
        #[serde(default)]
        pub(crate) html: Option<Html>,
        #[serde(default)]
        pub(crate) seen: bool,
        pub(crate) created_at: DateTime<Utc>,
    }

    #[derive(Debug, Deserialize)]
    pub(crate) struct Seen {
        pub(crate) seen: bool,
    }
}

impl From<wire::Summary> for MessageSummary {
    fn from(raw: wire::Summary) -> Self {
        Self {
            id: raw.id,
            from: raw.from.address,
            subject: raw.subject,
            intro: raw.intro,
            seen: raw.seen,
            created_at: raw.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::wire::{Collection, Detail};
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_accepts_hydra_and_plain_arrays() {
        let hydra: Collection<Domain> = serde_json::from_value(json!({
            "hydra:member": [{ "domain": "a.test", "isActive": true }],
            "hydra:totalItems": 1
        }))
        .unwrap();
        assert_eq!(hydra.into_vec()[0].domain, "a.test");

        let plain: Collection<Domain> =
            serde_json::from_value(json!([{ "domain": "b.test" }])).unwrap();
        let domains = plain.into_vec();
        assert_eq!(domains[0].domain, "b.test");
        assert!(domains[0].is_active);
    }

    #[test]
    fn detail_html_fragments_are_concatenated() {
        let detail: Detail = serde_json::from_value(json!({
            "id": "m1",
            "from": { "address": "a@b.test", "name": "A" },
            "subject": "Hi",
            "text": "hello",
            "html": ["<p>one</p>", "<p>two</p>"],
            "seen": false,
            "createdAt": "2024-05-01T10:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(detail.html.unwrap().join(), "<p>one</p><p>two</p>");
    }

    #[test]
    fn detail_tolerates_missing_bodies() {
        let detail: Detail = serde_json::from_value(json!({
            "id": "m1",
            "from": { "address": "a@b.test" },
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert!(detail.text.is_none());
        assert!(detail.html.is_none());
        assert_eq!(detail.subject, "");
    }

    #[test]
    fn account_debug_hides_token() {
        let account = MailAccount {
            email: "x@y.test".to_string(),
            token: "secret-token".to_string(),
        };
        let rendered = format!("{account:?}");
        assert!(rendered.contains("x@y.test"));
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = MessageSummary {
            id: "1".to_string(),
            from: "a@b.test".to_string(),
            subject: "s".to_string(),
            intro: "i".to_string(),
            seen: false,
            created_at: "2024-05-01T10:00:00Z".parse().unwrap(),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("createdAt").is_some());
    }
}
