//! mail.tm async client implementation.
//!
//! This module provides an async [`Client`] and [`ClientBuilder`] for interacting with
//! the mail.tm temporary email REST API.
//!
//! Typical flow:
//! 1) Build a client (`Client::new` or `Client::builder().build()`)
//! 2) Create a mailbox via [`Client::create_account`]
//! 3) Poll the inbox via [`Client::list_messages`] (or a [`Poller`](crate::Poller))
//! 4) Fetch a full message via [`Client::read_message`]
//! 5) Mark it seen via [`Client::mark_seen`]
//! 6) Optionally remove the mailbox via [`Client::delete_account`]
//!
//! The client holds no mailbox state: every mailbox-scoped call takes the bearer
//! token explicitly.

use crate::models::wire;
use crate::{
    Credentials, Domain, Error, Extraction, MailAccount, MessageDetail, MessageSummary, Result,
    SeenUpdate,
};
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Async client for the mail.tm temporary email service.
///
/// `Client` is `Clone` and cheap to clone (the underlying `reqwest` connection pool
/// is shared). Create it once and hand clones to pollers and request handlers.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    proxy: Option<String>,
    user_agent: String,
    base_url: Url,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("http", &"<reqwest::Client>")
            .field("proxy", &self.proxy)
            .field("user_agent", &self.user_agent)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl Client {
    /// Create a [`ClientBuilder`] for configuring a new client.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::Client;
    /// # fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::builder()
    ///     .user_agent("my-app/1.0")
    ///     .timeout(std::time::Duration::from_secs(10))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client for the public mail.tm API with default settings.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Get the proxy URL configured for this client (if any).
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// The API base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// List the domains new addresses can be created under, in provider order.
    pub async fn domains(&self) -> Result<Vec<Domain>> {
        let url = self.endpoint(&["domains"])?;
        let domains: wire::Collection<Domain> =
            self.request(ApiMethod::Get, url, None, None).await?;
        Ok(domains.into_vec())
    }

    /// Create a mailbox with random credentials and log in to it.
    ///
    /// Uses the first domain the provider lists. Registration and login run in
    /// sequence; a [`MailAccount`] is only returned when both succeed.
    ///
    /// If registration succeeds but login fails the account stays behind on the
    /// provider with nobody holding its credentials. This is logged, not recovered.
    ///
    /// # Errors
    /// Returns an error if the domain list is empty or any of the three requests fails.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::new()?;
    /// let account = client.create_account().await?;
    /// println!("{}", account.email);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_account(&self) -> Result<MailAccount> {
        let domain = self
            .domains()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoDomains)?;

        let credentials = Credentials::generate(&domain.domain);
        self.register(&credentials).await?;

        let token = match self.login(&credentials).await {
            Ok(token) => token,
            Err(err) => {
                log::warn!(
                    "account {} was registered but login failed; it is left orphaned",
                    credentials.address
                );
                return Err(err);
            }
        };

        Ok(MailAccount {
            email: credentials.address,
            token,
        })
    }

    /// Register an account with the given credentials (`POST /accounts`).
    pub async fn register(&self, credentials: &Credentials) -> Result<()> {
        let url = self.endpoint(&["accounts"])?;
        let body = Payload::Json(serde_json::to_value(credentials)?);
        self.request_status(ApiMethod::Post, url, None, Some(body))
            .await?;
        Ok(())
    }

    /// Exchange credentials for a bearer token (`POST /token`).
    pub async fn login(&self, credentials: &Credentials) -> Result<String> {
        let url = self.endpoint(&["token"])?;
        let body = Payload::Json(serde_json::to_value(credentials)?);
        let token: wire::Token = self
            .request(ApiMethod::Post, url, None, Some(body))
            .await?;
        Ok(token.token)
    }

    /// Delete the mailbox the token belongs to (`DELETE /me`).
    ///
    /// Not retried. The token is useless afterwards.
    pub async fn delete_account(&self, token: &str) -> Result<()> {
        let url = self.endpoint(&["me"])?;
        self.request_status(ApiMethod::Delete, url, Some(token), None)
            .await?;
        Ok(())
    }

    /// List the first page of messages, in the order the provider returns them.
    ///
    /// An empty inbox is an empty `Vec`, not an error.
    ///
    /// # Examples
    /// ```no_run
    /// # use mailtm_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), mailtm_client::Error> {
    /// let client = Client::new()?;
    /// let account = client.create_account().await?;
    /// for msg in client.list_messages(&account.token).await? {
    ///     println!("{}: {}", msg.from, msg.subject);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_messages(&self, token: &str) -> Result<Vec<MessageSummary>> {
        self.list_messages_page(token, 1).await
    }

    /// List one page (1-based) of messages.
    pub async fn list_messages_page(&self, token: &str, page: u32) -> Result<Vec<MessageSummary>> {
        if page == 0 {
            return Err(Error::InvalidInput("pages start at 1".to_string()));
        }

        let mut url = self.endpoint(&["messages"])?;
        if page > 1 {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }

        let messages: wire::Collection<wire::Summary> =
            self.request(ApiMethod::Get, url, Some(token), None).await?;
        Ok(messages
            .into_vec()
            .into_iter()
            .map(MessageSummary::from)
            .collect())
    }

    /// Fetch one message and extract its OTP and verification link.
    ///
    /// HTML fragments are joined in order. The OTP is taken from the plain text
    /// body; the link from the HTML, or from the text when there is no HTML.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the provider has no message with this id; any other
    /// transport or decoding failure otherwise.
    pub async fn read_message(&self, token: &str, id: &str) -> Result<MessageDetail> {
        let url = self.message_url(id)?;
        let raw: wire::Detail = self.request(ApiMethod::Get, url, Some(token), None).await?;

        let text = raw.text.unwrap_or_default();
        let html = raw.html.map(wire::Html::join).unwrap_or_default();
        let otp = Extraction::otp(&text);
        let verification_link = Extraction::verification_link(&html, &text);

        Ok(MessageDetail {
            id: raw.id,
            from: raw.from.address,
            subject: raw.subject,
            text,
            html,
            seen: raw.seen,
            created_at: raw.created_at,
            otp,
            verification_link,
        })
    }

    /// Set the seen flag on one message with a merge-patch.
    ///
    /// The returned `seen` is what the provider reports after the update, which is
    /// authoritative even if it differs from the requested value.
    pub async fn mark_seen(&self, token: &str, id: &str, seen: bool) -> Result<SeenUpdate> {
        let url = self.message_url(id)?;
        let body = Payload::MergePatch(serde_json::json!({ "seen": seen }));
        let ack: wire::Seen = self
            .request(ApiMethod::Patch, url, Some(token), Some(body))
            .await?;

        Ok(SeenUpdate {
            id: id.to_string(),
            seen: ack.seen,
        })
    }

    async fn request_status(
        &self,
        method: ApiMethod,
        url: Url,
        token: Option<&str>,
        payload: Option<Payload>,
    ) -> Result<StatusCode> {
        let (status, _body) = self.execute_request(method, url, token, payload).await?;
        Ok(status)
    }

    async fn request<T>(
        &self,
        method: ApiMethod,
        url: Url,
        token: Option<&str>,
        payload: Option<Payload>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let (_status, body) = self.execute_request(method, url, token, payload).await?;
        let parsed = serde_json::from_slice::<T>(&body)?;
        Ok(parsed)
    }

    async fn execute_request(
        &self,
        method: ApiMethod,
        url: Url,
        token: Option<&str>,
        payload: Option<Payload>,
    ) -> Result<(StatusCode, Vec<u8>)> {
        log::debug!("mail.tm request: {:?} {}", method, url.path());

        #[cfg(feature = "debug_responses")]
        if let Some(payload) = &payload {
            self.log_payload(payload);
        }

        let mut request = match method {
            ApiMethod::Get => self.http.get(url.clone()),
            ApiMethod::Post => self.http.post(url.clone()),
            ApiMethod::Patch => self.http.patch(url.clone()),
            ApiMethod::Delete => self.http.delete(url.clone()),
        }
        .headers(self.headers());

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request = match payload {
            Some(Payload::Json(value)) => request.json(&value),
            Some(Payload::MergePatch(value)) => request
                .header(CONTENT_TYPE, HeaderValue::from_static(MERGE_PATCH))
                .body(serde_json::to_vec(&value)?),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;

            #[cfg(feature = "debug_responses")]
            self.log_response(status, &body);

            return Ok((status, body.to_vec()));
        }

        // Read a small body snippet for diagnostics without wasting too much bandwidth.
        let body_snippet = response
            .text()
            .await
            .unwrap_or_else(|_| "<unavailable>".to_string())
            .chars()
            .take(512)
            .collect::<String>();

        log::debug!(
            "mail.tm rejected {:?} {} with HTTP {}: {}",
            method,
            url.path(),
            status.as_u16(),
            body_snippet
        );

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }

        Err(Error::RemoteRejected {
            status: status.as_u16(),
            body: body_snippet,
        })
    }

    /// Build `base_url` + `segments`, each segment percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn message_url(&self, id: &str) -> Result<Url> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput("missing message id".to_string()));
        }
        self.endpoint(&["messages", id])
    }

    #[cfg(feature = "debug_responses")]
    fn log_payload(&self, payload: &Payload) {
        let (Payload::Json(value) | Payload::MergePatch(value)) = payload;
        let mut value = value.clone();
        redact_secrets_in_value(&mut value);
        log::debug!("mail.tm request body: {value}");
    }

    #[cfg(feature = "debug_responses")]
    fn log_response(&self, status: StatusCode, body: &[u8]) {
        if let Ok(mut value) = serde_json::from_slice::<serde_json::Value>(body) {
            redact_secrets_in_value(&mut value);
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                log::debug!("mail.tm response (status={}):\n{pretty}", status.as_str());
                return;
            }
        }

        let body_text = String::from_utf8_lossy(body);
        log::debug!(
            "mail.tm response (status={}):\n{}",
            status.as_str(),
            redact_secrets_in_text(&body_text)
        );
    }

    /// Headers sent with every request. Authorization is added per call.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/ld+json, application/json;q=0.9"),
        );

        headers
    }
}

#[cfg(feature = "debug_responses")]
fn is_secret_key(key: &str) -> bool {
    let key = key.to_lowercase();
    key.contains("token") || key.contains("password")
}

#[cfg(feature = "debug_responses")]
fn redact_secrets_in_value(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_secret_key(key) {
                    *val = serde_json::Value::String("<redacted>".to_string());
                } else {
                    redact_secrets_in_value(val);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                redact_secrets_in_value(item);
            }
        }
        _ => {}
    }
}

#[cfg(feature = "debug_responses")]
fn redact_secrets_in_text(raw: &str) -> String {
    let mut redacted = raw.to_string();

    let patterns = [
        r#"(?i)("token"\s*:\s*")[^"]*(")"#,
        r#"(?i)("password"\s*:\s*")[^"]*(")"#,
        r#"(?i)(Bearer\s+)[A-Za-z0-9._~+/=-]+"#,
    ];

    for pattern in patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            redacted = re
                .replace_all(&redacted, |caps: &regex::Captures<'_>| {
                    if caps.len() >= 3 {
                        format!("{}<redacted>{}", &caps[1], &caps[2])
                    } else {
                        format!("{}<redacted>", &caps[1])
                    }
                })
                .to_string();
        }
    }

    redacted
}

const BASE_URL: &str = "https://api.mail.tm";
const MERGE_PATCH: &str = "application/merge-patch+json";
const USER_AGENT_VALUE: &str = concat!("mailtm-client/", env!("CARGO_PKG_VERSION"));

/// Builder for configuring a mail.tm [`Client`].
///
/// # Defaults
/// - No proxy
/// - `danger_accept_invalid_certs = false`
/// - User agent `mailtm-client/<version>`
/// - Base URL `https://api.mail.tm`
/// - Reqwest default timeout
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    proxy: Option<String>,
    danger_accept_invalid_certs: bool,
    user_agent: String,
    base_url: String,
    timeout: Option<Duration>,
}

enum Payload {
    Json(serde_json::Value),
    MergePatch(serde_json::Value),
}

#[derive(Copy, Clone, Debug)]
enum ApiMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// See [`ClientBuilder`] for the list of defaults.
    pub fn new() -> Self {
        Self {
            proxy: None,
            danger_accept_invalid_certs: false,
            user_agent: USER_AGENT_VALUE.to_string(),
            base_url: BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Set a proxy URL (e.g. `"http://127.0.0.1:8080"`).
    ///
    /// The proxy is applied to all requests performed by the underlying `reqwest::Client`.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Configure whether to accept invalid TLS certificates (default: `false`).
    ///
    /// # Security
    /// Accepting invalid certificates is unsafe on untrusted networks; it is primarily useful
    /// for debugging or traffic inspection in controlled environments.
    pub fn danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.danger_accept_invalid_certs = value;
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the API base URL.
    ///
    /// Useful for self-hosted deployments of the same API and for testing.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a request timeout applied to all operations.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the [`Client`].
    ///
    /// # Errors
    /// Returns an error if the base URL does not parse or cannot carry a path, or if
    /// the HTTP client cannot be constructed (e.g. invalid proxy URL).
    pub fn build(self) -> Result<Client> {
        let base_url = Url::parse(&self.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidInput(format!(
                "{} cannot be a base URL",
                self.base_url
            )));
        }

        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.danger_accept_invalid_certs);

        if let Some(proxy_url) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder.build()?;

        Ok(Client {
            http,
            proxy: self.proxy,
            user_agent: self.user_agent,
            base_url,
        })
    }
}
