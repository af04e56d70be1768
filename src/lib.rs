//! mail.tm Rust Client
//!
//! An async Rust client for the mail.tm disposable email API: create a mailbox,
//! poll its inbox, read messages with the one-time passcode and verification link
//! already pulled out, mark them seen, and delete the mailbox when done.
//!
//! The client keeps no session of its own. [`Client::create_account`] returns a
//! [`MailAccount`] and every later call takes its token explicitly.
//!
//! # Example
//! ```no_run
//! use mailtm_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mailtm_client::Error> {
//!     let client = Client::new()?;
//!     let account = client.create_account().await?;
//!     println!("Created: {}", account.email);
//!
//!     for msg in client.list_messages(&account.token).await? {
//!         let detail = client.read_message(&account.token, &msg.id).await?;
//!         if let Some(code) = detail.otp.value() {
//!             println!("{}: code {}", msg.subject, code);
//!         }
//!         client.mark_seen(&account.token, &msg.id, true).await?;
//!     }
//!
//!     client.delete_account(&account.token).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod credentials;
mod error;
mod extract;
mod inbox;
mod models;
mod poller;
mod reply;
mod session;

pub use client::{Client, ClientBuilder};
pub use credentials::Credentials;
pub use error::{Error, ErrorKind, Operation};
pub use extract::{Extraction, extract_otp, extract_verification_link};
pub use inbox::Inbox;
pub use models::{
    Domain, MailAccount, MessageDetail, MessageList, MessageSummary, SeenUpdate,
};
pub use poller::{DEFAULT_POLL_INTERVAL, Poller};
pub use reply::{Done, Reply};
pub use session::{SESSION_TTL, Session, SessionStore};

/// Result type alias for mail.tm operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
