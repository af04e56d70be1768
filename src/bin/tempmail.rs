//! `tempmail`: disposable mailbox from the command line.
//!
//! The mailbox is kept in a session file for one day so repeated invocations
//! reuse it instead of creating a new address each time.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use mailtm_client::{
    Client, Done, Extraction, Inbox, MailAccount, MessageDetail, MessageList, Operation, Poller,
    Reply, Session, SessionStore,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "tempmail", version, about = "Disposable email addresses via mail.tm")]
struct Cli {
    /// API base URL.
    #[arg(long, env = "MAILTM_BASE_URL", default_value = "https://api.mail.tm")]
    base_url: String,

    /// Proxy for all requests.
    #[arg(long, env = "MAILTM_PROXY")]
    proxy: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Session file (defaults to the user config directory).
    #[arg(long, env = "MAILTM_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Print `{success, ...}` JSON replies instead of text.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new mailbox, replacing the stored one.
    New,
    /// Print the current address, creating a mailbox if none is stored.
    Show,
    /// List messages.
    Inbox,
    /// Read a message and mark it seen.
    Read {
        /// Message ID.
        id: String,
        /// Leave the message unseen.
        #[arg(long)]
        keep_unseen: bool,
    },
    /// Set the seen flag on a message.
    Seen {
        /// Message ID.
        id: String,
        /// Mark unseen instead.
        #[arg(long)]
        unseen: bool,
    },
    /// Poll the inbox and print new messages until interrupted.
    Watch {
        /// Seconds between polls.
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
        /// Read each new message as it arrives, print its OTP/link and mark it seen.
        #[arg(long)]
        open: bool,
    },
    /// Delete the mailbox on the provider and forget the session.
    Delete,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut builder = Client::builder()
        .base_url(&cli.base_url)
        .timeout(Duration::from_secs(cli.timeout));
    if let Some(proxy) = &cli.proxy {
        builder = builder.proxy(proxy);
    }
    let client = builder.build().context("failed to build mail.tm client")?;

    let store = match &cli.session_file {
        Some(path) => SessionStore::new(path),
        None => SessionStore::default_location()?,
    };

    let app = App {
        client,
        store,
        json: cli.json,
    };

    match cli.command {
        Command::New => app.new_mailbox().await,
        Command::Show => app.show().await,
        Command::Inbox => app.inbox().await,
        Command::Read { id, keep_unseen } => app.read(&id, !keep_unseen).await,
        Command::Seen { id, unseen } => app.seen(&id, !unseen).await,
        Command::Watch { interval, open } => app.watch(Duration::from_secs(interval), open).await,
        Command::Delete => app.delete().await,
    }
}

struct App {
    client: Client,
    store: SessionStore,
    json: bool,
}

impl App {
    /// Print a reply as JSON, or hand the value to `render`.
    fn emit<T: Serialize>(&self, reply: &Reply<T>, render: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(reply)?);
            return Ok(());
        }
        match reply {
            Reply::Success { value, .. } => render(value),
            Reply::Failure { error, .. } => eprintln!("{error}"),
        }
        Ok(())
    }

    async fn create_session(&self) -> Result<Option<Session>> {
        let reply = Reply::from_result(
            Operation::CreateAccount,
            self.client.create_account().await,
        );
        let session = match &reply {
            Reply::Success { value, .. } => {
                let session = Session::new(value.clone());
                self.store.save(&session)?;
                Some(session)
            }
            Reply::Failure { .. } => None,
        };
        self.emit(&reply, |account: &MailAccount| println!("{}", account.email))?;
        Ok(session)
    }

    /// Stored session if still valid, otherwise a freshly created one.
    async fn session(&self) -> Result<Option<Session>> {
        match self.store.load()? {
            Some(session) => Ok(Some(session)),
            None => self.create_session().await,
        }
    }

    async fn new_mailbox(&self) -> Result<()> {
        self.store.clear()?;
        self.create_session().await?;
        Ok(())
    }

    async fn show(&self) -> Result<()> {
        if let Some(session) = self.store.load()? {
            let reply = Reply::success(session.account());
            return self.emit(&reply, |account| println!("{}", account.email));
        }
        self.create_session().await?;
        Ok(())
    }

    async fn inbox(&self) -> Result<()> {
        let Some(session) = self.session().await? else {
            return Ok(());
        };
        let reply = Reply::from_result(
            Operation::ListMessages,
            self.client.list_messages(&session.token).await,
        )
        .map(MessageList::from);

        self.emit(&reply, |list| {
            if list.messages.is_empty() {
                println!("No messages for {}", session.email);
            }
            for msg in &list.messages {
                let marker = if msg.seen { " " } else { "*" };
                println!(
                    "{marker} {}  {}  {}  {}",
                    msg.id,
                    msg.created_at.format("%Y-%m-%d %H:%M"),
                    msg.from,
                    msg.subject
                );
            }
        })
    }

    async fn read(&self, id: &str, mark_seen: bool) -> Result<()> {
        let Some(session) = self.session().await? else {
            return Ok(());
        };
        let reply = Reply::from_result(
            Operation::ReadMessage,
            self.client.read_message(&session.token, id).await,
        );
        self.emit(&reply, print_detail)?;

        if mark_seen && reply.is_success() {
            let update = Reply::from_result(
                Operation::UpdateSeen,
                self.client.mark_seen(&session.token, id, true).await,
            );
            if let Some(error) = update.error() {
                eprintln!("{error}");
            }
        }
        Ok(())
    }

    async fn seen(&self, id: &str, seen: bool) -> Result<()> {
        let Some(session) = self.session().await? else {
            return Ok(());
        };
        let reply = Reply::from_result(
            Operation::UpdateSeen,
            self.client.mark_seen(&session.token, id, seen).await,
        );
        self.emit(&reply, |update| {
            let state = if update.seen { "seen" } else { "unseen" };
            println!("{} is now {state}", update.id);
        })
    }

    async fn watch(&self, interval: Duration, open: bool) -> Result<()> {
        let Some(session) = self.session().await? else {
            return Ok(());
        };
        eprintln!("Watching {} (Ctrl+C to stop)", session.email);

        let poller = Poller::spawn(self.client.clone(), session.token.clone(), interval);
        let mut updates = poller.subscribe();
        // Printed messages are dismissed, so only arrivals stay visible.
        let mut inbox = Inbox::new();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    inbox.apply(snapshot);

                    let arrived = inbox.messages().to_vec();
                    if !arrived.is_empty() {
                        for msg in &arrived {
                            println!("{}  {}  {}", msg.id, msg.from, msg.subject);
                            if open {
                                self.open_arrival(&session.token, &msg.id, &mut inbox).await;
                            }
                        }
                        eprintln!("{} new, {} unseen", arrived.len(), inbox.unseen_count());
                        for msg in &arrived {
                            inbox.dismiss(&msg.id);
                        }
                    }
                }
            }
        }

        poller.stop().await;
        Ok(())
    }

    async fn open_arrival(&self, token: &str, id: &str, inbox: &mut Inbox) {
        let reply = Reply::from_result(
            Operation::ReadMessage,
            self.client.read_message(token, id).await,
        );
        match &reply {
            Reply::Success { value, .. } => {
                print_extraction("OTP", &value.otp);
                print_extraction("Link", &value.verification_link);
            }
            Reply::Failure { error, .. } => {
                eprintln!("{error}");
                return;
            }
        }

        let update = Reply::from_result(
            Operation::UpdateSeen,
            self.client.mark_seen(token, id, true).await,
        );
        match update {
            Reply::Success { value, .. } => inbox.set_seen(&value.id, value.seen),
            Reply::Failure { error, .. } => eprintln!("{error}"),
        }
    }

    async fn delete(&self) -> Result<()> {
        let Some(session) = self.store.load()? else {
            eprintln!("No stored mailbox");
            return Ok(());
        };
        let reply = Reply::from_result(
            Operation::DeleteAccount,
            self.client
                .delete_account(&session.token)
                .await
                .map(|()| Done {}),
        );
        if reply.is_success() {
            self.store.clear()?;
        }
        self.emit(&reply, |_| println!("Deleted {}", session.email))
    }
}

fn print_detail(detail: &MessageDetail) {
    println!("From:    {}", detail.from);
    println!("Subject: {}", detail.subject);
    println!("Date:    {}", detail.created_at.to_rfc2822());
    print_extraction("OTP", &detail.otp);
    print_extraction("Link", &detail.verification_link);
    println!();
    println!("{}", detail.text);
}

fn print_extraction(label: &str, extraction: &Extraction) {
    match extraction {
        Extraction::Found(value) => println!("{label:<8} {value}"),
        Extraction::Missing => {}
        Extraction::Failed(error) => println!("{label:<8} ({error})"),
    }
}
