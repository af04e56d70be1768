//! Periodic inbox polling.

use crate::{Client, MessageSummary};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Interval between inbox refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Background task that lists messages on a fixed interval.
///
/// Every successful tick replaces the published list wholesale. A failed tick is
/// logged and the previous list stays published. The first tick fires immediately.
///
/// Stopping only prevents future ticks; a request already in flight runs to
/// completion. Dropping the `Poller` stops it as well.
///
/// # Examples
/// ```no_run
/// # use mailtm_client::{Client, Poller, DEFAULT_POLL_INTERVAL};
/// # #[tokio::main]
/// # async fn main() -> Result<(), mailtm_client::Error> {
/// let client = Client::new()?;
/// let account = client.create_account().await?;
/// let poller = Poller::spawn(client, account.token, DEFAULT_POLL_INTERVAL);
/// let mut updates = poller.subscribe();
/// while updates.changed().await.is_ok() {
///     println!("{} message(s)", updates.borrow().len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Poller {
    stop: watch::Sender<bool>,
    messages: watch::Receiver<Vec<MessageSummary>>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start polling the mailbox `token` belongs to. Must be called inside a Tokio runtime.
    ///
    /// # Panics
    /// Panics if `interval` is zero.
    pub fn spawn(client: Client, token: impl Into<String>, interval: Duration) -> Self {
        let token = token.into();
        let (stop, mut stop_rx) = watch::channel(false);
        let (publish, messages) = watch::channel(Vec::new());

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                match client.list_messages(&token).await {
                    Ok(list) => {
                        log::debug!("poll returned {} message(s)", list.len());
                        publish.send_replace(list);
                    }
                    Err(err) => log::warn!("Failed to fetch emails: {err}"),
                }
            }

            log::debug!("poller stopped");
        });

        Self {
            stop,
            messages,
            handle,
        }
    }

    /// Receiver that sees every published list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<MessageSummary>> {
        self.messages.clone()
    }

    /// Most recently published list (empty before the first successful tick).
    pub fn latest(&self) -> Vec<MessageSummary> {
        self.messages.borrow().clone()
    }

    /// Stop future ticks and wait for the task to finish its current tick.
    pub async fn stop(self) {
        self.stop.send_replace(true);
        if let Err(err) = self.handle.await {
            log::warn!("poller task ended abnormally: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;
    use tokio::time::timeout;

    fn client_for(server: &MockServer) -> Client {
        Client::builder().base_url(server.base_url()).build().unwrap()
    }

    #[tokio::test]
    async fn publishes_first_snapshot_immediately() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/messages")
                .header("Authorization", "Bearer tok");
            then.status(200).json_body(json!({
                "hydra:member": [{
                    "id": "m1",
                    "from": { "address": "a@b.test" },
                    "subject": "Hi",
                    "intro": "hello",
                    "seen": false,
                    "createdAt": "2024-05-01T10:00:00Z"
                }]
            }));
        });

        let poller = Poller::spawn(client_for(&server), "tok", Duration::from_secs(60));
        let mut updates = poller.subscribe();

        timeout(Duration::from_secs(5), updates.changed())
            .await
            .expect("no snapshot published")
            .unwrap();

        assert_eq!(poller.latest()[0].id, "m1");
        poller.stop().await;
    }

    #[tokio::test]
    async fn keeps_polling_on_interval() {
        let server = MockServer::start();
        let list = server.mock(|when, then| {
            when.method(GET).path("/messages");
            then.status(200).json_body(json!({ "hydra:member": [] }));
        });

        let poller = Poller::spawn(client_for(&server), "tok", Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;
        poller.stop().await;

        assert!(list.hits() >= 3, "expected repeated polls, got {}", list.hits());
    }

    #[tokio::test]
    async fn stop_prevents_further_ticks() {
        let server = MockServer::start();
        let list = server.mock(|when, then| {
            when.method(GET).path("/messages");
            then.status(200).json_body(json!([]));
        });

        let poller = Poller::spawn(client_for(&server), "tok", Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(60)).await;
        poller.stop().await;

        let hits_after_stop = list.hits();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(list.hits(), hits_after_stop);
    }

    #[tokio::test]
    #[should_panic]
    async fn zero_interval_panics_at_spawn() {
        let client = Client::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let _poller = Poller::spawn(client, "tok", Duration::ZERO);
    }

    #[tokio::test]
    async fn failed_tick_keeps_previous_snapshot() {
        let server = MockServer::start();
        let failing = server.mock(|when, then| {
            when.method(GET).path("/messages");
            then.status(500);
        });

        let poller = Poller::spawn(client_for(&server), "tok", Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(failing.hits() >= 1);
        assert!(poller.latest().is_empty());
        poller.stop().await;
    }
}
