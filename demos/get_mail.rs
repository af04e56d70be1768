//! Wait for a verification email and print its code and link.

use mailtm_client::{Client, DEFAULT_POLL_INTERVAL, Poller};
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 mail.tm verification demo");
    println!("{}", "-".repeat(50));

    let client = Client::new()?;
    println!("   Domains: {:?}", client.domains().await?);

    let account = client.create_account().await?;
    println!("\n✅ Created temporary email: {}", account.email);

    println!(
        "\n⏳ Polling for messages (2 min max)... Send an email to: {}",
        account.email
    );
    let poller = Poller::spawn(client.clone(), account.token.clone(), DEFAULT_POLL_INTERVAL);
    let mut updates = poller.subscribe();
    let deadline = Instant::now() + Duration::from_secs(120);

    let first = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, updates.changed()).await {
            Ok(Ok(())) => {
                if let Some(msg) = updates.borrow_and_update().first().cloned() {
                    break Some(msg);
                }
            }
            Ok(Err(_)) | Err(_) => break None,
        }
    };
    poller.stop().await;

    match first {
        Some(msg) => {
            let detail = client.read_message(&account.token, &msg.id).await?;
            println!("\n✅ From: {}, Subject: {}", detail.from, detail.subject);
            println!("   OTP:  {:?}", detail.otp.value());
            println!("   Link: {:?}", detail.verification_link.value());

            let update = client.mark_seen(&account.token, &msg.id, true).await?;
            println!("   Seen: {}", update.seen);
        }
        None => println!("\n⚠️  Timeout: No messages received after 2 minutes"),
    }

    client.delete_account(&account.token).await?;
    println!("\n✅ Mailbox deleted");
    println!("{}", "-".repeat(50));

    Ok(())
}
