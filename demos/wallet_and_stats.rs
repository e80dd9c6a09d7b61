//! Wallet Provisioning & Statistics Example
//!
//! Provisions a custody wallet and shows how the rolling statistics track
//! every request, including failures.
//!
//! # Running this example
//!
//! ```bash
//! TRADEWIRE_ENDPOINT=ws://127.0.0.1:9900/engine cargo run --example wallet_and_stats
//! ```

use std::env;

use tradewire::{Config, TradewireClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let endpoint = env::var("TRADEWIRE_ENDPOINT")
        .unwrap_or_else(|_| "ws://127.0.0.1:9900/engine".to_string());
    let owner = env::var("TRADEWIRE_OWNER")
        .unwrap_or_else(|_| "Owner111111111111111111111111111111111111".to_string());

    let config = Config::builder().endpoint(&endpoint).verbose(true).build()?;
    let client = TradewireClient::connect(config).await?;

    match client.create_wallet(&owner).await {
        Ok(response) => println!("wallet provisioned: {:?}", response.signature()),
        Err(e) => println!("wallet provisioning failed: {}", e.user_message()),
    }

    for _ in 0..3 {
        let _ = client.ping().await;
    }

    let stats = client.get_stats();
    println!("requests sent:       {}", stats.requests_sent);
    println!("successful:          {}", stats.requests_successful);
    println!("failed:              {}", stats.requests_failed);
    println!("avg latency:         {:.2} ms", stats.average_latency_ms);
    println!("reconnect attempts:  {}", stats.reconnect_attempts);

    client.reset_stats();
    println!(
        "after reset, sent = {}",
        client.get_stats().requests_sent
    );

    client.disconnect().await?;
    Ok(())
}
