//! Basic Connection Example
//!
//! Demonstrates the simplest way to connect to a Tradewire engine,
//! probe liveness, and disconnect cleanly.
//!
//! # Running this example
//!
//! ```bash
//! TRADEWIRE_ENDPOINT=ws://127.0.0.1:9900/engine cargo run --example basic
//! ```

use std::env;

use tradewire::{Config, TradewireClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (optional but helpful for debugging)
    tracing_subscriber::fmt::init();

    println!("=== Tradewire Basic Connection Example ===\n");

    let endpoint = env::var("TRADEWIRE_ENDPOINT")
        .unwrap_or_else(|_| "ws://127.0.0.1:9900/engine".to_string());

    // =========================================================================
    // 1. Build Configuration
    // =========================================================================
    println!("1. Building Configuration");
    println!("   -----------------------");

    let config = Config::builder()
        .endpoint(&endpoint)
        .auto_reconnect(true)
        .max_reconnect_attempts(5)
        .build()?;

    println!("   Endpoint: {}", config.endpoint);
    println!("   Request timeout: {:?}", config.request_timeout);
    println!("   Auto-reconnect: {}\n", config.auto_reconnect);

    // =========================================================================
    // 2. Connect to the engine
    // =========================================================================
    println!("2. Connecting");
    println!("   ----------");

    let client = match TradewireClient::connect(config).await {
        Ok(client) => {
            println!("   Connected\n");
            client
        }
        Err(e) => {
            println!("   Connection failed: {}", e.user_message());
            return Ok(());
        }
    };

    // =========================================================================
    // 3. Liveness probe
    // =========================================================================
    println!("3. Liveness");
    println!("   --------");

    match client.ping().await {
        Ok(alive) => println!("   Engine alive: {alive}\n"),
        Err(e) => println!("   Ping failed: {} (retryable: {})\n", e, e.is_retryable()),
    }

    // =========================================================================
    // 4. Statistics snapshot
    // =========================================================================
    println!("4. Statistics");
    println!("   ----------");

    let stats = client.get_stats();
    println!("   Requests sent: {}", stats.requests_sent);
    println!("   Successful: {}", stats.requests_successful);
    println!("   Average latency: {:.2} ms", stats.average_latency_ms);
    println!("   Connected: {}\n", stats.connected);

    client.disconnect().await?;
    println!("Disconnected cleanly");

    Ok(())
}
