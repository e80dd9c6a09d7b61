//! Batched Trade Submission Example
//!
//! Builds a multi-operation batch, dry-runs it with `simulate()`, then
//! submits the same shape for real through a bribed channel.
//!
//! # Running this example
//!
//! ```bash
//! TRADEWIRE_ENDPOINT=ws://127.0.0.1:9900/engine cargo run --example trade_batch
//! ```

use std::env;

use tradewire::{Config, SwapParams, TradewireClient, TransportMode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let endpoint = env::var("TRADEWIRE_ENDPOINT")
        .unwrap_or_else(|_| "ws://127.0.0.1:9900/engine".to_string());
    let payer = env::var("TRADEWIRE_FEE_PAYER")
        .unwrap_or_else(|_| "FeePayer1111111111111111111111111111111111".to_string());

    let config = Config::builder().endpoint(&endpoint).build()?;
    let client = TradewireClient::connect(config).await?;

    let swap = SwapParams {
        pool: "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2".to_string(),
        input_mint: "So11111111111111111111111111111111111111112".to_string(),
        output_mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
        amount_in: 1_000_000_000,
        min_amount_out: 150_000_000,
        owner: payer.clone(),
    };

    // Dry-run first: simulation mode never broadcasts and needs no bribe.
    let simulated = client
        .batch()
        .add_buy(swap.clone())
        .add_transfer(&payer, "Recipient111111111111111111111111111111111", 500_000)
        .fee_payer(&payer)
        .priority_fee(10_000)
        .simulate()
        .await?;

    println!("simulation success: {}", simulated.is_success());

    if !simulated.is_success() {
        println!("not submitting a batch that fails simulation");
        return Ok(());
    }

    // Same batch for real, through Jito with a bribe attached.
    let response = client
        .batch()
        .add_buy(swap)
        .add_transfer(&payer, "Recipient111111111111111111111111111111111", 500_000)
        .fee_payer(&payer)
        .priority_fee(10_000)
        .bribe(100_000)
        .transport_mode(TransportMode::Jito)
        .send()
        .await;

    match response {
        Ok(response) => println!("submitted, signature: {:?}", response.signature()),
        Err(e) => {
            println!("submission failed: {}", e.user_message());
            if e.is_retryable() {
                println!("(transient - safe to retry)");
            }
        }
    }

    Ok(())
}
