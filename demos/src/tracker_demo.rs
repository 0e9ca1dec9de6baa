use coffee_tracker::prelude::*;
use dotenv::dotenv;
use log::info;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    pretty_env_logger::init();

    let config = TrackerConfig::from_env()?;
    let mut tracker = Tracker::new(&config)?;

    println!("Starting tracker demo against ledger {}", config.ledger_canister_id);

    if !tracker.initialize().await? {
        if let Err(e) = tracker.login().await {
            println!("{}", e);
        }
    }
    if let Some(message) = tracker.message() {
        println!("{}", message.text);
    }

    if let Some(principal) = tracker.principal() {
        println!("Logged in as: {}", principal);

        if tracker.lots().is_empty() {
            println!("No coffee lots found. Add one to get started!");
        }
        for lot in tracker.lots().lots() {
            println!("Lot #{} ({}, harvested {} in {}): {}", lot.id, lot.farmer, lot.harvest_date, lot.location, lot.status);
            for update in &lot.updates {
                println!(
                    "    {} | {} | by {} at {}",
                    update.status,
                    update.details,
                    update.updated_by,
                    update.recorded_at().to_rfc2822()
                );
            }
        }
    }

    info!("Asking the assistant a question");
    if let Some(reply) = tracker.send_chat("How long should green coffee rest after drying?").await {
        println!("Assistant: {}", reply.text);
    }

    Ok(())
}
