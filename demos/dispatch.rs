//! Example: Calling catalog operations by path.
//!
//! Run with: cargo run --example dispatch
//!
//! Reads DECKTUTOR_USERNAME, DECKTUTOR_PASSWORD and optionally DECKTUTOR_MODE.

use std::sync::Arc;

use decktutor_sdk::DeckTutor;
use decktutor_sdk::rest::{ApiFactory, CallArgs};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let _ = dotenv::dotenv();

    let factory = Arc::new(ApiFactory::new());
    factory.configure_from_env()?;
    let client = DeckTutor::new(factory);

    // Every operation the catalog knows about.
    for (path, descriptor) in client.catalog().operations() {
        println!(
            "{path:32} {:6} {}",
            descriptor.method.as_str(),
            descriptor.url_template
        );
    }

    // Chained navigation; signs with a token obtained on first use.
    let cards = client
        .get("search")?
        .get("card_name")?
        .call(CallArgs::new().param("name", "Lightning Bolt").page(0).page_size(10))
        .await?;
    println!("Card names: {cards}");

    // Same thing by dotted path. A 400 comes back as {"error": ...}.
    let versions = client
        .call(
            "search.card_version",
            CallArgs::new().param("name", "Lightning Bolt"),
        )
        .await?;
    match versions.get("error") {
        Some(error) => println!("Rejected: {error}"),
        None => println!("Versions: {versions}"),
    }

    Ok(())
}
