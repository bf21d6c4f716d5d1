//! Manual probe for a running audio node.
//!
//! Connects with the credentials from the environment, waits for the ready
//! frame and runs one search. Usage:
//!
//!   LAVALINK_HOST=localhost LAVALINK_PORT=2333 LAVALINK_PASSWORD=... \
//!     cargo run --bin node_connect -- "never gonna give you up"

use radiola::node::{run_event_listener, NodeClient, SearchSource, TrackSearchGateway};
use radiola::session::SessionRegistry;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let host = std::env::var("LAVALINK_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("LAVALINK_PORT").unwrap_or_else(|_| "2333".to_string());
    let password = std::env::var("LAVALINK_PASSWORD")
        .map_err(|_| "LAVALINK_PASSWORD must be set for this probe")?;
    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "lofi hip hop".to_string());

    let client = Arc::new(NodeClient::new(&format!("{}:{}", host, port), &password));
    println!("Connecting to {}...", client.ws_url());

    let registry = Arc::new(SessionRegistry::new(
        client.clone(),
        client.clone(),
        Some(SearchSource::SoundCloud),
    ));
    let listener = tokio::spawn(run_event_listener(client.clone(), registry));

    // Give the node a moment to answer with its ready frame
    for _ in 0..20 {
        if client.session_id().await.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    match client.session_id().await {
        Some(session_id) => println!("Node ready, session {}", session_id),
        None => println!("No ready frame after 5s; REST search may still work."),
    }

    println!("Searching for: {}", query);
    let tracks = client.search(&query, Some(SearchSource::SoundCloud)).await?;
    if tracks.is_empty() {
        println!("No results.");
    } else {
        for (i, track) in tracks.iter().take(10).enumerate() {
            println!(
                "  {}. {} [{}ms] {}",
                i + 1,
                track.title(),
                track.info.length,
                track.info.uri.as_deref().unwrap_or("-")
            );
        }
    }

    listener.abort();
    Ok(())
}
