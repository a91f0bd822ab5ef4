//! Meshtrace Visualization Server
//!
//! Reconstruct a simulation log (if given) and serve the visualization
//! API. Live events arrive over the `/ws/ingest` WebSocket.

use std::env;
use std::fs;

use meshtrace_engine::SnapshotHistory;
use meshtrace_vis::{Result, VisServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Parse command line args
    let args: Vec<String> = env::args().collect();

    let log_path = args.get(1).filter(|a| a.as_str() != "-");

    let port: u16 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(3000);

    println!("Meshtrace Visualizer");
    println!("====================");
    println!();

    let history = match log_path {
        Some(path) => {
            println!("Reconstructing topology from {}...", path);
            let text = fs::read_to_string(path)?;
            let history = SnapshotHistory::build(&text);
            println!("  Ticks: {}", history.len());
            println!("  Diagnostics: {}", history.diagnostics().len());
            history
        }
        None => {
            println!("No log supplied; replay history starts empty.");
            println!("POST raw log text to /api/log to build one.");
            SnapshotHistory::build("")
        }
    };

    println!();
    println!("Starting visualization server on http://localhost:{}", port);
    println!("Live transports connect to ws://localhost:{}/ws/ingest", port);
    println!();

    // Start server
    let server = VisServer::new(history);
    server.serve(port).await
}
