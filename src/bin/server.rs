//! Matchmaking and signaling relay server for anonymous one-on-one chat.
//!
//! Pairs clients by interest overlap and relays signaling and chat
//! payloads between the two members of each pairing.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 3000
//! ```

use clap::Parser;
use mingle_server::{common::logger::setup_logger, server::run_server};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Matchmaking and signaling relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run_server(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
