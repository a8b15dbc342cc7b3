//! Watch-party coordination server.
//!
//! Accepts authenticated WebSocket connections on `/ws` and serves read-only
//! room and presence snapshots under `/api`.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=secret cargo run --bin watchhub-server
//! cargo run --bin watchhub-server -- --host 0.0.0.0 --port 3000 --jwt-secret secret
//! ```

use std::sync::Arc;

use clap::Parser;
use watchhub_server::{infrastructure::auth::JwtTokenVerifier, ui::AppState, ui::Server};
use watchhub_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "watchhub-server")]
#[command(about = "Real-time watch-party, presence and chat server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// HS256 secret used to verify connection tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. TokenVerifier
    // 2. Repositories, MessagePusher and UseCases (AppState)
    // 3. Server
    let token_verifier = Arc::new(JwtTokenVerifier::new(&args.jwt_secret));
    let state = AppState::in_memory(token_verifier, Arc::new(SystemClock));

    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
