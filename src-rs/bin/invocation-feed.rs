use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use invocation_dashboard::api::{FeedServer, FeedState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(3000);

    let state = match env::var("INVOCATION_FEED_FIXTURE") {
        Ok(path) if !path.trim().is_empty() => match FeedState::from_fixture(&PathBuf::from(path)) {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(error = %err, "could not load fixture");
                std::process::exit(1);
            }
        },
        _ => FeedState::new(),
    };
    tracing::info!(commands = ?state.command_ids(), "serving invocation fixture");

    let server = FeedServer::new(SocketAddr::from(([0, 0, 0, 0], port)), state);
    if let Err(err) = server.start().await {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }
}
