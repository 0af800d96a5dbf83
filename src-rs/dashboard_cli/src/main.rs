mod cli;
mod models;
mod render;
mod repl;

use invocation_dashboard::Dashboard;
use repl::REPL;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = cli::parse_config();
    let dashboard = match Dashboard::new(config.dashboard_config()) {
        Ok(dashboard) => dashboard,
        Err(err) => {
            render::error(&err.to_string());
            std::process::exit(2);
        }
    };
    let mut repl = REPL::new(config, dashboard);
    repl.run().await;
}
