//! `nightfall-server`: runs a Nightfall gateway with the classic rules.

use clap::Parser;
use nightfall::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "nightfall-server")]
#[command(version)]
#[command(about = "Multiplayer werewolf game server")]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8888")]
    addr: String,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Failed requests in a row before a connection is closed.
    #[arg(long, default_value_t = 16)]
    error_threshold: u32,
}

#[tokio::main]
async fn main() -> Result<(), NightfallError> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt().with_env_filter(filter).init();

    let server = NightfallServer::<ClassicEngine>::builder()
        .bind(&cli.addr)
        .error_threshold(cli.error_threshold)
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, "nightfall-server starting");

    server.run().await
}
