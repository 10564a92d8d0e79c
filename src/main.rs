use anyhow::Result;
use clap::Parser;
use log::info;

use doc_insights::cli::ServeArgs;
use doc_insights::{init_logging, server, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = ServeArgs::parse();
    let config = AppConfig::from_serve_args(&args);

    info!("Doc Insights starting...");
    info!("Preserve formatting: {}", config.extract.preserve_formatting);
    info!("Workers: {}", config.extract.workers);

    server::start_server(config).await
}
