use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use eos_ops::{
    config::{TcamConfig, read_config_file},
    eapi::EapiClient,
    logging, storage,
    tcam::{EapiHardwareTableSource, TcamHandle, TcamMonitor},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = read_config_file(&args.file)?;
    logging::init("tcam_monitor", config.logging.debug_log.as_deref())?;
    trace!("started with args: {args:?}");
    config.warn_risky_settings();

    let tcam = config.tcam.clone().unwrap_or_default();

    let client = EapiClient::new(&config.switch).context("failed to build eAPI client")?;
    info!("polling hardware capacity on {}", client.url());
    let source = EapiHardwareTableSource::new(Arc::new(client), config.switch.timeout());

    let store = storage::open(&tcam.storage)
        .await
        .context("failed to open usage store")?;

    let TcamConfig {
        threshold,
        interval,
        ..
    } = tcam;
    let monitor = TcamMonitor::new(
        Arc::new(source),
        store,
        threshold,
        std::time::Duration::from_secs(interval),
        CancellationToken::new(),
    );
    let handle = TcamHandle::spawn(monitor);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutting down");
    handle.shutdown().await;

    Ok(())
}
