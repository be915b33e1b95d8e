use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use eos_ops::{
    config::{Config, read_config_file},
    eapi::EapiClient,
    logging,
    monitors::{EapiMetricSource, SamplerHandle, SamplingLoop},
    sinks::{AlertSink, MultiSink, file::FileSink, udp::UdpSink},
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
    logging::init("ipsla_monitor", config.logging.debug_log.as_deref())?;
    trace!("started with args: {args:?}");
    config.warn_risky_settings();

    let sampler = build_sampler(&config, CancellationToken::new()).await?;
    let handle = SamplerHandle::spawn(sampler);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutting down");
    handle.shutdown().await;

    Ok(())
}

async fn build_sampler(config: &Config, cancel: CancellationToken) -> anyhow::Result<SamplingLoop> {
    let timeout = config.switch.timeout();

    let client = EapiClient::new(&config.switch).context("failed to build eAPI client")?;
    info!("connecting to {}", client.url());

    let source = EapiMetricSource::connect(Arc::new(client), timeout)
        .await?;

    let mut sinks: Vec<Arc<dyn AlertSink>> =
        vec![Arc::new(FileSink::open(&config.logging.alert_log).await?)];
    if let Some(forward) = &config.forward {
        let udp = UdpSink::connect(forward, timeout).await?;
        info!("forwarding alerts to {}", udp.target());
        sinks.push(Arc::new(udp));
    }

    Ok(SamplingLoop::new(
        Arc::new(source),
        Arc::new(MultiSink::new(sinks)),
        config.thresholds,
        config.interval(),
        cancel,
    ))
}
