use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: compact logs on stderr, plus an optional
/// append-only diagnostic file.
///
/// `binary` is the log target of the calling binary.
pub fn init(binary: &'static str, debug_log: Option<&Path>) -> anyhow::Result<()> {
    let filter = filter::Targets::new().with_targets(vec![
        ("eos_ops", LevelFilter::DEBUG),
        (binary, LevelFilter::DEBUG),
    ]);

    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false);

    let file = match debug_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open debug log {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr)
        .with(file)
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")
}
