use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use eos_ops::{
    acl::{
        AclEditor,
        menu::{Console, Menu, switch_allowed},
    },
    config::read_config_file,
    eapi::EapiClient,
    logging,
};
use tracing::{info, trace};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,

    /// Switch to edit; prompted for when omitted
    #[arg(long)]
    switch: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = read_config_file(&args.file)?;
    logging::init("acl_editor", config.logging.debug_log.as_deref())?;
    trace!("started with args: {args:?}");

    let allowed = match &config.acl {
        Some(acl) if !acl.switches.is_empty() => acl.switches.clone(),
        _ => vec![config.switch.address.clone()],
    };

    let address = match args.switch {
        Some(address) => address,
        None => {
            print!("Enter IP of switch: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    if !switch_allowed(&allowed, &address) {
        bail!("Invalid IP entered: {address}");
    }
    config.switch.address = address.trim().to_string();
    config.warn_risky_settings();

    let client = EapiClient::new(&config.switch).context("failed to build eAPI client")?;
    info!("editing access lists on {}", client.url());
    let editor = AclEditor::new(Arc::new(client));

    let console = Console::new(std::io::stdin().lock(), std::io::stdout());
    Menu::new(&editor, console).run().await?;

    Ok(())
}
