use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use counter_core::{ChannelHostBridge, CounterWidget, SystemClock};
use persistence::{KeyValueStore, MemoryStore};
use shared::domain::WidgetVariant;
use storage::Storage;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod session;

/// Runs one counter widget over stdio: host frames in on stdin as JSON
/// lines, host messages out on stdout.
#[derive(Parser, Debug)]
pub struct Args {
    #[arg(long, default_value = "widget_host.toml")]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long, value_parser = parse_variant)]
    variant: Option<WidgetVariant>,
    #[arg(long)]
    storage_key: Option<String>,
    /// Keep state in memory only.
    #[arg(long)]
    memory: bool,
}

fn parse_variant(raw: &str) -> Result<WidgetVariant, String> {
    WidgetVariant::parse(raw).ok_or_else(|| format!("unknown widget variant '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(&args.config)?;
    settings.apply_args(&args);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store: Arc<dyn KeyValueStore> = if args.memory {
        info!("using in-memory widget store");
        Arc::new(MemoryStore::new())
    } else {
        let database_url = config::normalize_database_url(&settings.database_url);
        let storage = Storage::new(&database_url)
            .await
            .with_context(|| format!("failed to open widget store at '{database_url}'"))?;
        storage.health_check().await?;
        let entries = storage.list_entries().await?;
        info!(%database_url, entries = entries.len(), "opened widget store");
        Arc::new(storage)
    };

    let (bridge, host_rx) = ChannelHostBridge::new();
    let writer = tokio::spawn(session::write_frames(host_rx, tokio::io::stdout()));

    let widget = CounterWidget::initialize(
        settings.widget_options(),
        store,
        Arc::new(bridge),
        Arc::new(SystemClock),
    )
    .await;
    let (mut widget, mut expired_rx) = widget.with_undo_timer();

    let stdin = BufReader::new(tokio::io::stdin());
    session::run(&mut widget, &mut expired_rx, stdin).await?;

    // Dropping the widget closes the bridge, which lets the writer drain and exit.
    drop(widget);
    writer.await.context("host writer task panicked")??;
    Ok(())
}
