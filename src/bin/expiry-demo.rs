//! Expiring Store Demo
//!
//! Fills a store, waits past the expiry and shows what is left.

use clap::Parser;
use expiring_store::{ExpiringStore, RemovalCause, StoreConfig};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Expiring Store Demo - watch entries expire
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of entries to insert
    #[arg(short, long, default_value_t = 10)]
    count: usize,

    /// Default expiry in milliseconds
    #[arg(short, long, default_value_t = 2000)]
    expiry_ms: u64,

    /// How long to wait before looking again, in milliseconds
    #[arg(short, long, default_value_t = 3000)]
    sleep_ms: u64,

    /// Delay before the first sweep in milliseconds (0 disables sweeping)
    #[arg(long, default_value_t = 500)]
    sweep_delay_ms: u64,

    /// Sweep interval in milliseconds (0 disables sweeping)
    #[arg(long, default_value_t = 500)]
    sweep_interval_ms: u64,
}

fn sorted_entries(store: &ExpiringStore<String, String>) -> Vec<(String, String)> {
    let mut entries = store.entries();
    entries.sort();
    entries
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("expiring_store=info".parse()?)
                .add_directive("expiry_demo=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = StoreConfig::new(Duration::from_millis(args.expiry_ms))
        .with_sweep_initial_delay(Duration::from_millis(args.sweep_delay_ms))
        .with_sweep_interval(Duration::from_millis(args.sweep_interval_ms));

    let store = ExpiringStore::with_listener(
        config,
        |key: &String, value: &String, cause: RemovalCause| {
            info!(key = %key, value = %value, %cause, "Entry evicted");
        },
    )?;

    for i in 0..args.count {
        store.insert(i.to_string(), i.to_string());
    }
    info!(entries = ?sorted_entries(&store), "Inserted {} entries", args.count);

    tokio::time::sleep(Duration::from_millis(args.sleep_ms)).await;

    info!(
        physical = store.physical_len(),
        entries = ?sorted_entries(&store),
        "After {} ms",
        args.sleep_ms
    );
    info!("{}", store.metrics().summary());

    store.shutdown().await;
    Ok(())
}
