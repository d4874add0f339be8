use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use peer_sentinel::client::{HttpProber, RpcGateway};
use peer_sentinel::config::SentinelConfig;
use peer_sentinel::record::Snapshot;
use peer_sentinel::report::{self, RunSummary};
use peer_sentinel::{delta, poller, reconcile, store};

#[derive(Parser)]
#[command(name = "peer_sentinel")]
#[command(about = "Swarm participant status monitor", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "sentinel.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = SentinelConfig::load_or_default(&cli.config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let started = Instant::now();

    // The store load comes first: an unreadable table terminates the run
    // before any network traffic.
    let mut records = match store::load_records(&config.store.path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Cannot load record store: {}", e);
            std::process::exit(1);
        }
    };
    println!("Loaded {} records from {}", records.len(), config.store.path);

    let gateway = RpcGateway::new(
        config.rpc.url.clone(),
        config.rpc.contract_address.clone(),
    );
    if let Err(e) = gateway.ping().await {
        eprintln!("Cannot reach RPC endpoint: {}", e);
        std::process::exit(1);
    }
    println!("Connected to RPC endpoint");

    reconcile::reconcile_identities(&mut records, &gateway).await;

    // Delta baseline, fixed before any probing mutates the table.
    let snapshot = Snapshot::capture(&records);

    let prober = Arc::new(HttpProber::new(
        &config.explorer,
        config.poll.max_probe_attempts,
    ));
    let (mut records, stats) = poller::poll_activity(records, prober, &config.poll).await;

    delta::apply_counter_deltas(&mut records, &snapshot, &gateway).await;

    if let Err(e) = store::save_records(&config.store.path, &records) {
        eprintln!("Failed to persist table: {}", e);
    } else {
        println!("Saved {} records to {}", records.len(), config.store.path);
    }

    report::print_summary(&RunSummary {
        elapsed_secs: started.elapsed().as_secs_f64(),
        total_records: records.len(),
        stats,
    });
}
