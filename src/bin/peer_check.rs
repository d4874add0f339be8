// One-shot status lookup for a single peerID. Prints a formatted result
// block and emits the restart marker when the peer has gone quiet, so an
// external supervisor can bounce the related infrastructure.
use chrono::Utc;
use clap::Parser;
use tokio::time::{sleep, Duration};

use peer_sentinel::client::{Gateway, HttpProber, Prober, RpcGateway};
use peer_sentinel::config::SentinelConfig;
use peer_sentinel::error::SentinelError;
use peer_sentinel::record::{self, Activity};

const RESTART_MARKER: &str = "__NEED_RESTART__";
const ATTEMPTS: u32 = 3;

#[derive(Parser)]
#[command(name = "peer_check")]
#[command(about = "One-shot status lookup for a single peerID", long_about = None)]
struct Cli {
    /// peerID to look up
    peer_id: String,
    /// Path to the TOML config file
    #[arg(long, default_value = "sentinel.toml")]
    config: String,
}

struct PeerStatus {
    rewards: u64,
    wins: u64,
    votes: u64,
    address: Option<String>,
}

async fn query_peer(gateway: &RpcGateway, peer_id: &str) -> Result<PeerStatus, SentinelError> {
    Ok(PeerStatus {
        rewards: gateway.reward_total(peer_id).await?,
        wins: gateway.win_total(peer_id).await?,
        votes: gateway.vote_total(peer_id).await?,
        address: gateway.eoa_of_peer(peer_id).await?,
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let peer_id = cli.peer_id.trim().to_string();
    if peer_id.is_empty() {
        eprintln!("peerID must not be empty");
        std::process::exit(1);
    }

    let config = SentinelConfig::load_or_default(&cli.config);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let gateway = RpcGateway::new(
        config.rpc.url.clone(),
        config.rpc.contract_address.clone(),
    );

    let mut status = None;
    for attempt in 1..=ATTEMPTS {
        match query_peer(&gateway, &peer_id).await {
            Ok(s) => {
                status = Some(s);
                break;
            }
            Err(e) => {
                eprintln!("Attempt {}/{} failed: {}", attempt, ATTEMPTS, e);
                if attempt < ATTEMPTS {
                    sleep(Duration::from_secs(2)).await;
                }
            }
        }
    }
    let status = match status {
        Some(s) => s,
        None => {
            eprintln!("Contract query failed after {} attempts, giving up.", ATTEMPTS);
            std::process::exit(1);
        }
    };

    println!("{}", "=".repeat(40));
    println!(
        "Query time: {}",
        record::display_timestamp(Utc::now())
    );
    println!("PeerID: {}", peer_id);
    println!(
        "Address: {}",
        status.address.as_deref().unwrap_or("not-found")
    );
    println!("TotalRewards: {}", status.rewards);
    println!("TotalWins: {}", status.wins);
    println!("TotalVote: {}", status.votes);

    let address = match status.address {
        Some(a) => a,
        None => return, // nothing to probe
    };

    let prober = HttpProber::new(&config.explorer, ATTEMPTS);
    match prober.probe_last_activity(&address).await {
        Ok(Activity::Seen(ts)) => {
            let now = Utc::now();
            let hours = (now - ts).num_seconds() as f64 / 3600.0;
            println!("Last activity: {}", record::display_timestamp(ts));
            println!("Hours since: {:.2}", hours);
            if record::is_stale(ts, now, config.poll.stale_after_hours) {
                println!("{}", RESTART_MARKER);
            }
        }
        Ok(other) => {
            println!("Last activity: {}", other.label());
        }
        Err(e) => {
            println!("Activity lookup failed, skipping restart check: {}", e);
        }
    }
}
