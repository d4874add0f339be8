// Counter re-query and change columns against the pre-probe snapshot.
use tracing::{error, info};

use crate::client::Gateway;
use crate::error::SentinelError;
use crate::record::{delta, short, Record, Snapshot};

struct CounterReading {
    rewards: u64,
    wins: u64,
    votes: u64,
    address: Option<String>,
}

async fn query_counters(
    gateway: &dyn Gateway,
    peer_id: &str,
) -> Result<CounterReading, SentinelError> {
    Ok(CounterReading {
        rewards: gateway.reward_total(peer_id).await?,
        wins: gateway.win_total(peer_id).await?,
        votes: gateway.vote_total(peer_id).await?,
        address: gateway.eoa_of_peer(peer_id).await?,
    })
}

/// Re-query current counters for every record with a usable peerID and write
/// totals plus change columns. A failed record is logged and left as it was;
/// the pass never aborts.
pub async fn apply_counter_deltas(
    records: &mut [Record],
    snapshot: &Snapshot,
    gateway: &dyn Gateway,
) {
    for (index, record) in records.iter_mut().enumerate() {
        let peer_id = match record.usable_peer_id() {
            Some(p) => p.to_string(),
            None => continue,
        };

        let reading = match query_counters(gateway, &peer_id).await {
            Ok(r) => r,
            Err(e) => {
                error!("Counter query failed for peerID {}...: {}", short(&peer_id), e);
                continue;
            }
        };

        let prev = snapshot.counters(index);
        record.total_rewards = Some(reading.rewards);
        record.total_wins = Some(reading.wins);
        record.total_votes = Some(reading.votes);
        // The registry's EOA is authoritative for the address column.
        if let Some(addr) = reading.address {
            record.address = Some(addr);
        }

        record.rewards_change = delta(prev.rewards, reading.rewards).to_string();
        record.wins_change = delta(prev.wins, reading.wins).to_string();
        record.votes_change = delta(prev.votes, reading.votes).to_string();

        info!(
            "{}: rewards {} ({}), wins {} ({}), votes {} ({})",
            record.name,
            reading.rewards,
            record.rewards_change,
            reading.wins,
            record.wins_change,
            reading.votes,
            record.votes_change
        );
    }
}
