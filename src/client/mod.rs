pub mod abi;
pub mod contract;
pub mod explorer;

pub use contract::RpcGateway;
pub use explorer::HttpProber;

use async_trait::async_trait;

use crate::error::SentinelError;
use crate::record::Activity;

/// Read-only view of the registry contract. No retries here; retry policy
/// belongs to the caller.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `getEoa(string[])` for one peerID. `None` when the registry has no
    /// address for it (the contract answers with the zero address).
    async fn eoa_of_peer(&self, peer_id: &str) -> Result<Option<String>, SentinelError>;
    /// `getPeerId(address[])` for one address.
    async fn peer_of_eoa(&self, address: &str) -> Result<Option<String>, SentinelError>;
    async fn reward_total(&self, peer_id: &str) -> Result<u64, SentinelError>;
    async fn win_total(&self, peer_id: &str) -> Result<u64, SentinelError>;
    async fn vote_total(&self, peer_id: &str) -> Result<u64, SentinelError>;
}

/// Last-activity lookup against the block explorer.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe_last_activity(&self, address: &str) -> Result<Activity, SentinelError>;
}
