// Cross-resolution of peerID/address gaps against the registry.
use tracing::{info, warn};

use crate::client::Gateway;
use crate::record::{short, Record, NOT_FOUND};

/// Fill missing address/peerID pairs, one pass over the whole table, before
/// the counter snapshot is taken. A miss or a per-record RPC error writes the
/// `not-found` sentinel and the pass moves on; a single miss is authoritative
/// and is not retried.
pub async fn reconcile_identities(records: &mut [Record], gateway: &dyn Gateway) {
    info!("Resolving address/peerID pairs for {} records", records.len());
    for record in records.iter_mut() {
        // peerID -> address
        if record.usable_address().is_none() {
            if let Some(peer_id) = record.usable_peer_id().map(str::to_string) {
                match gateway.eoa_of_peer(&peer_id).await {
                    Ok(Some(addr)) => {
                        info!("PeerID {}... resolved address {}", short(&peer_id), addr);
                        record.address = Some(addr);
                    }
                    Ok(None) => {
                        info!("PeerID {}... has no address on chain", short(&peer_id));
                        record.address = Some(NOT_FOUND.to_string());
                    }
                    Err(e) => {
                        warn!("PeerID {}... address lookup failed: {}", short(&peer_id), e);
                        record.address = Some(NOT_FOUND.to_string());
                    }
                }
            }
        }

        // address -> peerID
        if record.usable_peer_id().is_none() {
            if let Some(addr) = record.usable_address().map(str::to_string) {
                match gateway.peer_of_eoa(&addr).await {
                    Ok(Some(peer_id)) => {
                        info!("Address {}... resolved peerID {}", short(&addr), short(&peer_id));
                        record.peer_id = Some(peer_id);
                    }
                    Ok(None) => {
                        info!("Address {}... has no peerID on chain", short(&addr));
                        record.peer_id = Some(NOT_FOUND.to_string());
                    }
                    Err(e) => {
                        warn!("Address {}... peerID lookup failed: {}", short(&addr), e);
                        record.peer_id = Some(NOT_FOUND.to_string());
                    }
                }
            }
        }
    }
    info!("Resolution pass complete");
}
