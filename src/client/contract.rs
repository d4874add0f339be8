// JSON-RPC gateway to the registry contract.
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::address;
use crate::client::{abi, Gateway};
use crate::error::SentinelError;

pub struct RpcGateway {
    url: String,
    contract: String,
    client: reqwest::Client,
    request_id: AtomicU64,
}

impl RpcGateway {
    pub fn new(url: String, contract: String) -> Self {
        Self {
            url,
            contract,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            request_id: AtomicU64::new(1),
        }
    }

    async fn rpc(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, SentinelError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SentinelError::Rpc(format!("RPC request failed: {}", e)))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SentinelError::Rpc(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = json.get("error") {
            return Err(SentinelError::Rpc(
                error["message"].as_str().unwrap_or("Unknown error").to_string(),
            ));
        }

        Ok(json["result"].clone())
    }

    async fn eth_call(&self, data: String) -> Result<Vec<u8>, SentinelError> {
        let result = self
            .rpc("eth_call", json!([{ "to": self.contract, "data": data }, "latest"]))
            .await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| SentinelError::Rpc("eth_call returned no data".to_string()))?;
        hex::decode(hex_str.trim_start_matches("0x"))
            .map_err(|e| SentinelError::Decode(format!("bad eth_call hex: {}", e)))
    }

    /// Startup connectivity check. Fatal at the call site if this fails.
    pub async fn ping(&self) -> Result<(), SentinelError> {
        self.rpc("eth_blockNumber", json!([])).await.map(|_| ())
    }
}

#[async_trait]
impl Gateway for RpcGateway {
    async fn eoa_of_peer(&self, peer_id: &str) -> Result<Option<String>, SentinelError> {
        let data = abi::call_data("getEoa(string[])", &abi::encode_string_array(&[peer_id]));
        let addrs = abi::decode_address_array(&self.eth_call(data).await?)?;
        Ok(addrs
            .into_iter()
            .next()
            .filter(|a| !address::is_zero_address(a)))
    }

    async fn peer_of_eoa(&self, addr: &str) -> Result<Option<String>, SentinelError> {
        let data = abi::call_data("getPeerId(address[])", &abi::encode_address_array(&[addr])?);
        let matrix = abi::decode_string_matrix(&self.eth_call(data).await?)?;
        Ok(matrix
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .filter(|p| !p.is_empty()))
    }

    async fn reward_total(&self, peer_id: &str) -> Result<u64, SentinelError> {
        let data = abi::call_data(
            "getTotalRewards(string[])",
            &abi::encode_string_array(&[peer_id]),
        );
        let totals = abi::decode_uint_array(&self.eth_call(data).await?)?;
        Ok(totals.into_iter().next().unwrap_or(0))
    }

    async fn win_total(&self, peer_id: &str) -> Result<u64, SentinelError> {
        let data = abi::call_data("getTotalWins(string)", &abi::encode_string(peer_id));
        abi::decode_uint(&self.eth_call(data).await?)
    }

    async fn vote_total(&self, peer_id: &str) -> Result<u64, SentinelError> {
        let data = abi::call_data("getVoterVoteCount(string)", &abi::encode_string(peer_id));
        abi::decode_uint(&self.eth_call(data).await?)
    }
}
