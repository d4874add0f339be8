// Block-explorer client for last-activity lookups.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::address;
use crate::client::Prober;
use crate::config::ExplorerConfig;
use crate::error::SentinelError;
use crate::record::Activity;

/// Backoff cap between probe attempts.
const MAX_BACKOFF_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct ExplorerResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Option<Vec<TxEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct TxEntry {
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
}

pub struct HttpProber {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    max_attempts: u32,
}

impl HttpProber {
    pub fn new(cfg: &ExplorerConfig, max_attempts: u32) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            max_attempts: max_attempts.max(1),
        }
    }

    fn request_url(&self, addr: &str) -> String {
        format!(
            "{}?module=account&action=txlistinternal&address={}&apikey={}",
            self.api_url, addr, self.api_key
        )
    }

    async fn fetch_once(&self, addr: &str) -> Result<Activity, SentinelError> {
        let response = self.client.get(self.request_url(addr)).send().await?;
        let response = response
            .error_for_status()
            .map_err(|e| SentinelError::Http(e.to_string()))?;
        let payload: ExplorerResponse = response
            .json()
            .await
            .map_err(|e| SentinelError::Http(format!("malformed explorer payload: {}", e)))?;
        interpret(payload)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe_last_activity(&self, addr: &str) -> Result<Activity, SentinelError> {
        // Fail fast on bad input, no network call.
        if !address::is_address(addr) {
            return Ok(Activity::InvalidAddress);
        }

        for attempt in 1..=self.max_attempts {
            match self.fetch_once(addr).await {
                Ok(activity) => return Ok(activity),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "probe attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        attempt, self.max_attempts, addr, e, delay
                    );
                    sleep(delay).await;
                }
                Err(e) if e.is_transient() => break,
                Err(e) => return Err(e),
            }
        }
        Err(SentinelError::RetryExhausted(format!(
            "explorer unreachable for {} after {} attempts",
            addr, self.max_attempts
        )))
    }
}

/// Exponential backoff, base 2 seconds, capped.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt.min(6)).min(MAX_BACKOFF_SECS))
}

/// Map an explorer payload to a definitive activity, or a transient error
/// that the caller may retry.
pub fn interpret(payload: ExplorerResponse) -> Result<Activity, SentinelError> {
    if payload.status == "1" {
        match payload.result {
            Some(txs) if !txs.is_empty() => latest_activity(&txs),
            Some(_) => Ok(Activity::NoRecord),
            None => Err(SentinelError::Http(
                "explorer status 1 without result".to_string(),
            )),
        }
    } else if payload.status == "0" && payload.message.contains("No transactions found") {
        Ok(Activity::NoRecord)
    } else {
        Err(SentinelError::Http(format!(
            "explorer status {}: {}",
            payload.status, payload.message
        )))
    }
}

fn latest_activity(txs: &[TxEntry]) -> Result<Activity, SentinelError> {
    let mut latest: Option<i64> = None;
    for tx in txs {
        let ts: i64 = tx
            .time_stamp
            .parse()
            .map_err(|_| SentinelError::Http(format!("bad timeStamp: {}", tx.time_stamp)))?;
        latest = Some(latest.map_or(ts, |cur| cur.max(ts)));
    }
    let ts =
        latest.ok_or_else(|| SentinelError::Http("empty transaction list".to_string()))?;
    let seen: DateTime<Utc> = DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| SentinelError::Http(format!("timeStamp out of range: {}", ts)))?;
    Ok(Activity::Seen(seen))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(stamps: &[i64]) -> Vec<TxEntry> {
        stamps
            .iter()
            .map(|s| TxEntry {
                time_stamp: s.to_string(),
            })
            .collect()
    }

    #[test]
    fn picks_the_latest_transaction() {
        let payload = ExplorerResponse {
            status: "1".to_string(),
            message: "OK".to_string(),
            result: Some(entries(&[100, 300, 200])),
        };
        match interpret(payload).unwrap() {
            Activity::Seen(ts) => assert_eq!(ts.timestamp(), 300),
            other => panic!("expected Seen, got {:?}", other),
        }
    }

    #[test]
    fn empty_result_means_no_record() {
        let payload = ExplorerResponse {
            status: "1".to_string(),
            message: "OK".to_string(),
            result: Some(vec![]),
        };
        assert_eq!(interpret(payload).unwrap(), Activity::NoRecord);

        let payload = ExplorerResponse {
            status: "0".to_string(),
            message: "No transactions found".to_string(),
            result: None,
        };
        assert_eq!(interpret(payload).unwrap(), Activity::NoRecord);
    }

    #[test]
    fn unexpected_status_is_transient() {
        let payload = ExplorerResponse {
            status: "0".to_string(),
            message: "NOTOK".to_string(),
            result: None,
        };
        let err = interpret(payload).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn bad_timestamp_is_transient() {
        let payload = ExplorerResponse {
            status: "1".to_string(),
            message: "OK".to_string(),
            result: Some(vec![TxEntry {
                time_stamp: "not-a-number".to_string(),
            }]),
        };
        assert!(interpret(payload).unwrap_err().is_transient());
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(4), Duration::from_secs(10));
        assert_eq!(backoff_delay(30), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn invalid_address_never_hits_the_network() {
        // Unroutable endpoint: any request would fail, so a clean
        // InvalidAddress proves the probe returned before the transport.
        let prober = HttpProber::new(
            &ExplorerConfig {
                api_url: "http://127.0.0.1:1/api".to_string(),
                api_key: String::new(),
            },
            1,
        );
        let got = prober.probe_last_activity("0x1234").await.unwrap();
        assert_eq!(got, Activity::InvalidAddress);
        let got = prober.probe_last_activity("hello").await.unwrap();
        assert_eq!(got, Activity::InvalidAddress);
    }
}
