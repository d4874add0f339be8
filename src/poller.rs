// Fan-out activity polling with a shared inter-request rate limit.
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::{error, info, warn};

use crate::client::Prober;
use crate::config::PollConfig;
use crate::record::{self, Activity, Record, Status, UNREACHABLE};

/// Minimum spacing between outgoing probe requests, shared across workers.
/// The elapsed check, the make-up sleep and the timestamp update form one
/// critical section.
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            // Backdate so the first request goes out immediately.
            last: Mutex::new(
                Instant::now()
                    .checked_sub(min_interval)
                    .unwrap_or_else(Instant::now),
            ),
        }
    }

    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

#[derive(Debug, Default, Clone)]
pub struct PollStats {
    pub valid_addresses: usize,
    pub need_check: Vec<String>,
}

impl PollStats {
    fn merge(&mut self, other: PollStats) {
        self.valid_addresses += other.valid_addresses;
        self.need_check.extend(other.need_check);
    }
}

/// Probe every record's last activity. The table is split into contiguous
/// chunks, one worker task per chunk, each owning its rows outright; chunks
/// and per-worker stats are stitched back together in order after the join.
pub async fn poll_activity(
    records: Vec<Record>,
    prober: Arc<dyn Prober>,
    cfg: &PollConfig,
) -> (Vec<Record>, PollStats) {
    if records.is_empty() {
        return (records, PollStats::default());
    }

    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(cfg.min_interval_ms)));
    let fanout = cfg.fanout.max(1);
    let chunk_size = records.len() / fanout + usize::from(records.len() % fanout != 0);

    let mut rest = records;
    let mut handles = Vec::new();
    while !rest.is_empty() {
        let take = chunk_size.min(rest.len());
        let chunk: Vec<Record> = rest.drain(..take).collect();
        // Kept so a panicking worker cannot lose its rows: the table must
        // come back whole and in order, or every later Snapshot index shifts.
        let fallback = chunk.clone();
        let prober = Arc::clone(&prober);
        let limiter = Arc::clone(&limiter);
        let threshold = cfg.stale_after_hours;
        let handle = tokio::spawn(async move {
            poll_chunk(chunk, prober, limiter, threshold).await
        });
        handles.push((handle, fallback));
    }

    let mut out = Vec::new();
    let mut stats = PollStats::default();
    for (handle, fallback) in handles {
        match handle.await {
            Ok((chunk, worker_stats)) => {
                out.extend(chunk);
                stats.merge(worker_stats);
            }
            Err(e) => {
                error!(
                    "poll worker panicked, keeping its {} rows unprocessed: {}",
                    fallback.len(),
                    e
                );
                out.extend(fallback);
            }
        }
    }
    (out, stats)
}

async fn poll_chunk(
    mut chunk: Vec<Record>,
    prober: Arc<dyn Prober>,
    limiter: Arc<RateLimiter>,
    threshold_hours: f64,
) -> (Vec<Record>, PollStats) {
    let mut stats = PollStats::default();
    for record in chunk.iter_mut() {
        // Flag rather than drop: the row keeps its place in the table and
        // never costs a rate-limit slot since no request goes out.
        let addr = match record.usable_address() {
            Some(a) => a.to_string(),
            None => {
                record.last_activity = Activity::InvalidAddress.label();
                record.status = Status::Normal;
                continue;
            }
        };

        info!("Probing {} at {}", record.name, addr);
        limiter.acquire().await;
        match prober.probe_last_activity(&addr).await {
            Ok(Activity::Seen(ts)) => {
                record.last_activity = Activity::Seen(ts).label();
                stats.valid_addresses += 1;
                if record::is_stale(ts, Utc::now(), threshold_hours) {
                    record.status = Status::NeedsCheck;
                    stats.need_check.push(record.name.clone());
                } else {
                    record.status = Status::Normal;
                }
            }
            Ok(other) => {
                record.last_activity = other.label();
                record.status = Status::Normal;
            }
            Err(e) => {
                warn!("{}: probe failed: {}", record.name, e);
                record.last_activity = UNREACHABLE.to_string();
                record.status = Status::Normal;
            }
        }
        info!(
            "Result - {}: {} ({:?})",
            record.name, record.last_activity, record.status
        );
    }
    (chunk, stats)
}
