use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::address;

/// Resolution sentinel written into the table when the registry has no
/// counterpart for a peerID/address. A single miss is authoritative.
pub const NOT_FOUND: &str = "not-found";

/// Label written when a probe exhausts its retry budget.
pub const UNREACHABLE: &str = "unreachable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    #[serde(rename = "")]
    Normal,
    #[serde(rename = "needs-check")]
    NeedsCheck,
}

/// One row of the participant table. Column names match the persisted shape.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Record {
    pub name: String,
    #[serde(rename = "peerID", default)]
    pub peer_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "TotalRewards", default)]
    pub total_rewards: Option<u64>,
    #[serde(rename = "TotalWins", default)]
    pub total_wins: Option<u64>,
    #[serde(rename = "TotalVote", default)]
    pub total_votes: Option<u64>,
    #[serde(rename = "LastTXtime", default)]
    pub last_activity: String,
    #[serde(rename = "Status", default)]
    pub status: Status,
    #[serde(rename = "RewardsChange", default)]
    pub rewards_change: String,
    #[serde(rename = "WinsChange", default)]
    pub wins_change: String,
    #[serde(rename = "VoteChange", default)]
    pub votes_change: String,
}

/// Log-friendly prefix of an opaque identifier. peerIDs come from outside,
/// so the cut must land on a char boundary.
pub fn short(s: &str) -> &str {
    s.get(..12).unwrap_or(s)
}

/// Placeholder cell values treated as absent.
pub fn is_placeholder(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || matches!(t.to_ascii_lowercase().as_str(), "nan" | "none" | "null")
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Record {
            name: name.into(),
            ..Default::default()
        }
    }

    /// peerID usable for contract queries: present, non-placeholder, and not
    /// the resolution sentinel.
    pub fn usable_peer_id(&self) -> Option<&str> {
        match self.peer_id.as_deref() {
            Some(p) if !is_placeholder(p) && p != NOT_FOUND => Some(p),
            _ => None,
        }
    }

    /// Address usable for probing: present and syntactically valid.
    pub fn usable_address(&self) -> Option<&str> {
        match self.address.as_deref() {
            Some(a) if !is_placeholder(a) && address::is_address(a) => Some(a),
            _ => None,
        }
    }
}

/// Outcome of one activity probe, replacing the original sentinel strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Seen(DateTime<Utc>),
    NoRecord,
    InvalidAddress,
}

impl Activity {
    /// Display label written into the table.
    pub fn label(&self) -> String {
        match self {
            Activity::Seen(ts) => display_timestamp(*ts),
            Activity::NoRecord => "no-record".to_string(),
            Activity::InvalidAddress => "invalid-address".to_string(),
        }
    }
}

/// Display form carries a fixed UTC+8 bias, matching the operators' timezone.
pub fn display_timestamp(ts: DateTime<Utc>) -> String {
    let shifted = ts + Duration::hours(8);
    format!("{} CST", shifted.format("%m-%d %H:%M:%S"))
}

/// Strictly older than the threshold; an age of exactly `threshold_hours`
/// is not stale.
pub fn is_stale(last_seen: DateTime<Utc>, now: DateTime<Utc>, threshold_hours: f64) -> bool {
    let age_hours = (now - last_seen).num_seconds() as f64 / 3600.0;
    age_hours > threshold_hours
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    Unchanged,
    FirstObservation,
    Changed(i64),
}

impl std::fmt::Display for Delta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delta::Unchanged => write!(f, "unchanged"),
            Delta::FirstObservation => write!(f, "first-observation"),
            Delta::Changed(n) => write!(f, "{}", n),
        }
    }
}

/// Change between two counter readings. First observation wins over the
/// zero-delta label.
pub fn delta(previous: u64, current: u64) -> Delta {
    if previous == 0 && current != 0 {
        return Delta::FirstObservation;
    }
    let change = current as i64 - previous as i64;
    if change == 0 {
        Delta::Unchanged
    } else {
        Delta::Changed(change)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub rewards: u64,
    pub wins: u64,
    pub votes: u64,
}

/// Point-in-time copy of all counter columns, taken before probing. Missing
/// values coerce to 0, so a first run yields first-observation deltas.
#[derive(Debug, Clone)]
pub struct Snapshot {
    rows: Vec<Counters>,
}

impl Snapshot {
    pub fn capture(records: &[Record]) -> Self {
        let rows = records
            .iter()
            .map(|r| Counters {
                rewards: r.total_rewards.unwrap_or(0),
                wins: r.total_wins.unwrap_or(0),
                votes: r.total_votes.unwrap_or(0),
            })
            .collect();
        Snapshot { rows }
    }

    pub fn counters(&self, index: usize) -> Counters {
        self.rows.get(index).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn delta_vectors() {
        assert_eq!(delta(0, 0), Delta::Unchanged);
        assert_eq!(delta(0, 5), Delta::FirstObservation);
        assert_eq!(delta(5, 5), Delta::Unchanged);
        assert_eq!(delta(5, 8), Delta::Changed(3));
        assert_eq!(delta(5, 2), Delta::Changed(-3));
    }

    #[test]
    fn delta_renders_signed() {
        assert_eq!(Delta::Changed(-3).to_string(), "-3");
        assert_eq!(Delta::Changed(7).to_string(), "7");
        assert_eq!(Delta::Unchanged.to_string(), "unchanged");
        assert_eq!(Delta::FirstObservation.to_string(), "first-observation");
    }

    #[test]
    fn staleness_boundary_is_strict() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let exactly_4h = now - Duration::hours(4);
        let just_over = now - Duration::hours(4) - Duration::seconds(1);
        let fresh = now - Duration::minutes(30);
        assert!(!is_stale(exactly_4h, now, 4.0));
        assert!(is_stale(just_over, now, 4.0));
        assert!(!is_stale(fresh, now, 4.0));
    }

    #[test]
    fn activity_labels() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 1, 30, 0).unwrap();
        assert_eq!(Activity::Seen(ts).label(), "06-01 09:30:00 CST");
        assert_eq!(Activity::NoRecord.label(), "no-record");
        assert_eq!(Activity::InvalidAddress.label(), "invalid-address");
    }

    #[test]
    fn snapshot_coerces_missing_to_zero() {
        let mut r = Record::new("alice");
        r.total_rewards = Some(7);
        let snap = Snapshot::capture(&[r, Record::new("bob")]);
        assert_eq!(snap.counters(0).rewards, 7);
        assert_eq!(snap.counters(0).wins, 0);
        assert_eq!(snap.counters(1).votes, 0);
        // Out of range falls back to zero too.
        assert_eq!(snap.counters(9).rewards, 0);
    }

    #[test]
    fn short_respects_char_boundaries() {
        assert_eq!(short("abcdefghijkl_long"), "abcdefghijkl");
        assert_eq!(short("abc"), "abc");
        // Byte 12 lands inside a multi-byte char; fall back to the whole id.
        assert_eq!(short("abcdefghij日本語"), "abcdefghij日本語");
    }

    #[test]
    fn usable_fields_filter_placeholders() {
        let mut r = Record::new("carol");
        r.peer_id = Some("nan".to_string());
        r.address = Some(NOT_FOUND.to_string());
        assert!(r.usable_peer_id().is_none());
        assert!(r.usable_address().is_none());

        r.peer_id = Some("Qmabc123".to_string());
        r.address = Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string());
        assert_eq!(r.usable_peer_id(), Some("Qmabc123"));
        assert!(r.usable_address().is_some());
    }
}
