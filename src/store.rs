// JSON-backed record table.
use std::fs;

use crate::error::SentinelError;
use crate::record::{is_placeholder, Record};

/// Load the participant table. Unreadable or unparsable input is fatal to the
/// run (the caller exits before any network traffic). Optional columns may be
/// missing entirely; placeholder cell values are normalized away.
pub fn load_records(path: &str) -> Result<Vec<Record>, SentinelError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| SentinelError::Store(format!("cannot read {}: {}", path, e)))?;
    let mut records: Vec<Record> = serde_json::from_str(&raw)
        .map_err(|e| SentinelError::Store(format!("cannot parse {}: {}", path, e)))?;
    for record in &mut records {
        clean(record);
    }
    Ok(records)
}

/// Best-effort single write at the end of a run.
pub fn save_records(path: &str, records: &[Record]) -> Result<(), SentinelError> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| SentinelError::Store(e.to_string()))?;
    fs::write(path, json).map_err(|e| SentinelError::Store(format!("cannot write {}: {}", path, e)))
}

fn clean(record: &mut Record) {
    record.name = record.name.trim().to_string();
    record.peer_id = normalize(record.peer_id.take());
    record.address = normalize(record.address.take());
}

fn normalize(cell: Option<String>) -> Option<String> {
    match cell {
        Some(s) if is_placeholder(&s) => None,
        Some(s) => Some(s.trim().to_string()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_missing_columns_and_placeholders() {
        let raw = r#"[
            {"name": " alice ", "peerID": "QmA", "address": "nan"},
            {"name": "bob"},
            {"name": "carol", "peerID": "None", "address": " 0x1111111111111111111111111111111111111111 "}
        ]"#;
        let path = std::env::temp_dir().join("peer_sentinel_store_test_load.json");
        fs::write(&path, raw).unwrap();

        let records = load_records(path.to_str().unwrap()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "alice");
        assert_eq!(records[0].peer_id.as_deref(), Some("QmA"));
        assert!(records[0].address.is_none());
        assert!(records[1].peer_id.is_none());
        assert_eq!(records[1].last_activity, "");
        assert!(records[2].peer_id.is_none());
        assert_eq!(
            records[2].address.as_deref(),
            Some("0x1111111111111111111111111111111111111111")
        );

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_a_store_error() {
        let err = load_records("/no/such/table.json").unwrap_err();
        assert!(matches!(err, SentinelError::Store(_)));
    }

    #[test]
    fn saved_table_loads_back() {
        let mut r = Record::new("dave");
        r.peer_id = Some("QmD".to_string());
        r.total_rewards = Some(4);
        r.rewards_change = "first-observation".to_string();

        let path = std::env::temp_dir().join("peer_sentinel_store_test_save.json");
        save_records(path.to_str().unwrap(), &[r]).unwrap();

        let records = load_records(path.to_str().unwrap()).unwrap();
        assert_eq!(records[0].name, "dave");
        assert_eq!(records[0].total_rewards, Some(4));
        assert_eq!(records[0].rewards_change, "first-observation");

        let _ = fs::remove_file(path);
    }
}
