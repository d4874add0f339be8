use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SentinelConfig {
    pub rpc: RpcConfig,
    pub explorer: ExplorerConfig,
    pub poll: PollConfig,
    pub store: StoreConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RpcConfig {
    pub url: String,
    pub contract_address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExplorerConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PollConfig {
    #[serde(default = "default_fanout")]
    pub fanout: usize,
    /// Minimum spacing between explorer requests, shared across workers.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Participants quieter than this are flagged for a check.
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: f64,
    /// Probe attempts before a record is written off as unreachable.
    #[serde(default = "default_max_probe_attempts")]
    pub max_probe_attempts: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    pub path: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fanout() -> usize {
    12
}

fn default_min_interval_ms() -> u64 {
    100
}

fn default_stale_after_hours() -> f64 {
    4.0
}

fn default_max_probe_attempts() -> u32 {
    8
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig {
                url: "https://gensyn-testnet.g.alchemy.com/v2/demo".to_string(),
                contract_address: "0xFaD7C5e93f28257429569B854151A1B8DCD404c2".to_string(),
            },
            explorer: ExplorerConfig {
                api_url: "https://gensyn-testnet.explorer.alchemy.com/api".to_string(),
                api_key: String::new(),
            },
            poll: PollConfig {
                fanout: default_fanout(),
                min_interval_ms: default_min_interval_ms(),
                stale_after_hours: default_stale_after_hours(),
                max_probe_attempts: default_max_probe_attempts(),
            },
            store: StoreConfig {
                path: "records.json".to_string(),
            },
            log_level: default_log_level(),
        }
    }
}

impl SentinelConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        println!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        eprintln!("Error parsing config: {}. Using Defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!("Error reading config: {}. Using Defaults.", e);
                    Self::default()
                }
            }
        } else {
            println!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                let _ = std::fs::write(path, s);
            }
            config
        }
    }
}
