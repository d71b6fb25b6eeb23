// Host configuration, read from the environment (and `.env` when present)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:1234";
pub const DEFAULT_STATE_PATH: &str = "data/ledger_state.json";
pub const DEFAULT_BLOCK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// LEDGER_BIND_ADDR
    pub bind_addr: SocketAddr,
    /// LEDGER_STATE_PATH
    pub state_path: PathBuf,
    /// LEDGER_BLOCK_INTERVAL_MS - how often the host clock advances one block
    pub block_interval: Duration,
    /// LEDGER_PERSIST - load on start, save on shutdown
    pub persist: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 1234)),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            block_interval: Duration::from_millis(DEFAULT_BLOCK_INTERVAL_MS),
            persist: true,
        }
    }
}

impl Config {
    /// Load `.env` (if any) then read the process environment
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("LEDGER_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|e| format!("Invalid LEDGER_BIND_ADDR '{}': {}", addr, e))?;
        }

        if let Some(path) = lookup("LEDGER_STATE_PATH") {
            config.state_path = PathBuf::from(path);
        }

        if let Some(ms) = lookup("LEDGER_BLOCK_INTERVAL_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|e| format!("Invalid LEDGER_BLOCK_INTERVAL_MS '{}': {}", ms, e))?;
            if ms == 0 {
                return Err("LEDGER_BLOCK_INTERVAL_MS must be greater than 0".to_string());
            }
            config.block_interval = Duration::from_millis(ms);
        }

        if let Some(flag) = lookup("LEDGER_PERSIST") {
            config.persist = flag == "true" || flag == "1";
        }

        Ok(config)
    }
}
