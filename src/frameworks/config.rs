use std::{env, path::PathBuf, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("SIM_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080)
}

/// Faction assigned to clients that connect without a `faction` query parameter.
pub fn default_faction() -> String {
    env::var("DEFAULT_FACTION")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "USA".to_string())
}

/// Seed for casualty rolls; a random one is drawn when unset or unparsable.
pub fn sim_seed() -> u64 {
    env::var("SIM_SEED")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(rand::random)
}

/// Optional TOML file replacing the built-in scenario.
pub fn scenario_path() -> Option<PathBuf> {
    env::var("WORLD_SCENARIO_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 1000;

pub const TICK_INTERVAL: Duration = Duration::from_millis(20);
