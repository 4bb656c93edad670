// Runtime configuration
//
// Environment first (GYM_DB_PATH, GYM_LOG, GYM_BCRYPT_COST), then command-line
// flags override whatever the environment set.

use crate::password::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "GYM_DB_PATH";
pub const ENV_LOG: &str = "GYM_LOG";
pub const ENV_BCRYPT_COST: &str = "GYM_BCRYPT_COST";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// tracing filter directive ("info", "gym_records=debug", ...)
    pub log_level: String,
    /// bcrypt work factor, 4..=31
    pub bcrypt_cost: u32,
    /// Render listings as JSON lines instead of text boxes
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: default_database_path(),
            log_level: "info".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            json_output: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            config.log_level = level;
        }
        if let Some(cost) = lookup(ENV_BCRYPT_COST) {
            config.bcrypt_cost = cost
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number, got '{}'", ENV_BCRYPT_COST, cost))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            bail!(
                "bcrypt cost must be between {} and {}, got {}",
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST,
                self.bcrypt_cost
            );
        }
        Ok(())
    }
}

/// `<data dir>/gym-records/gym.db`, or `./gym.db` when there is no data dir
pub fn default_database_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("gym-records").join("gym.db"),
        None => PathBuf::from("gym.db"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.database_path.ends_with("gym.db"));
    }

    #[test]
    fn test_environment_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/tmp/test-gym.db"),
            (ENV_LOG, "debug"),
            (ENV_BCRYPT_COST, "6"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/test-gym.db"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.bcrypt_cost, 6);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config =
            Config::from_lookup(lookup_from(&[(ENV_DB_PATH, "  "), (ENV_LOG, "")])).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.database_path, default_database_path());
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[(ENV_BCRYPT_COST, "cheap")])).unwrap_err();
        assert!(err.to_string().contains(ENV_BCRYPT_COST));

        assert!(Config::from_lookup(lookup_from(&[(ENV_BCRYPT_COST, "2")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[(ENV_BCRYPT_COST, "32")])).is_err());
    }

    #[test]
    fn test_cost_bounds_are_inclusive() {
        for cost in [MIN_BCRYPT_COST, MAX_BCRYPT_COST] {
            let value = cost.to_string();
            let config = Config::from_lookup(lookup_from(&[(ENV_BCRYPT_COST, value.as_str())])).unwrap();
            assert_eq!(config.bcrypt_cost, cost);
        }
    }
}
