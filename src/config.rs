//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Whether the record cache answers lookups at all
    pub cache_enabled: bool,
    /// Collect per-index access/miss statistics
    pub diagnostics: bool,
    /// Background consistency sweep interval in seconds, 0 disables it
    pub verify_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_ENABLED` - Enable the record cache (default: true)
    /// - `CACHE_DIAGNOSTICS` - Collect index statistics (default: false)
    /// - `VERIFY_INTERVAL` - Consistency sweep frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_enabled: env_or("CACHE_ENABLED", defaults.cache_enabled),
            diagnostics: env_or("CACHE_DIAGNOSTICS", defaults.diagnostics),
            verify_interval: env_or("VERIFY_INTERVAL", defaults.verify_interval),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_enabled: true,
            diagnostics: false,
            verify_interval: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert!(config.cache_enabled);
        assert!(!config.diagnostics);
        assert_eq!(config.verify_interval, 30);
    }

    #[test]
    fn test_config_from_env() {
        env::remove_var("SERVER_PORT");
        env::remove_var("CACHE_ENABLED");
        env::set_var("CACHE_DIAGNOSTICS", "true");
        env::set_var("VERIFY_INTERVAL", "not-a-number");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert!(config.cache_enabled);
        assert!(config.diagnostics);
        assert_eq!(config.verify_interval, 30);

        env::remove_var("CACHE_DIAGNOSTICS");
        env::remove_var("VERIFY_INTERVAL");
    }
}
