use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Password hashing cost parameters
    pub hashing: HashingConfig,
    /// Request limits
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// Argon2 cost parameters. Defaults match the `argon2` crate defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_body_size: u64,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            hashing: HashingConfig::default(),
            limits: LimitsConfig {
                max_body_size: 1_048_576, // 1MB
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or(defaults.server.host),
                port: parse_or("PORT", lookup("PORT"), defaults.server.port)?,
                cors_origins: lookup("CORS_ORIGINS")
                    .map(|origins| {
                        origins
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or(defaults.server.cors_origins),
            },
            hashing: HashingConfig {
                memory_kib: parse_or(
                    "ARGON2_MEMORY_KIB",
                    lookup("ARGON2_MEMORY_KIB"),
                    defaults.hashing.memory_kib,
                )?,
                iterations: parse_or(
                    "ARGON2_ITERATIONS",
                    lookup("ARGON2_ITERATIONS"),
                    defaults.hashing.iterations,
                )?,
                parallelism: parse_or(
                    "ARGON2_PARALLELISM",
                    lookup("ARGON2_PARALLELISM"),
                    defaults.hashing.parallelism,
                )?,
            },
            limits: LimitsConfig {
                max_body_size: parse_or(
                    "MAX_BODY_SIZE",
                    lookup("MAX_BODY_SIZE"),
                    defaults.limits.max_body_size,
                )?,
            },
        };

        Ok(config)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid {} value: {:?}", key, value)),
        None => Ok(default),
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
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.hashing, HashingConfig::default());
        assert_eq!(config.limits.max_body_size, 1_048_576);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("ARGON2_MEMORY_KIB", "64"),
            ("MAX_BODY_SIZE", "2048"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(config.hashing.memory_kib, 64);
        assert_eq!(config.limits.max_body_size, 2048);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let result = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert!(result.is_err());
    }
}
