use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_PORT: u16 = 8000;

/// Runtime settings read from the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// MongoDB connection string (`DATABASE_URL`)
    pub database_url: Option<String>,
    /// Database holding the property collection (`DATABASE_NAME`)
    pub database_name: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            database_name: non_empty("DATABASE_NAME"),
            port,
        })
    }

    /// Both halves of the store configuration, if present
    pub fn database(&self) -> Option<(&str, &str)> {
        match (&self.database_url, &self.database_name) {
            (Some(url), Some(name)) => Some((url, name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.database().is_none());
    }

    #[test]
    fn reads_database_settings() {
        let config = load(&[
            ("DATABASE_URL", "mongodb://localhost:27017"),
            ("DATABASE_NAME", "listings"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(
            config.database(),
            Some(("mongodb://localhost:27017", "listings"))
        );
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = load(&[("DATABASE_URL", "  "), ("DATABASE_NAME", "listings")]).unwrap();
        assert!(config.database_url.is_none());
        assert!(config.database().is_none());
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(load(&[("PORT", "eighty")]).is_err());
    }
}
