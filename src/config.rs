//! Runtime configuration for the aggregation engine.
//!
//! Values come from the environment (optionally seeded from a `.env` file by
//! the binary) and may be overridden on the command line:
//!
//! | Variable               | Default | Meaning                                      |
//! |------------------------|---------|----------------------------------------------|
//! | `PULSE_DATA_ROOT`      | —       | Directory containing one folder per region   |
//! | `PULSE_STRICT_REGIONS` | `true`  | Unknown region is an error, not empty data   |
//! | `PULSE_CONCURRENCY`    | `4`     | Parallel snapshot loads in all-regions mode  |

use anyhow::{Context, Result, bail};
use std::path::PathBuf;

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_root: PathBuf,
    pub strict_regions: bool,
    pub concurrency: usize,
}

impl Config {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            strict_regions: true,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Builds a config from environment variables, with `data_root` taking
    /// precedence over `PULSE_DATA_ROOT` when given.
    pub fn from_env(data_root: Option<PathBuf>) -> Result<Self> {
        Self::from_lookup(data_root, |key| std::env::var(key).ok())
    }

    fn from_lookup<F>(data_root: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_root = match data_root.or_else(|| lookup("PULSE_DATA_ROOT").map(PathBuf::from)) {
            Some(root) => root,
            None => bail!("no data root configured: pass --data-root or set PULSE_DATA_ROOT"),
        };

        let strict_regions = match lookup("PULSE_STRICT_REGIONS") {
            Some(raw) => parse_bool(&raw)
                .with_context(|| format!("invalid PULSE_STRICT_REGIONS value '{raw}'"))?,
            None => true,
        };

        let concurrency = match lookup("PULSE_CONCURRENCY") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("invalid PULSE_CONCURRENCY value '{raw}'"))?,
            None => DEFAULT_CONCURRENCY,
        };

        Ok(Self {
            data_root,
            strict_regions,
            concurrency: concurrency.max(1),
        })
    }

    pub fn with_strict_regions(mut self, strict: bool) -> Self {
        self.strict_regions = strict;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
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
    fn test_defaults_from_env_root() {
        let cfg = Config::from_lookup(None, lookup_from(&[("PULSE_DATA_ROOT", "/srv/pulse")]))
            .unwrap();
        assert_eq!(cfg, Config::new("/srv/pulse"));
    }

    #[test]
    fn test_explicit_root_wins() {
        let cfg = Config::from_lookup(
            Some(PathBuf::from("/cli/root")),
            lookup_from(&[("PULSE_DATA_ROOT", "/env/root")]),
        )
        .unwrap();
        assert_eq!(cfg.data_root, PathBuf::from("/cli/root"));
    }

    #[test]
    fn test_missing_root_is_error() {
        assert!(Config::from_lookup(None, lookup_from(&[])).is_err());
    }

    #[test]
    fn test_overrides_parsed() {
        let cfg = Config::from_lookup(
            None,
            lookup_from(&[
                ("PULSE_DATA_ROOT", "/d"),
                ("PULSE_STRICT_REGIONS", "off"),
                ("PULSE_CONCURRENCY", "0"),
            ]),
        )
        .unwrap();
        assert!(!cfg.strict_regions);
        assert_eq!(cfg.concurrency, 1);
    }

    #[test]
    fn test_bad_bool_rejected() {
        let result = Config::from_lookup(
            None,
            lookup_from(&[("PULSE_DATA_ROOT", "/d"), ("PULSE_STRICT_REGIONS", "maybe")]),
        );
        assert!(result.is_err());
    }
}
