// sieve-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::error::{Result, SieveError};
use crate::model::AttributeSet;
use crate::rules::ContentRules;

const DEFAULT_CONSUMER_NAME: &str = "default";
const FALLBACK_LOG_DIR: &str = "sieve_logs";

pub const RULES_ENV: &str = "SIEVE_RULES";
pub const CONSUMER_ENV: &str = "SIEVE_CONSUMER";
pub const CONSUMER_ATTRIBUTES_ENV: &str = "SIEVE_CONSUMER_ATTRIBUTES";
pub const LOG_DIR_ENV: &str = "SIEVE_LOG_DIR";

#[derive(Debug, Clone)]
pub struct Config {
    pub rules_file: Option<PathBuf>,
    pub consumer_name: String,
    pub consumer_attributes: AttributeSet,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading sieve configuration");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup. `load` uses
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let rules_file = non_empty(RULES_ENV).map(PathBuf::from);
        if let Some(path) = &rules_file {
            debug!("Content rules file: {}", path.display());
        }

        let consumer_name = non_empty(CONSUMER_ENV).unwrap_or_else(|| {
            debug!(
                "{} not set or empty, falling back to default consumer name: {}",
                CONSUMER_ENV, DEFAULT_CONSUMER_NAME
            );
            DEFAULT_CONSUMER_NAME.to_string()
        });

        let consumer_attributes = match non_empty(CONSUMER_ATTRIBUTES_ENV) {
            Some(raw) => raw.parse::<AttributeSet>().map_err(|e| {
                SieveError::Config(format!("Invalid {CONSUMER_ATTRIBUTES_ENV}: {e}"))
            })?,
            None => AttributeSet::empty(),
        };

        let log_dir = non_empty(LOG_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                ProjectDirs::from("", "", "sieve").map(|dirs| dirs.data_local_dir().join("logs"))
            })
            .unwrap_or_else(|| PathBuf::from(FALLBACK_LOG_DIR));

        debug!(
            "Configuration loaded: consumer='{}', attributes={}, log_dir={}",
            consumer_name,
            consumer_attributes,
            log_dir.display()
        );
        Ok(Self {
            rules_file,
            consumer_name,
            consumer_attributes,
            log_dir,
        })
    }

    pub fn logs_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Loads the configured content rules. `None` when no rules file is set,
    /// meaning sources are used unfiltered.
    pub fn load_content_rules(&self) -> Result<Option<ContentRules>> {
        self.rules_file
            .as_deref()
            .map(ContentRules::from_path)
            .transpose()
    }
}

pub fn load_config() -> Result<Config> {
    Config::load()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use super::*;
    use crate::model::AttributeValue;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.consumer_name, DEFAULT_CONSUMER_NAME);
        assert!(config.consumer_attributes.is_empty());
        assert!(config.rules_file.is_none());
        assert!(config.load_content_rules().unwrap().is_none());
    }

    #[test]
    fn reads_consumer_and_attributes() {
        let config = Config::from_lookup(lookup(&[
            (CONSUMER_ENV, "runtimeClasspath"),
            (CONSUMER_ATTRIBUTES_ENV, "usage=runtime,debug=true"),
            (LOG_DIR_ENV, "/tmp/sieve-logs"),
        ]))
        .unwrap();
        assert_eq!(config.consumer_name, "runtimeClasspath");
        assert_eq!(
            config.consumer_attributes.get("debug"),
            Some(&AttributeValue::Bool(true))
        );
        assert_eq!(config.logs_dir(), Path::new("/tmp/sieve-logs"));
    }

    #[test]
    fn malformed_attributes_are_a_config_error() {
        let err = Config::from_lookup(lookup(&[(CONSUMER_ATTRIBUTES_ENV, "usage")])).unwrap_err();
        assert!(matches!(err, SieveError::Config(_)));
    }

    #[test]
    fn loads_rules_from_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        fs::write(&path, "not_for_consumers = [\"testRuntime\"]\n").unwrap();

        let config =
            Config::from_lookup(lookup(&[(RULES_ENV, path.to_str().unwrap())])).unwrap();
        let rules = config.load_content_rules().unwrap().unwrap();
        assert_eq!(rules.not_for_consumers, vec!["testRuntime".to_string()]);
    }
}
