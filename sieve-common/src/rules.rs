// sieve-common/src/rules.rs
// Declarative repository content rules, as read from a TOML file.
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SieveError};
use crate::model::AttributeValue;

/// Which modules a source may serve, and to whom.
///
/// ```toml
/// only_for_consumers = ["compileClasspath", "runtimeClasspath"]
///
/// [[include]]
/// group_regex = "org\\.example(\\..*)?"
///
/// [[exclude]]
/// module = "org.example:legacy"
///
/// [required_attributes]
/// usage = ["runtime"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentRules {
    pub include: Vec<ModuleMatcher>,
    pub exclude: Vec<ModuleMatcher>,
    pub only_for_consumers: Option<Vec<String>>,
    pub not_for_consumers: Vec<String>,
    pub required_attributes: BTreeMap<String, Vec<AttributeValue>>,
}

/// One include or exclude entry. Exactly one key is expected per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleMatcher {
    /// Exact group, e.g. `org.example`.
    Group(String),
    GroupRegex(String),
    /// Exact module, `group:name`.
    Module(String),
    /// Group and name regexes.
    ModuleRegex { group: String, name: String },
    /// Exact component, `group:name:version`.
    Version(String),
    /// Group, name and version regexes.
    VersionRegex {
        group: String,
        name: String,
        version: String,
    },
}

impl ContentRules {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let rules: ContentRules = toml::from_str(raw)?;
        debug!(
            "Parsed content rules: {} include, {} exclude, {} required attributes",
            rules.include.len(),
            rules.exclude.len(),
            rules.required_attributes.len()
        );
        Ok(rules)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading content rules from {}", path.display());
        if !path.exists() {
            return Err(SieveError::NotFound(format!(
                "content rules file {}",
                path.display()
            )));
        }
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
            && self.exclude.is_empty()
            && self.only_for_consumers.is_none()
            && self.not_for_consumers.is_empty()
            && self.required_attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rules_from_toml() {
        let rules = ContentRules::from_toml_str(
            r#"
            only_for_consumers = ["runtimeClasspath"]
            not_for_consumers = ["annotationProcessor"]

            [[include]]
            group = "org.example"

            [[include]]
            module_regex = { group = "com\\.acme.*", name = ".*-core" }

            [[exclude]]
            version = "org.example:legacy:1.0"

            [required_attributes]
            usage = ["runtime", "api"]
            debug = [false]
            "#,
        )
        .unwrap();

        assert_eq!(
            rules.include,
            vec![
                ModuleMatcher::Group("org.example".into()),
                ModuleMatcher::ModuleRegex {
                    group: "com\\.acme.*".into(),
                    name: ".*-core".into()
                },
            ]
        );
        assert_eq!(
            rules.exclude,
            vec![ModuleMatcher::Version("org.example:legacy:1.0".into())]
        );
        assert_eq!(
            rules.only_for_consumers,
            Some(vec!["runtimeClasspath".to_string()])
        );
        assert_eq!(
            rules.required_attributes.get("debug"),
            Some(&vec![AttributeValue::Bool(false)])
        );
        assert!(!rules.is_empty());
    }

    #[test]
    fn empty_document_is_empty_rules() {
        assert!(ContentRules::from_toml_str("").unwrap().is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ContentRules::from_toml_str("exclude_everything = true").is_err());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentRules::from_path(&dir.path().join("rules.toml")).unwrap_err();
        assert!(matches!(err, SieveError::NotFound(_)));
    }
}
