// sieve-common/src/model/identifier.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SieveError;

/// A module coordinate without a version, e.g. `org.example:widgets`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleIdentifier {
    pub group: String,
    pub name: String,
}

impl ModuleIdentifier {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl FromStr for ModuleIdentifier {
    type Err = SieveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [group, name] if !group.is_empty() && !name.is_empty() => {
                Ok(Self::new(*group, *name))
            }
            _ => Err(SieveError::Parse(
                "module identifier",
                format!("expected 'group:name', got '{s}'"),
            )),
        }
    }
}

/// One version of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleComponentIdentifier {
    #[serde(flatten)]
    pub module: ModuleIdentifier,
    pub version: String,
}

impl ModuleComponentIdentifier {
    pub fn new(module: ModuleIdentifier, version: impl Into<String>) -> Self {
        Self {
            module,
            version: version.into(),
        }
    }

    pub fn module(&self) -> &ModuleIdentifier {
        &self.module
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for ModuleComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.version)
    }
}

impl FromStr for ModuleComponentIdentifier {
    type Err = SieveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [group, name, version]
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(ModuleIdentifier::new(*group, *name), *version))
            }
            _ => Err(SieveError::Parse(
                "component identifier",
                format!("expected 'group:name:version', got '{s}'"),
            )),
        }
    }
}

/// Identifies a component in a resolved graph.
///
/// Equality is structural, so two separately constructed identifiers for the
/// same component compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentIdentifier {
    /// A versioned component fetched from a module source.
    Module(ModuleComponentIdentifier),
    /// A component produced by a build taking part in the same session.
    Project { build: String, path: String },
    /// Any other kind of component (file dependencies, local libraries).
    Opaque { display_name: String },
}

impl ComponentIdentifier {
    pub fn module(group: &str, name: &str, version: &str) -> Self {
        Self::Module(ModuleComponentIdentifier::new(
            ModuleIdentifier::new(group, name),
            version,
        ))
    }

    pub fn as_module(&self) -> Option<&ModuleComponentIdentifier> {
        match self {
            Self::Module(id) => Some(id),
            _ => None,
        }
    }

    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl From<ModuleComponentIdentifier> for ComponentIdentifier {
    fn from(id: ModuleComponentIdentifier) -> Self {
        Self::Module(id)
    }
}

impl fmt::Display for ComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(id) => write!(f, "{id}"),
            Self::Project { build, path } => write!(f, "project {build}{path}"),
            Self::Opaque { display_name } => f.write_str(display_name),
        }
    }
}

/// One physical artifact, owned by exactly one component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactIdentifier {
    pub component: ComponentIdentifier,
    pub name: String,
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
}

impl ArtifactIdentifier {
    pub fn new(
        component: ComponentIdentifier,
        name: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            component,
            name: name.into(),
            extension: extension.into(),
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn component(&self) -> &ComponentIdentifier {
        &self.component
    }

    /// File name as it would appear on disk, e.g. `widgets-1.0-sources.jar`.
    pub fn file_name(&self) -> String {
        let version = self
            .component
            .as_module()
            .map(|id| format!("-{}", id.version))
            .unwrap_or_default();
        match &self.classifier {
            Some(classifier) => format!(
                "{}{version}-{classifier}.{}",
                self.name, self.extension
            ),
            None => format!("{}{version}.{}", self.name, self.extension),
        }
    }
}

impl fmt::Display for ArtifactIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file_name(), self.component)
    }
}

/// A version request for a module, as written in a dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleComponentSelector {
    #[serde(flatten)]
    pub module: ModuleIdentifier,
    pub version_constraint: String,
}

impl ModuleComponentSelector {
    pub fn new(module: ModuleIdentifier, version_constraint: impl Into<String>) -> Self {
        Self {
            module,
            version_constraint: version_constraint.into(),
        }
    }

    pub fn module_identifier(&self) -> &ModuleIdentifier {
        &self.module
    }
}

impl fmt::Display for ModuleComponentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.version_constraint)
    }
}

/// A dependency declaration as seen by a module source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleDependency {
    pub selector: ModuleComponentSelector,
    #[serde(default = "default_transitive")]
    pub transitive: bool,
}

fn default_transitive() -> bool {
    true
}

impl ModuleDependency {
    pub fn new(selector: ModuleComponentSelector) -> Self {
        Self {
            selector,
            transitive: true,
        }
    }

    pub fn selector(&self) -> &ModuleComponentSelector {
        &self.selector
    }
}
