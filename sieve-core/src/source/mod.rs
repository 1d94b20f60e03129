// sieve-core/src/source/mod.rs
//! The module source capability consumed by the resolution engine.
//!
//! A source exposes two access modes. Local access only answers from what
//! the source already has at hand (caches, local files); remote access may go
//! out to the network. Both have the same surface, so decorators wrap them
//! symmetrically.
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use sieve_common::error::Result;
use sieve_common::model::{
    ArtifactIdentifier, AttributeSet, ModuleComponentIdentifier, ModuleComponentSelector,
    ModuleDependency,
};

pub mod memory;

pub use memory::{ComponentRecord, InMemorySource, SourceSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Local,
    Remote,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// Outcome of a source lookup that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Found(T),
    Missing,
}

impl<T> Resolution<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing => None,
        }
    }

    pub fn as_ref(&self) -> Resolution<&T> {
        match self {
            Self::Found(value) => Resolution::Found(value),
            Self::Missing => Resolution::Missing,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Self::Found(value) => Resolution::Found(f(value)),
            Self::Missing => Resolution::Missing,
        }
    }
}

impl<T> From<Option<T>> for Resolution<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Self::Found)
    }
}

/// How expensive it is to fetch metadata for a component, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFetchingCost {
    Fast,
    Cheap,
    Expensive,
}

impl MetadataFetchingCost {
    pub fn is_fast(self) -> bool {
        self == Self::Fast
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Main,
    Sources,
    Docs,
    Descriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: ArtifactIdentifier,
    #[serde(default = "default_artifact_type")]
    pub artifact_type: ArtifactType,
}

fn default_artifact_type() -> ArtifactType {
    ArtifactType::Main
}

/// Where a piece of component metadata was read from. Handed back to the
/// source when its artifacts are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceOrigin {
    pub source_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    pub id: ModuleComponentIdentifier,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub changing: bool,
    #[serde(default)]
    pub attributes: AttributeSet,
    #[serde(default)]
    pub dependencies: Vec<ModuleComponentSelector>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<SourceOrigin>,
}

fn default_status() -> String {
    "release".to_string()
}

impl ComponentMetadata {
    pub fn new(id: ModuleComponentIdentifier) -> Self {
        Self {
            id,
            status: default_status(),
            changing: false,
            attributes: AttributeSet::empty(),
            dependencies: Vec::new(),
            artifacts: Vec::new(),
            origin: None,
        }
    }
}

/// Request-side adjustments to a metadata lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentOverrideMetadata {
    /// Treat the component as changing even when its metadata says otherwise.
    pub changing: bool,
    /// Restrict the component to these artifact names. Empty means no restriction.
    pub artifacts: Vec<String>,
}

/// Artifacts a source has already located, shared between a source and any
/// decorator wrapping it.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: Mutex<HashMap<ArtifactIdentifier, PathBuf>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ArtifactIdentifier) -> Option<PathBuf> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn insert(&self, id: ArtifactIdentifier, file: PathBuf) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, file);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppliedMetadata {
    pub status: String,
    pub attributes: AttributeSet,
}

/// Cheap metadata hook a source may offer in place of a full metadata fetch.
pub trait MetadataSupplier: Send + Sync {
    fn supply(&self, id: &ModuleComponentIdentifier) -> Result<Option<SuppliedMetadata>>;
}

/// One access mode of a module source.
///
/// `Err` is reserved for real failures. "Not there" is `Ok(Resolution::Missing)`
/// (or an empty version list for listings).
pub trait SourceAccess: Send + Sync {
    fn list_module_versions(&self, dependency: &ModuleDependency) -> Result<Resolution<Vec<String>>>;

    fn resolve_component_metadata(
        &self,
        id: &ModuleComponentIdentifier,
        request: &ComponentOverrideMetadata,
    ) -> Result<Resolution<ComponentMetadata>>;

    fn resolve_artifacts(
        &self,
        component: &ComponentMetadata,
    ) -> Result<Resolution<Vec<ArtifactMetadata>>>;

    fn resolve_artifacts_with_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
    ) -> Result<Resolution<Vec<ArtifactMetadata>>>;

    fn resolve_artifact(
        &self,
        artifact: &ArtifactMetadata,
        origin: &SourceOrigin,
    ) -> Result<Resolution<PathBuf>>;

    fn estimate_metadata_fetching_cost(&self, id: &ModuleComponentIdentifier)
        -> MetadataFetchingCost;
}

/// A place modules can be resolved from.
pub trait ModuleSource: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn access(&self, mode: AccessMode) -> &dyn SourceAccess;

    fn local_access(&self) -> &dyn SourceAccess {
        self.access(AccessMode::Local)
    }

    fn remote_access(&self) -> &dyn SourceAccess {
        self.access(AccessMode::Remote)
    }

    fn artifact_cache(&self) -> Arc<ArtifactCache>;

    fn metadata_supplier(&self) -> Option<Arc<dyn MetadataSupplier>>;
}
