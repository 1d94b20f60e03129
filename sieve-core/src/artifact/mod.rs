// sieve-core/src/artifact/mod.rs
//! Projection of resolved artifacts onto a filtered, re-attributed file view.
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sieve_common::error::{Result, SieveError};
use sieve_common::model::{ArtifactIdentifier, AttributeSet, ComponentIdentifier};
use tracing::{debug, trace};

/// Parameters of one artifact view: which components to keep, and which
/// attributes to force on the view's variant selection.
pub struct ArtifactViewRequest<'a> {
    component_filter: &'a (dyn Fn(&ComponentIdentifier) -> bool + 'a),
    attributes: Option<&'a AttributeSet>,
}

impl<'a> ArtifactViewRequest<'a> {
    pub fn new(component_filter: &'a (dyn Fn(&ComponentIdentifier) -> bool + 'a)) -> Self {
        Self {
            component_filter,
            attributes: None,
        }
    }

    pub fn with_attributes(mut self, attributes: &'a AttributeSet) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn accepts(&self, component: &ComponentIdentifier) -> bool {
        (self.component_filter)(component)
    }

    /// Forced attributes, or `None` when the view keeps its defaults.
    pub fn attributes(&self) -> Option<&'a AttributeSet> {
        self.attributes
    }
}

/// Produces artifact files for a view request. Materializing the files may
/// block on downloads; failures are returned to the caller untouched.
pub trait ArtifactViewProvider {
    fn artifact_files(&self, request: &ArtifactViewRequest<'_>) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    pub id: ArtifactIdentifier,
    pub file: PathBuf,
    #[serde(default)]
    pub attributes: AttributeSet,
    /// Set when the artifact could not be fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ResolvedArtifact {
    pub fn new(id: ArtifactIdentifier, file: impl Into<PathBuf>) -> Self {
        Self {
            id,
            file: file.into(),
            attributes: AttributeSet::empty(),
            failure: None,
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeSet) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// An artifact is compatible unless it declares one of the requested
    /// attributes with a different value.
    fn is_compatible_with(&self, requested: &AttributeSet) -> bool {
        requested
            .iter()
            .all(|(key, value)| self.attributes.get(key).is_none_or(|own| own == value))
    }
}

/// The artifacts of one resolution result, with the attributes its views use
/// by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolvedArtifactSet {
    pub default_attributes: AttributeSet,
    pub artifacts: Vec<ResolvedArtifact>,
}

impl ResolvedArtifactSet {
    pub fn new(default_attributes: AttributeSet) -> Self {
        Self {
            default_attributes,
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, artifact: ResolvedArtifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        debug!("Loading resolved artifacts from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl ArtifactViewProvider for ResolvedArtifactSet {
    fn artifact_files(&self, request: &ArtifactViewRequest<'_>) -> Result<Vec<PathBuf>> {
        let requested = match request.attributes() {
            Some(overrides) => Cow::Owned(self.default_attributes.overridden_by(overrides)),
            None => Cow::Borrowed(&self.default_attributes),
        };
        trace!("Selecting artifacts with attributes {}", requested);

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for artifact in &self.artifacts {
            if !request.accepts(artifact.id.component())
                || !artifact.is_compatible_with(&requested)
                || !seen.insert(&artifact.id)
            {
                continue;
            }
            if let Some(reason) = &artifact.failure {
                return Err(SieveError::ArtifactView(format!(
                    "could not resolve {}: {reason}",
                    artifact.id
                )));
            }
            files.push(artifact.file.clone());
        }
        debug!("Artifact view selected {} files", files.len());
        Ok(files)
    }
}
