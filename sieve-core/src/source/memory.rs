// sieve-core/src/source/memory.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sieve_common::error::{Result, SieveError};
use sieve_common::model::{ModuleComponentIdentifier, ModuleDependency};
use tracing::{debug, trace};

use super::{
    AccessMode, ArtifactCache, ArtifactMetadata, ArtifactType, ComponentMetadata,
    ComponentOverrideMetadata, MetadataFetchingCost, MetadataSupplier, ModuleSource, Resolution,
    SourceAccess, SourceOrigin,
};

/// A component as stored by an [`InMemorySource`]: its metadata plus the
/// files its artifacts resolve to, keyed by artifact file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub metadata: ComponentMetadata,
    #[serde(default)]
    pub files: BTreeMap<String, PathBuf>,
}

impl ComponentRecord {
    pub fn new(metadata: ComponentMetadata) -> Self {
        Self {
            metadata,
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, artifact: ArtifactMetadata, file: impl Into<PathBuf>) -> Self {
        self.files.insert(artifact.id.file_name(), file.into());
        self.metadata.artifacts.push(artifact);
        self
    }
}

/// JSON form of an [`InMemorySource`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSnapshot {
    pub id: String,
    pub name: String,
    /// Components available without going remote.
    pub local: Vec<ComponentRecord>,
    pub remote: Vec<ComponentRecord>,
}

/// A module source backed by fixed component records.
pub struct InMemorySource {
    id: String,
    name: String,
    local: MemoryAccess,
    remote: MemoryAccess,
    artifact_cache: Arc<ArtifactCache>,
    metadata_supplier: Option<Arc<dyn MetadataSupplier>>,
}

impl InMemorySource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let artifact_cache = Arc::new(ArtifactCache::new());
        Self {
            local: MemoryAccess::new(&id, AccessMode::Local, Arc::clone(&artifact_cache)),
            remote: MemoryAccess::new(&id, AccessMode::Remote, Arc::clone(&artifact_cache)),
            id,
            name: name.into(),
            artifact_cache,
            metadata_supplier: None,
        }
    }

    pub fn from_snapshot(snapshot: SourceSnapshot) -> Self {
        let mut source = Self::new(snapshot.id, snapshot.name);
        for record in snapshot.local {
            source = source.with_local(record);
        }
        for record in snapshot.remote {
            source = source.with_remote(record);
        }
        source
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        debug!("Loading source snapshot from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let snapshot: SourceSnapshot = serde_json::from_str(&raw)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn with_local(mut self, record: ComponentRecord) -> Self {
        self.local.insert(record);
        self
    }

    pub fn with_remote(mut self, record: ComponentRecord) -> Self {
        self.remote.insert(record);
        self
    }

    pub fn with_metadata_supplier(mut self, supplier: Arc<dyn MetadataSupplier>) -> Self {
        self.metadata_supplier = Some(supplier);
        self
    }
}

impl ModuleSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn access(&self, mode: AccessMode) -> &dyn SourceAccess {
        match mode {
            AccessMode::Local => &self.local,
            AccessMode::Remote => &self.remote,
        }
    }

    fn artifact_cache(&self) -> Arc<ArtifactCache> {
        Arc::clone(&self.artifact_cache)
    }

    fn metadata_supplier(&self) -> Option<Arc<dyn MetadataSupplier>> {
        self.metadata_supplier.clone()
    }
}

struct MemoryAccess {
    source_id: String,
    mode: AccessMode,
    components: BTreeMap<ModuleComponentIdentifier, ComponentRecord>,
    artifact_cache: Arc<ArtifactCache>,
}

impl MemoryAccess {
    fn new(source_id: &str, mode: AccessMode, artifact_cache: Arc<ArtifactCache>) -> Self {
        Self {
            source_id: source_id.to_string(),
            mode,
            components: BTreeMap::new(),
            artifact_cache,
        }
    }

    fn insert(&mut self, mut record: ComponentRecord) {
        record.metadata.origin = Some(SourceOrigin {
            source_id: self.source_id.clone(),
        });
        self.components.insert(record.metadata.id.clone(), record);
    }

    fn artifacts_matching(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
    ) -> Resolution<Vec<ArtifactMetadata>> {
        self.components
            .get(&component.id)
            .map(|record| {
                record
                    .metadata
                    .artifacts
                    .iter()
                    .filter(|a| a.artifact_type == artifact_type)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .into()
    }
}

impl SourceAccess for MemoryAccess {
    fn list_module_versions(&self, dependency: &ModuleDependency) -> Result<Resolution<Vec<String>>> {
        let module = dependency.selector().module_identifier();
        let versions: Vec<String> = self
            .components
            .keys()
            .filter(|id| id.module() == module)
            .map(|id| id.version().to_string())
            .collect();
        trace!(
            "[{}:{}] listed {} versions of {}",
            self.source_id,
            self.mode,
            versions.len(),
            module
        );
        Ok(Resolution::Found(versions))
    }

    fn resolve_component_metadata(
        &self,
        id: &ModuleComponentIdentifier,
        request: &ComponentOverrideMetadata,
    ) -> Result<Resolution<ComponentMetadata>> {
        let Some(record) = self.components.get(id) else {
            trace!("[{}:{}] no metadata for {}", self.source_id, self.mode, id);
            return Ok(Resolution::Missing);
        };
        let mut metadata = record.metadata.clone();
        metadata.changing |= request.changing;
        if !request.artifacts.is_empty() {
            metadata
                .artifacts
                .retain(|a| request.artifacts.iter().any(|name| *name == a.id.name));
        }
        Ok(Resolution::Found(metadata))
    }

    fn resolve_artifacts(
        &self,
        component: &ComponentMetadata,
    ) -> Result<Resolution<Vec<ArtifactMetadata>>> {
        Ok(self.artifacts_matching(component, ArtifactType::Main))
    }

    fn resolve_artifacts_with_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
    ) -> Result<Resolution<Vec<ArtifactMetadata>>> {
        Ok(self.artifacts_matching(component, artifact_type))
    }

    fn resolve_artifact(
        &self,
        artifact: &ArtifactMetadata,
        origin: &SourceOrigin,
    ) -> Result<Resolution<PathBuf>> {
        if origin.source_id != self.source_id {
            return Err(SieveError::Source(
                self.source_id.clone(),
                format!(
                    "artifact {} was described by source '{}'",
                    artifact.id, origin.source_id
                ),
            ));
        }
        if let Some(file) = self.artifact_cache.get(&artifact.id) {
            trace!("[{}:{}] cache hit for {}", self.source_id, self.mode, artifact.id);
            return Ok(Resolution::Found(file));
        }
        let Some(module_id) = artifact.id.component().as_module() else {
            return Ok(Resolution::Missing);
        };
        let file = self
            .components
            .get(module_id)
            .and_then(|record| record.files.get(&artifact.id.file_name()))
            .cloned();
        if let Some(file) = &file {
            self.artifact_cache.insert(artifact.id.clone(), file.clone());
        }
        Ok(file.into())
    }

    fn estimate_metadata_fetching_cost(
        &self,
        id: &ModuleComponentIdentifier,
    ) -> MetadataFetchingCost {
        match (self.mode, self.components.contains_key(id)) {
            (AccessMode::Local, true) => MetadataFetchingCost::Fast,
            (AccessMode::Local, false) => MetadataFetchingCost::Cheap,
            (AccessMode::Remote, _) => MetadataFetchingCost::Expensive,
        }
    }
}

#[cfg(test)]
mod tests {
    use sieve_common::model::{ArtifactIdentifier, ModuleComponentSelector, ModuleIdentifier};

    use super::*;

    fn component(version: &str) -> ModuleComponentIdentifier {
        ModuleComponentIdentifier::new(ModuleIdentifier::new("org.example", "widgets"), version)
    }

    fn jar(version: &str) -> ArtifactMetadata {
        ArtifactMetadata {
            id: ArtifactIdentifier::new(component(version).into(), "widgets", "jar"),
            artifact_type: ArtifactType::Main,
        }
    }

    fn source() -> InMemorySource {
        InMemorySource::new("central", "Central")
            .with_local(
                ComponentRecord::new(ComponentMetadata::new(component("1.0")))
                    .with_file(jar("1.0"), "/cache/widgets-1.0.jar"),
            )
            .with_remote(ComponentRecord::new(ComponentMetadata::new(component("1.0"))))
            .with_remote(
                ComponentRecord::new(ComponentMetadata::new(component("2.0")))
                    .with_file(jar("2.0"), "/remote/widgets-2.0.jar"),
            )
    }

    fn listing() -> ModuleDependency {
        ModuleDependency::new(ModuleComponentSelector::new(
            ModuleIdentifier::new("org.example", "widgets"),
            "[1.0,)",
        ))
    }

    #[test]
    fn access_modes_see_their_own_components() {
        let source = source();
        assert_eq!(
            source.local_access().list_module_versions(&listing()).unwrap(),
            Resolution::Found(vec!["1.0".to_string()])
        );
        assert_eq!(
            source.remote_access().list_module_versions(&listing()).unwrap(),
            Resolution::Found(vec!["1.0".to_string(), "2.0".to_string()])
        );
    }

    #[test]
    fn unknown_component_is_missing_not_an_error() {
        let source = source();
        let result = source
            .local_access()
            .resolve_component_metadata(&component("9.9"), &ComponentOverrideMetadata::default())
            .unwrap();
        assert!(result.is_missing());
    }

    #[test]
    fn override_metadata_is_applied() {
        let source = source();
        let request = ComponentOverrideMetadata {
            changing: true,
            artifacts: vec!["other".to_string()],
        };
        let metadata = source
            .local_access()
            .resolve_component_metadata(&component("1.0"), &request)
            .unwrap()
            .found()
            .unwrap();
        assert!(metadata.changing);
        assert!(metadata.artifacts.is_empty());
        assert_eq!(
            metadata.origin,
            Some(SourceOrigin {
                source_id: "central".into()
            })
        );
    }

    #[test]
    fn resolved_artifacts_populate_the_shared_cache() {
        let source = source();
        let origin = SourceOrigin {
            source_id: "central".into(),
        };
        let file = source
            .remote_access()
            .resolve_artifact(&jar("2.0"), &origin)
            .unwrap();
        assert_eq!(file, Resolution::Found(PathBuf::from("/remote/widgets-2.0.jar")));
        assert_eq!(source.artifact_cache().len(), 1);

        // Local access has no record of 2.0 but shares the cache.
        let cached = source.local_access().resolve_artifact(&jar("2.0"), &origin).unwrap();
        assert!(cached.is_found());
    }

    #[test]
    fn artifact_from_foreign_origin_fails() {
        let source = source();
        let err = source
            .local_access()
            .resolve_artifact(
                &jar("1.0"),
                &SourceOrigin {
                    source_id: "elsewhere".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, SieveError::Source(id, _) if id == "central"));
    }

    #[test]
    fn artifacts_are_filtered_by_type() {
        let source = source();
        let metadata = ComponentMetadata::new(component("1.0"));
        let main = source.local_access().resolve_artifacts(&metadata).unwrap();
        assert_eq!(main, Resolution::Found(vec![jar("1.0")]));
        let docs = source
            .local_access()
            .resolve_artifacts_with_type(&metadata, ArtifactType::Docs)
            .unwrap();
        assert_eq!(docs, Resolution::Found(vec![]));

        let project = ComponentMetadata::new(component("3.0"));
        assert!(source.local_access().resolve_artifacts(&project).unwrap().is_missing());
    }

    #[test]
    fn local_cost_is_fast_only_for_known_components() {
        let source = source();
        let local = source.local_access();
        assert_eq!(local.estimate_metadata_fetching_cost(&component("1.0")), MetadataFetchingCost::Fast);
        assert_eq!(local.estimate_metadata_fetching_cost(&component("2.0")), MetadataFetchingCost::Cheap);
        assert_eq!(
            source.remote_access().estimate_metadata_fetching_cost(&component("1.0")),
            MetadataFetchingCost::Expensive
        );
    }

    #[test]
    fn snapshot_reads_from_json() {
        let snapshot: SourceSnapshot = serde_json::from_str(
            r#"{
                "id": "internal",
                "name": "Internal",
                "remote": [
                    { "metadata": { "id": { "group": "g", "name": "a", "version": "1.0" } } }
                ]
            }"#,
        )
        .unwrap();
        let source = InMemorySource::from_snapshot(snapshot);
        assert_eq!(source.id(), "internal");
        let id: ModuleComponentIdentifier = "g:a:1.0".parse().unwrap();
        assert!(source
            .remote_access()
            .resolve_component_metadata(&id, &ComponentOverrideMetadata::default())
            .unwrap()
            .is_found());
    }
}
