// sieve-core/src/filter/mod.rs
//! Per-consumer visibility filtering over a module source.
//!
//! [`FilteredModuleSource`] presents the full [`ModuleSource`] surface of the
//! source it wraps. Version listings, metadata lookups and cost estimates
//! first ask a [`FilterPolicy`] whether the module is visible to the
//! consumer; an excluded module looks exactly like one the source does not
//! have. Artifact operations are never filtered since component visibility
//! was already settled when the component's metadata was resolved.
use std::path::PathBuf;
use std::sync::Arc;

use sieve_common::error::Result;
use sieve_common::model::{
    AttributeSet, ModuleComponentIdentifier, ModuleDependency, ModuleIdentifier,
};
use tracing::{debug, trace};

use crate::source::{
    AccessMode, ArtifactCache, ArtifactMetadata, ArtifactType, ComponentMetadata,
    ComponentOverrideMetadata, MetadataFetchingCost, MetadataSupplier, ModuleSource, Resolution,
    SourceAccess, SourceOrigin,
};

pub mod content;

pub use content::ContentFilter;

/// What a policy gets to look at for one source access.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityRequest<'a> {
    module: &'a ModuleIdentifier,
    component: Option<&'a ModuleComponentIdentifier>,
    consumer_name: &'a str,
    consumer_attributes: &'a AttributeSet,
}

impl<'a> VisibilityRequest<'a> {
    pub fn new(
        module: &'a ModuleIdentifier,
        component: Option<&'a ModuleComponentIdentifier>,
        consumer_name: &'a str,
        consumer_attributes: &'a AttributeSet,
    ) -> Self {
        Self {
            module,
            component,
            consumer_name,
            consumer_attributes,
        }
    }

    pub fn module(&self) -> &'a ModuleIdentifier {
        self.module
    }

    /// The component being looked up. `None` for version listings.
    pub fn component(&self) -> Option<&'a ModuleComponentIdentifier> {
        self.component
    }

    pub fn is_version_listing(&self) -> bool {
        self.component.is_none()
    }

    /// Label of the configuration that issued the request.
    pub fn consumer_name(&self) -> &'a str {
        self.consumer_name
    }

    pub fn consumer_attributes(&self) -> &'a AttributeSet {
        self.consumer_attributes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Visible,
    Excluded,
}

impl Visibility {
    pub fn is_excluded(self) -> bool {
        self == Self::Excluded
    }
}

/// Decides whether a module is visible through a source.
///
/// A single policy is shared by every resolution thread using the source, so
/// implementations must not keep unsynchronized state.
pub trait FilterPolicy: Send + Sync {
    fn decide(&self, request: &VisibilityRequest<'_>) -> Visibility;
}

impl<F> FilterPolicy for F
where
    F: Fn(&VisibilityRequest<'_>) -> Visibility + Send + Sync,
{
    fn decide(&self, request: &VisibilityRequest<'_>) -> Visibility {
        self(request)
    }
}

struct FilterContext {
    delegate: Arc<dyn ModuleSource>,
    policy: Arc<dyn FilterPolicy>,
    consumer_name: String,
    consumer_attributes: AttributeSet,
}

pub struct FilteredModuleSource {
    context: Arc<FilterContext>,
    local: FilteringAccess,
    remote: FilteringAccess,
}

impl FilteredModuleSource {
    /// Wraps `source` so that `policy` is consulted on every lookup.
    ///
    /// Without a policy the original `source` is returned as is.
    pub fn wrap(
        source: Arc<dyn ModuleSource>,
        policy: Option<Arc<dyn FilterPolicy>>,
        consumer_name: impl Into<String>,
        consumer_attributes: AttributeSet,
    ) -> Arc<dyn ModuleSource> {
        let Some(policy) = policy else {
            return source;
        };
        let consumer_name = consumer_name.into();
        debug!(
            "Filtering source '{}' for consumer '{}'",
            source.name(),
            consumer_name
        );
        let context = Arc::new(FilterContext {
            delegate: source,
            policy,
            consumer_name,
            consumer_attributes,
        });
        Arc::new(Self {
            local: FilteringAccess::new(Arc::clone(&context), AccessMode::Local),
            remote: FilteringAccess::new(Arc::clone(&context), AccessMode::Remote),
            context,
        })
    }

    pub fn policy(&self) -> &Arc<dyn FilterPolicy> {
        &self.context.policy
    }

    pub fn consumer_name(&self) -> &str {
        &self.context.consumer_name
    }

    pub fn consumer_attributes(&self) -> &AttributeSet {
        &self.context.consumer_attributes
    }

    pub fn delegate(&self) -> &Arc<dyn ModuleSource> {
        &self.context.delegate
    }
}

impl ModuleSource for FilteredModuleSource {
    fn id(&self) -> &str {
        self.context.delegate.id()
    }

    fn name(&self) -> &str {
        self.context.delegate.name()
    }

    fn access(&self, mode: AccessMode) -> &dyn SourceAccess {
        match mode {
            AccessMode::Local => &self.local,
            AccessMode::Remote => &self.remote,
        }
    }

    fn artifact_cache(&self) -> Arc<ArtifactCache> {
        self.context.delegate.artifact_cache()
    }

    fn metadata_supplier(&self) -> Option<Arc<dyn MetadataSupplier>> {
        self.context.delegate.metadata_supplier()
    }
}

struct FilteringAccess {
    context: Arc<FilterContext>,
    mode: AccessMode,
}

impl FilteringAccess {
    fn new(context: Arc<FilterContext>, mode: AccessMode) -> Self {
        Self { context, mode }
    }

    fn delegate(&self) -> &dyn SourceAccess {
        self.context.delegate.access(self.mode)
    }

    /// Runs `present` when the policy lets the module through, `absent`
    /// otherwise. The policy is asked exactly once per call.
    fn when_module_present<T>(
        &self,
        module: &ModuleIdentifier,
        component: Option<&ModuleComponentIdentifier>,
        present: impl FnOnce() -> T,
        absent: impl FnOnce() -> T,
    ) -> T {
        let request = VisibilityRequest::new(
            module,
            component,
            &self.context.consumer_name,
            &self.context.consumer_attributes,
        );
        match self.context.policy.decide(&request) {
            Visibility::Visible => present(),
            Visibility::Excluded => {
                debug!(
                    "[{}:{}] {} hidden from consumer '{}'",
                    self.context.delegate.name(),
                    self.mode,
                    component.map_or_else(|| module.to_string(), ToString::to_string),
                    self.context.consumer_name
                );
                absent()
            }
        }
    }
}

impl SourceAccess for FilteringAccess {
    fn list_module_versions(&self, dependency: &ModuleDependency) -> Result<Resolution<Vec<String>>> {
        self.when_module_present(
            dependency.selector().module_identifier(),
            None,
            || self.delegate().list_module_versions(dependency),
            || Ok(Resolution::Found(Vec::new())),
        )
    }

    fn resolve_component_metadata(
        &self,
        id: &ModuleComponentIdentifier,
        request: &ComponentOverrideMetadata,
    ) -> Result<Resolution<ComponentMetadata>> {
        self.when_module_present(
            id.module(),
            Some(id),
            || self.delegate().resolve_component_metadata(id, request),
            || Ok(Resolution::Missing),
        )
    }

    fn resolve_artifacts(
        &self,
        component: &ComponentMetadata,
    ) -> Result<Resolution<Vec<ArtifactMetadata>>> {
        trace!("[{}] resolve_artifacts passes through for {}", self.mode, component.id);
        self.delegate().resolve_artifacts(component)
    }

    fn resolve_artifacts_with_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
    ) -> Result<Resolution<Vec<ArtifactMetadata>>> {
        self.delegate()
            .resolve_artifacts_with_type(component, artifact_type)
    }

    fn resolve_artifact(
        &self,
        artifact: &ArtifactMetadata,
        origin: &SourceOrigin,
    ) -> Result<Resolution<PathBuf>> {
        self.delegate().resolve_artifact(artifact, origin)
    }

    fn estimate_metadata_fetching_cost(
        &self,
        id: &ModuleComponentIdentifier,
    ) -> MetadataFetchingCost {
        self.when_module_present(
            id.module(),
            Some(id),
            || self.delegate().estimate_metadata_fetching_cost(id),
            || MetadataFetchingCost::Fast,
        )
    }
}
