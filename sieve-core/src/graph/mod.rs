// sieve-core/src/graph/mod.rs
//! Read-only view over a finished resolution result.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sieve_common::error::Result;
use sieve_common::model::ComponentIdentifier;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyEdge {
    /// Conflict resolution picked `selected` for this dependency.
    Resolved { selected: ComponentIdentifier },
    /// The dependency could not be resolved. Never traversed.
    Unresolved { requested: String, reason: String },
}

impl DependencyEdge {
    pub fn resolved(selected: ComponentIdentifier) -> Self {
        Self::Resolved { selected }
    }

    pub fn unresolved(requested: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unresolved {
            requested: requested.into(),
            reason: reason.into(),
        }
    }

    pub fn selected(&self) -> Option<&ComponentIdentifier> {
        match self {
            Self::Resolved { selected } => Some(selected),
            Self::Unresolved { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedComponent {
    pub id: ComponentIdentifier,
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
}

impl ResolvedComponent {
    pub fn new(id: ComponentIdentifier) -> Self {
        Self {
            id,
            dependencies: Vec::new(),
        }
    }

    pub fn depends_on(mut self, selected: ComponentIdentifier) -> Self {
        self.dependencies.push(DependencyEdge::resolved(selected));
        self
    }

    pub fn fails_on(mut self, requested: impl Into<String>, reason: impl Into<String>) -> Self {
        self.dependencies
            .push(DependencyEdge::unresolved(requested, reason));
        self
    }

    pub fn id(&self) -> &ComponentIdentifier {
        &self.id
    }

    pub fn dependencies(&self) -> &[DependencyEdge] {
        &self.dependencies
    }
}

/// A finished dependency graph. Implementations must not change while a
/// view is being read.
pub trait ResolvedGraphView {
    fn all_components(&self) -> Box<dyn Iterator<Item = &ResolvedComponent> + '_>;

    fn component(&self, id: &ComponentIdentifier) -> Option<&ResolvedComponent> {
        self.all_components().find(|c| c.id() == id)
    }
}

/// An in-memory [`ResolvedGraphView`], loadable from a JSON snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "GraphDocument", into = "GraphDocument")]
pub struct ResolvedGraph {
    components: Vec<ResolvedComponent>,
    index: HashMap<ComponentIdentifier, usize>,
}

#[derive(Serialize, Deserialize)]
struct GraphDocument {
    components: Vec<ResolvedComponent>,
}

impl From<GraphDocument> for ResolvedGraph {
    fn from(document: GraphDocument) -> Self {
        ResolvedGraph::from_components(document.components)
    }
}

impl From<ResolvedGraph> for GraphDocument {
    fn from(graph: ResolvedGraph) -> Self {
        GraphDocument {
            components: graph.components,
        }
    }
}

impl ResolvedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_components(components: impl IntoIterator<Item = ResolvedComponent>) -> Self {
        components
            .into_iter()
            .fold(Self::new(), |graph, component| graph.with_component(component))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        debug!("Loading resolved graph from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let graph: ResolvedGraph = serde_json::from_str(&raw)?;
        debug!("Loaded {} components", graph.len());
        Ok(graph)
    }

    /// Adds a component. The first component recorded for an id is the one
    /// returned by [`ResolvedGraphView::component`].
    pub fn with_component(mut self, component: ResolvedComponent) -> Self {
        self.index
            .entry(component.id.clone())
            .or_insert(self.components.len());
        self.components.push(component);
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl ResolvedGraphView for ResolvedGraph {
    fn all_components(&self) -> Box<dyn Iterator<Item = &ResolvedComponent> + '_> {
        Box::new(self.components.iter())
    }

    fn component(&self, id: &ComponentIdentifier) -> Option<&ResolvedComponent> {
        self.index.get(id).map(|&i| &self.components[i])
    }
}
