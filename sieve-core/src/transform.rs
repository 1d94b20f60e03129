// sieve-core/src/transform.rs
//! Dependency files of a single artifact, as handed to an artifact transform.
use std::collections::HashSet;
use std::path::PathBuf;

use sieve_common::error::Result;
use sieve_common::model::{ArtifactIdentifier, AttributeSet, ComponentIdentifier};
use tracing::{debug, trace};

use crate::artifact::{ArtifactViewProvider, ArtifactViewRequest};
use crate::graph::{DependencyEdge, ResolvedGraphView};

/// Every component reachable from `component` through resolved edges.
///
/// Unresolved edges are skipped. Each component appears once no matter how
/// many paths lead to it, and `component` itself is never part of its own
/// closure, even when a cycle leads back to it. A component that is not in
/// the graph has an empty closure.
pub fn dependency_closure<G>(graph: &G, component: &ComponentIdentifier) -> HashSet<ComponentIdentifier>
where
    G: ResolvedGraphView + ?Sized,
{
    let mut closure: HashSet<ComponentIdentifier> = HashSet::new();
    let mut pending: Vec<&DependencyEdge> = graph
        .all_components()
        .filter(|node| node.id() == component)
        .flat_map(|node| node.dependencies())
        .collect();

    if pending.is_empty() {
        trace!("{} has no dependencies in the resolved graph", component);
    }

    while let Some(edge) = pending.pop() {
        let Some(selected) = edge.selected() else {
            trace!("Skipping unresolved dependency {:?}", edge);
            continue;
        };
        if selected == component || closure.contains(selected) {
            continue;
        }
        closure.insert(selected.clone());
        match graph.component(selected) {
            Some(node) => pending.extend(node.dependencies()),
            None => trace!("{} is selected but has no node in the graph", selected),
        }
    }
    closure
}

/// The dependencies of one artifact within a resolution result.
pub struct TransformDependencies<'a> {
    artifact: &'a ArtifactIdentifier,
    graph: &'a dyn ResolvedGraphView,
    views: &'a dyn ArtifactViewProvider,
    attributes: &'a AttributeSet,
}

impl<'a> TransformDependencies<'a> {
    pub fn new(
        artifact: &'a ArtifactIdentifier,
        graph: &'a dyn ResolvedGraphView,
        views: &'a dyn ArtifactViewProvider,
        attributes: &'a AttributeSet,
    ) -> Self {
        Self {
            artifact,
            graph,
            views,
            attributes,
        }
    }

    pub fn artifact(&self) -> &ArtifactIdentifier {
        self.artifact
    }

    /// Components whose artifacts make up [`Self::files`].
    pub fn dependency_ids(&self) -> HashSet<ComponentIdentifier> {
        dependency_closure(self.graph, self.artifact.component())
    }

    /// Files of all direct and transitive dependencies of the artifact's
    /// component. Recomputed on every call.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let dependencies = self.dependency_ids();
        debug!(
            "{} has {} transform dependencies",
            self.artifact,
            dependencies.len()
        );
        let in_closure = |id: &ComponentIdentifier| dependencies.contains(id);
        let mut request = ArtifactViewRequest::new(&in_closure);
        if !self.attributes.is_empty() {
            request = request.with_attributes(self.attributes);
        }
        self.views.artifact_files(&request)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use sieve_common::error::SieveError;

    use super::*;
    use crate::artifact::{ResolvedArtifact, ResolvedArtifactSet};
    use crate::graph::{ResolvedComponent, ResolvedGraph};

    fn id(name: &str) -> ComponentIdentifier {
        ComponentIdentifier::module("g", name, "1.0")
    }

    fn node(name: &str, deps: &[&str]) -> ResolvedComponent {
        deps.iter()
            .fold(ResolvedComponent::new(id(name)), |node, dep| node.depends_on(id(dep)))
    }

    fn ids(names: &[&str]) -> HashSet<ComponentIdentifier> {
        names.iter().map(|n| id(n)).collect()
    }

    fn jar(name: &str) -> ResolvedArtifact {
        ResolvedArtifact::new(
            ArtifactIdentifier::new(id(name), name, "jar"),
            format!("/files/{name}.jar"),
        )
    }

    /// Records what the extractor asked for.
    #[derive(Default)]
    struct RecordingViews {
        attributes: RefCell<Option<Option<AttributeSet>>>,
    }

    impl ArtifactViewProvider for RecordingViews {
        fn artifact_files(&self, request: &ArtifactViewRequest<'_>) -> Result<Vec<PathBuf>> {
            *self.attributes.borrow_mut() = Some(request.attributes().cloned());
            Ok(Vec::new())
        }
    }

    struct FailingViews;

    impl ArtifactViewProvider for FailingViews {
        fn artifact_files(&self, _request: &ArtifactViewRequest<'_>) -> Result<Vec<PathBuf>> {
            Err(SieveError::ArtifactView("download interrupted".into()))
        }
    }

    #[test]
    fn diamond_dependencies_are_counted_once() {
        let graph = ResolvedGraph::from_components([
            node("a", &["b", "c"]),
            node("b", &["d"]),
            node("c", &["d"]),
            node("d", &[]),
        ]);
        assert_eq!(dependency_closure(&graph, &id("a")), ids(&["b", "c", "d"]));

        let artifacts = ResolvedArtifactSet::default()
            .with_artifact(jar("a"))
            .with_artifact(jar("b"))
            .with_artifact(jar("c"))
            .with_artifact(jar("d"));
        let artifact = ArtifactIdentifier::new(id("a"), "a", "jar");
        let attributes = AttributeSet::empty();
        let mut files = TransformDependencies::new(&artifact, &graph, &artifacts, &attributes)
            .files()
            .unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/files/b.jar"),
                PathBuf::from("/files/c.jar"),
                PathBuf::from("/files/d.jar"),
            ]
        );
    }

    #[test]
    fn cycles_terminate() {
        let two = ResolvedGraph::from_components([node("a", &["b"]), node("b", &["a"])]);
        assert_eq!(dependency_closure(&two, &id("a")), ids(&["b"]));

        let three = ResolvedGraph::from_components([
            node("a", &["b"]),
            node("b", &["c"]),
            node("c", &["a"]),
        ]);
        assert_eq!(dependency_closure(&three, &id("a")), ids(&["b", "c"]));
        assert_eq!(dependency_closure(&three, &id("b")), ids(&["a", "c"]));
    }

    #[test]
    fn unresolved_edges_are_ignored() {
        let graph = ResolvedGraph::from_components([
            node("a", &["b"]),
            node("b", &[]).fails_on("g:x:1.0", "not found in any source"),
        ]);
        assert_eq!(dependency_closure(&graph, &id("a")), ids(&["b"]));
    }

    #[test]
    fn component_missing_from_graph_has_no_dependencies() {
        let graph = ResolvedGraph::from_components([node("a", &["b"]), node("b", &[])]);
        assert!(dependency_closure(&graph, &id("zzz")).is_empty());

        let artifact = ArtifactIdentifier::new(id("zzz"), "zzz", "jar");
        let artifacts = ResolvedArtifactSet::default()
            .with_artifact(jar("a"))
            .with_artifact(jar("b"));
        let attributes = AttributeSet::empty();
        let files = TransformDependencies::new(&artifact, &graph, &artifacts, &attributes)
            .files()
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn selected_component_without_a_node_is_still_included() {
        let graph = ResolvedGraph::from_components([node("a", &["b"])]);
        assert_eq!(dependency_closure(&graph, &id("a")), ids(&["b"]));
    }

    #[test]
    fn owner_is_matched_by_identity_not_by_instance() {
        let graph = ResolvedGraph::from_components([node("a", &["b"]), node("b", &[])]);
        let owner: ComponentIdentifier = "g:a:1.0"
            .parse::<sieve_common::model::ModuleComponentIdentifier>()
            .unwrap()
            .into();
        assert_eq!(dependency_closure(&graph, &owner), ids(&["b"]));
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let names: Vec<String> = (0..20_000).map(|i| format!("m{i}")).collect();
        let graph = ResolvedGraph::from_components(names.iter().enumerate().map(|(i, name)| {
            let node = ResolvedComponent::new(id(name));
            match names.get(i + 1) {
                Some(next) => node.depends_on(id(next)),
                None => node,
            }
        }));
        assert_eq!(dependency_closure(&graph, &id("m0")).len(), names.len() - 1);
    }

    #[test]
    fn empty_attribute_set_keeps_view_defaults() {
        let graph = ResolvedGraph::from_components([node("a", &["b"]), node("b", &[])]);
        let artifact = ArtifactIdentifier::new(id("a"), "a", "jar");

        let views = RecordingViews::default();
        let empty = AttributeSet::empty();
        TransformDependencies::new(&artifact, &graph, &views, &empty)
            .files()
            .unwrap();
        assert_eq!(*views.attributes.borrow(), Some(None));

        let forced = AttributeSet::empty().with("usage", "api");
        TransformDependencies::new(&artifact, &graph, &views, &forced)
            .files()
            .unwrap();
        assert_eq!(*views.attributes.borrow(), Some(Some(forced)));
    }

    #[test]
    fn attribute_overrides_select_other_variants() {
        let graph = ResolvedGraph::from_components([node("a", &["b"]), node("b", &[])]);
        let artifacts = ResolvedArtifactSet::new(AttributeSet::empty().with("usage", "runtime"))
            .with_artifact(jar("b").with_attributes(AttributeSet::empty().with("usage", "runtime")))
            .with_artifact(
                ResolvedArtifact::new(
                    ArtifactIdentifier::new(id("b"), "b", "jar").with_classifier("api"),
                    "/files/b-api.jar",
                )
                .with_attributes(AttributeSet::empty().with("usage", "api")),
            );
        let artifact = ArtifactIdentifier::new(id("a"), "a", "jar");

        let defaults = AttributeSet::empty();
        assert_eq!(
            TransformDependencies::new(&artifact, &graph, &artifacts, &defaults)
                .files()
                .unwrap(),
            vec![PathBuf::from("/files/b.jar")]
        );
        let api = AttributeSet::empty().with("usage", "api");
        assert_eq!(
            TransformDependencies::new(&artifact, &graph, &artifacts, &api)
                .files()
                .unwrap(),
            vec![PathBuf::from("/files/b-api.jar")]
        );
    }

    #[test]
    fn view_failures_propagate_unchanged() {
        let graph = ResolvedGraph::from_components([node("a", &["b"]), node("b", &[])]);
        let artifact = ArtifactIdentifier::new(id("a"), "a", "jar");
        let attributes = AttributeSet::empty();
        let err = TransformDependencies::new(&artifact, &graph, &FailingViews, &attributes)
            .files()
            .unwrap_err();
        assert!(matches!(err, SieveError::ArtifactView(msg) if msg == "download interrupted"));
    }
}
