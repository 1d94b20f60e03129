// sieve-core/src/lib.rs

// Source abstraction and its filtering decorator
pub mod filter;
pub mod source;

// Post-resolution views
pub mod artifact;
pub mod graph;
pub mod transform;

// Re-export key types for easier use by the CLI crate
pub use artifact::{ArtifactViewProvider, ArtifactViewRequest, ResolvedArtifactSet};
pub use filter::{ContentFilter, FilterPolicy, FilteredModuleSource, Visibility, VisibilityRequest};
pub use graph::{DependencyEdge, ResolvedGraph, ResolvedGraphView};
pub use source::{InMemorySource, ModuleSource, Resolution, SourceAccess};
pub use transform::{dependency_closure, TransformDependencies};
