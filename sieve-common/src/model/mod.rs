// sieve-common/src/model/mod.rs
pub mod attribute;
pub mod identifier;

// Re-export
pub use attribute::{AttributeSet, AttributeValue};
pub use identifier::{
    ArtifactIdentifier, ComponentIdentifier, ModuleComponentIdentifier, ModuleComponentSelector,
    ModuleDependency, ModuleIdentifier,
};
