// sieve-common/src/lib.rs
pub mod config;
pub mod error;
pub mod model;
pub mod rules;

// Re-export key types
pub use config::Config;
pub use error::{Result, SieveError};
pub use model::{
    ArtifactIdentifier, AttributeSet, AttributeValue, ComponentIdentifier,
    ModuleComponentIdentifier, ModuleIdentifier,
};
pub use rules::{ContentRules, ModuleMatcher};
