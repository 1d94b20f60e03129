// sieve/src/cli/versions.rs
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use sieve_common::config::Config;
use sieve_common::error::Result;
use sieve_common::model::{
    AttributeSet, ModuleComponentSelector, ModuleDependency, ModuleIdentifier,
};
use sieve_core::filter::FilteredModuleSource;
use sieve_core::source::{AccessMode, InMemorySource, ModuleSource, Resolution, SourceAccess};
use tracing::debug;

use crate::cli::load_policy;

/// List the versions of a module a source shows to a consumer
#[derive(Args, Debug)]
pub struct Versions {
    /// Source snapshot (JSON)
    #[arg(long)]
    pub source: PathBuf,

    /// Module coordinate, group:name
    #[arg(long)]
    pub module: ModuleIdentifier,

    /// Content rules file (defaults to $SIEVE_RULES)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Consumer name (defaults to $SIEVE_CONSUMER)
    #[arg(long)]
    pub consumer: Option<String>,

    /// Consumer attributes as key=value,key2=value2
    #[arg(long)]
    pub attributes: Option<AttributeSet>,

    /// Only consult what the source has locally
    #[arg(long)]
    pub local: bool,
}

impl Versions {
    pub fn run(&self, config: &Config) -> Result<()> {
        let source: Arc<dyn ModuleSource> = Arc::new(InMemorySource::from_json_file(&self.source)?);
        let policy = load_policy(self.rules.as_deref(), config)?;
        let consumer = self
            .consumer
            .clone()
            .unwrap_or_else(|| config.consumer_name.clone());
        let attributes = self
            .attributes
            .clone()
            .unwrap_or_else(|| config.consumer_attributes.clone());
        let source = FilteredModuleSource::wrap(source, policy, consumer, attributes);

        let mode = if self.local {
            AccessMode::Local
        } else {
            AccessMode::Remote
        };
        debug!("Listing {} through {} access of '{}'", self.module, mode, source.name());
        let dependency = ModuleDependency::new(ModuleComponentSelector::new(self.module.clone(), "+"));
        let versions = match source.access(mode).list_module_versions(&dependency)? {
            Resolution::Found(versions) => versions,
            Resolution::Missing => Vec::new(),
        };

        if versions.is_empty() {
            println!("{}", format!("No versions of {} in {}", self.module, source.name()).yellow());
            return Ok(());
        }
        for version in &versions {
            println!("{}:{}", self.module, version.bold());
        }
        Ok(())
    }
}
