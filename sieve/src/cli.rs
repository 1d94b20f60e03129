// sieve/src/cli.rs
use std::path::Path;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use sieve_common::config::Config;
use sieve_common::error::Result;
use sieve_common::rules::ContentRules;
use sieve_core::filter::{ContentFilter, FilterPolicy};
use tracing::debug;

pub mod check;
pub mod closure;
pub mod versions;

pub use crate::cli::check::Check;
pub use crate::cli::closure::Closure;
pub use crate::cli::versions::Versions;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "sieve", bin_name = "sieve")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Closure(Closure),
    Check(Check),
    Versions(Versions),
}

impl Command {
    pub fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Closure(command) => command.run(config),
            Self::Check(command) => command.run(config),
            Self::Versions(command) => command.run(config),
        }
    }
}

/// Content rules from `--rules`, else from the configured rules file. `None`
/// when neither is given.
pub fn load_policy(rules: Option<&Path>, config: &Config) -> Result<Option<Arc<dyn FilterPolicy>>> {
    let rules = match rules {
        Some(path) => Some(ContentRules::from_path(path)?),
        None => config.load_content_rules()?,
    };
    let Some(rules) = rules else {
        debug!("No content rules configured; sources are unfiltered");
        return Ok(None);
    };
    let filter: Arc<dyn FilterPolicy> = Arc::new(ContentFilter::compile(&rules)?);
    Ok(Some(filter))
}
