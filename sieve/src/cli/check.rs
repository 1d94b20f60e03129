// sieve/src/cli/check.rs
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use sieve_common::config::Config;
use sieve_common::error::Result;
use sieve_common::model::{AttributeSet, ModuleComponentIdentifier, ModuleIdentifier};
use sieve_core::filter::{FilterPolicy, Visibility, VisibilityRequest};

use crate::cli::load_policy;

/// Show whether content rules let a module through to a consumer
#[derive(Args, Debug)]
pub struct Check {
    /// Module coordinate, group:name
    #[arg(long)]
    pub module: ModuleIdentifier,

    /// Check one version instead of the version listing
    #[arg(long, value_name = "VERSION")]
    pub at: Option<String>,

    /// Content rules file (defaults to $SIEVE_RULES)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Consumer name (defaults to $SIEVE_CONSUMER)
    #[arg(long)]
    pub consumer: Option<String>,

    /// Consumer attributes as key=value,key2=value2
    #[arg(long)]
    pub attributes: Option<AttributeSet>,
}

impl Check {
    pub fn run(&self, config: &Config) -> Result<()> {
        let consumer = self.consumer.as_deref().unwrap_or(&config.consumer_name);
        let attributes = self
            .attributes
            .as_ref()
            .unwrap_or(&config.consumer_attributes);
        let component = self
            .at
            .as_ref()
            .map(|v| ModuleComponentIdentifier::new(self.module.clone(), v.clone()));
        let subject = component
            .as_ref()
            .map_or_else(|| self.module.to_string(), ToString::to_string);

        let Some(policy) = load_policy(self.rules.as_deref(), config)? else {
            println!("{} {} (no content rules)", "visible".green().bold(), subject);
            return Ok(());
        };
        let request =
            VisibilityRequest::new(&self.module, component.as_ref(), consumer, attributes);
        match policy.decide(&request) {
            Visibility::Visible => println!(
                "{} {} for consumer '{}'",
                "visible".green().bold(),
                subject,
                consumer
            ),
            Visibility::Excluded => println!(
                "{} {} for consumer '{}'",
                "excluded".red().bold(),
                subject,
                consumer
            ),
        }
        Ok(())
    }
}
