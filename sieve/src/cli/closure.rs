// sieve/src/cli/closure.rs
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use sieve_common::config::Config;
use sieve_common::error::Result;
use sieve_common::model::{ArtifactIdentifier, AttributeSet, ModuleComponentIdentifier};
use sieve_core::artifact::ResolvedArtifactSet;
use sieve_core::graph::ResolvedGraph;
use sieve_core::transform::TransformDependencies;

/// Print the dependency files of one artifact in a resolved graph
#[derive(Args, Debug)]
pub struct Closure {
    /// Resolved graph snapshot (JSON)
    #[arg(long)]
    pub graph: PathBuf,

    /// Resolved artifacts (JSON)
    #[arg(long)]
    pub artifacts: PathBuf,

    /// Component that produced the artifact, group:name:version
    #[arg(long)]
    pub component: ModuleComponentIdentifier,

    /// Artifact name (defaults to the module name)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, default_value = "jar")]
    pub extension: String,

    /// Attributes forced on the dependency view, key=value,key2=value2
    #[arg(long, default_value = "")]
    pub attributes: AttributeSet,

    /// Print component ids instead of files
    #[arg(long)]
    pub components: bool,
}

impl Closure {
    pub fn run(&self, _config: &Config) -> Result<()> {
        let graph = ResolvedGraph::from_json_file(&self.graph)?;
        let artifacts = ResolvedArtifactSet::from_json_file(&self.artifacts)?;
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| self.component.module().name().to_string());
        let artifact = ArtifactIdentifier::new(self.component.clone().into(), name, &self.extension);

        let dependencies = TransformDependencies::new(&artifact, &graph, &artifacts, &self.attributes);
        if self.components {
            let mut ids: Vec<String> = dependencies
                .dependency_ids()
                .iter()
                .map(ToString::to_string)
                .collect();
            ids.sort();
            print_all(&artifact, ids);
        } else {
            let mut files: Vec<String> = dependencies
                .files()?
                .iter()
                .map(|f| f.display().to_string())
                .collect();
            files.sort();
            print_all(&artifact, files);
        }
        Ok(())
    }
}

fn print_all(artifact: &ArtifactIdentifier, lines: Vec<String>) {
    if lines.is_empty() {
        println!("{}", format!("{artifact} has no dependencies").yellow());
        return;
    }
    let count = lines.len();
    for line in lines {
        println!("{line}");
    }
    println!("{}", format!("{count} dependencies of {artifact}").bold());
}
