// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! CLI command definitions and handlers
//!
//! Without a subcommand the interactive wizard runs.

pub mod graph;
pub mod templates;
pub mod validate;
pub mod wizard;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::WizardConfig;
use crate::store::WorkflowStore;

/// Interactive GitHub Actions workflow wizard
#[derive(Parser, Debug)]
#[clap(
    name = "gha-wizard",
    version,
    about = "Create and extend GitHub Actions build, test and deploy workflows",
    long_about = None,
    after_help = "Examples:\n\
        gha-wizard                          Run the wizard in the current repository\n\
        gha-wizard graph                    Show the job order of the default workflow\n\
        gha-wizard validate -f ci.yml       Check a workflow file\n\
        gha-wizard templates                List available templates\n\n\
        See 'gha-wizard <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    #[clap(flatten)]
    pub overrides: Overrides,
}

/// Settings that take precedence over .gha-wizard.yaml
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Runner label for new jobs
    #[clap(long, global = true, env = "GHA_WIZARD_RUNNER", value_name = "LABEL")]
    pub runner: Option<String>,

    /// AWS region used by deploy jobs
    #[clap(long, global = true, env = "GHA_WIZARD_AWS_REGION", value_name = "REGION")]
    pub aws_region: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the jobs of a workflow as a graph
    Graph {
        /// Workflow file (name inside the workflows directory, or a path)
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Output format
        #[clap(long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },

    /// Check a workflow for structural problems
    Validate {
        /// Workflow file (name inside the workflows directory, or a path)
        #[clap(short, long)]
        file: Option<PathBuf>,
    },

    /// List available templates
    Templates,
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Load the configuration of the repository at `root` with overrides applied
pub(crate) fn load_config(root: &Path, overrides: &Overrides) -> miette::Result<WizardConfig> {
    Ok(WizardConfig::load(root)?
        .with_overrides(overrides.runner.clone(), overrides.aws_region.clone()))
}

/// Resolve a `--file` argument: an existing path, else a name in the workflows directory
pub(crate) fn resolve_workflow(
    store: &WorkflowStore,
    config: &WizardConfig,
    file: Option<PathBuf>,
) -> PathBuf {
    match file {
        Some(path) if path.exists() => path,
        Some(name) => store.workflows_dir().join(name),
        None => store.workflow_path(&config.default_workflow_file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_runs_wizard() {
        let cli = Cli::try_parse_from(["gha-wizard"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_graph_arguments() {
        let cli = Cli::try_parse_from(["gha-wizard", "graph", "-f", "ci.yml", "--format", "mermaid"])
            .unwrap();
        match cli.command {
            Some(Commands::Graph { file, format }) => {
                assert_eq!(file, Some(PathBuf::from("ci.yml")));
                assert_eq!(format, GraphFormat::Mermaid);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["gha-wizard", "graph", "--format", "svg"]).is_err());
    }

    #[test]
    fn test_resolve_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let config = WizardConfig::default();
        let store = WorkflowStore::from_config(dir.path(), &config);

        assert_eq!(
            resolve_workflow(&store, &config, None),
            dir.path().join(".github/workflows/ci_workflow.yml")
        );
        assert_eq!(
            resolve_workflow(&store, &config, Some(PathBuf::from("release.yml"))),
            dir.path().join(".github/workflows/release.yml")
        );
    }
}
