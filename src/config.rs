// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Wizard configuration
//!
//! Optional per-repository settings read from `.gha-wizard.yaml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{WizardError, WizardResult};
use crate::workflow::DEFAULT_RUNNER;

/// Configuration file name, relative to the repository root
pub const CONFIG_FILE: &str = ".gha-wizard.yaml";

/// Wizard configuration from .gha-wizard.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Directory holding workflow files
    pub workflows_dir: PathBuf,

    /// Workflow file used when no template picks one
    pub default_workflow_file: String,

    /// Runner label for new jobs
    pub runner: String,

    /// Region passed to aws-actions/configure-aws-credentials
    pub aws_region: String,

    /// Name of the artifact passed from the build job to later jobs
    pub artifact_name: String,

    /// Seed new workflow files with the single checkout job older releases generated
    pub legacy_seed_job: bool,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            workflows_dir: PathBuf::from(".github/workflows"),
            default_workflow_file: "ci_workflow.yml".to_string(),
            runner: DEFAULT_RUNNER.to_string(),
            aws_region: "us-east-1".to_string(),
            artifact_name: "build-artifact".to_string(),
            legacy_seed_job: true,
        }
    }
}

impl WizardConfig {
    /// Load `.gha-wizard.yaml` from `root`, falling back to defaults when absent
    pub fn load(root: &Path) -> WizardResult<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| WizardError::FileRead {
            path: path.clone(),
            error: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> WizardResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Apply command-line / environment overrides
    pub fn with_overrides(mut self, runner: Option<String>, aws_region: Option<String>) -> Self {
        if let Some(runner) = runner {
            self.runner = runner;
        }
        if let Some(region) = aws_region {
            self.aws_region = region;
        }
        self
    }
}
