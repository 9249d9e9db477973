// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Workflow persistence
//!
//! Loads a workflow file into a [`Document`] and writes it back behind a
//! provenance comment. Merging happens at the document level: the file is
//! always rewritten as a whole, in the key order it was read with.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::WizardConfig;
use crate::errors::{WizardError, WizardResult};
use crate::workflow::{Document, Layout};

/// Comment written at the top of every generated file
pub const PROVENANCE_HEADER: &str =
    "# Generated initially using gha-wizard. Please customize it as necessary.\n\n";

/// Reads and writes workflow files under one workflows directory
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    workflows_dir: PathBuf,
    runner: String,
    legacy_seed_job: bool,
}

impl WorkflowStore {
    /// Create a store rooted at `workflows_dir`
    pub fn new(workflows_dir: impl Into<PathBuf>) -> Self {
        Self {
            workflows_dir: workflows_dir.into(),
            runner: crate::workflow::DEFAULT_RUNNER.to_string(),
            legacy_seed_job: true,
        }
    }

    /// Create a store for the repository at `root` following `config`
    pub fn from_config(root: &Path, config: &WizardConfig) -> Self {
        Self {
            workflows_dir: root.join(&config.workflows_dir),
            runner: config.runner.clone(),
            legacy_seed_job: config.legacy_seed_job,
        }
    }

    /// Start missing files from an empty document instead of the legacy checkout job
    pub fn without_legacy_seed(mut self) -> Self {
        self.legacy_seed_job = false;
        self
    }

    pub fn workflows_dir(&self) -> &Path {
        &self.workflows_dir
    }

    /// Path of a workflow file inside the workflows directory
    pub fn workflow_path(&self, file_name: &str) -> PathBuf {
        self.workflows_dir.join(file_name)
    }

    /// Load a workflow, or start a new one if the file does not exist
    pub fn load(&self, path: &Path) -> WizardResult<Document> {
        if !path.exists() {
            debug!(path = %path.display(), "workflow file absent, starting a new document");
            return Ok(if self.legacy_seed_job {
                Document::with_legacy_job(&self.runner)
            } else {
                Document::new()
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| WizardError::FileRead {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let doc = Self::parse(&content)?;
        debug!(path = %path.display(), jobs = doc.job_count(), "loaded workflow");
        Ok(doc)
    }

    /// Parse workflow YAML, ignoring the provenance header
    pub fn parse(content: &str) -> WizardResult<Document> {
        let body = content.strip_prefix(PROVENANCE_HEADER).unwrap_or(content);
        if body.trim().is_empty() {
            return Ok(Document::new());
        }
        let mut document: Document = serde_yaml::from_str(body)?;
        document.set_layout(Layout::capture(serde_yaml::from_str(body)?));
        Ok(document)
    }

    /// Render a document exactly as [`WorkflowStore::save`] writes it
    pub fn render(document: &Document) -> WizardResult<String> {
        let value = document.layout().apply(serde_yaml::to_value(document)?);
        let yaml = serde_yaml::to_string(&value)?;
        Ok(format!("{}{}", PROVENANCE_HEADER, yaml))
    }

    /// Write a document, replacing the file and creating parent directories
    pub fn save(&self, document: &Document, path: &Path) -> WizardResult<PathBuf> {
        let content = Self::render(document)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WizardError::FileWrite {
                path: parent.to_path_buf(),
                error: e.to_string(),
            })?;
        }

        std::fs::write(path, content).map_err(|e| WizardError::FileWrite {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        info!(path = %path.display(), jobs = document.job_count(), "workflow written");
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{checkout_step, Trigger, DEFAULT_RUNNER, LEGACY_JOB_ID};

    #[test]
    fn test_missing_file_yields_legacy_job() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowStore::new(dir.path());
        let doc = store.load(&store.workflow_path("ci.yml")).unwrap();
        assert_eq!(doc.job_ids(), vec![LEGACY_JOB_ID]);

        let doc = store
            .clone()
            .without_legacy_seed()
            .load(&store.workflow_path("ci.yml"))
            .unwrap();
        assert_eq!(doc.job_count(), 0);
    }

    #[test]
    fn test_save_creates_directories_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowStore::new(dir.path().join(".github/workflows"));
        let mut doc = Document::new();
        doc.add_trigger(Trigger::push("main"));
        doc.ensure_job("build", DEFAULT_RUNNER).steps.push(checkout_step());

        let path = store.save(&doc, &store.workflow_path("ci.yml")).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(PROVENANCE_HEADER));
        assert!(content.contains("runs-on: ubuntu-latest"));
        assert!(content.contains("uses: actions/checkout@v4"));
    }

    #[test]
    fn test_unchanged_document_saves_identically() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowStore::new(dir.path());
        let path = store.workflow_path("release.yml");

        let body = r#"on:
  push: null
  release:
    types:
    - published
  workflow_dispatch: {}
concurrency:
  group: release
  cancel-in-progress: true
permissions:
  contents: read
jobs:
  lint:
    runs-on:
    - self-hosted
    - linux
    steps:
    - run: make lint
  build:
    runs-on: ubuntu-latest
    needs: lint
    environment: staging
    steps:
    - uses: actions/checkout@v4
      name: Checkout
    - run: make
      env:
        CI: 'true'
    timeout-minutes: 15
env:
  RUST_LOG: info
"#;
        std::fs::write(&path, format!("{}{}", PROVENANCE_HEADER, body)).unwrap();

        let doc = store.load(&path).unwrap();
        assert!(doc.name.is_none());
        assert!(doc.run_name.is_none());
        store.save(&doc, &path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved.strip_prefix(PROVENANCE_HEADER), Some(body));
    }

    #[test]
    fn test_new_keys_keep_loaded_order() {
        let mut doc = WorkflowStore::parse(
            "name: CI\non: push\nconcurrency: ci\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps: []\n",
        )
        .unwrap();
        doc.ensure_job("test", DEFAULT_RUNNER);
        doc.set_job_field("test", crate::workflow::JobField::Needs(vec!["build".into()]))
            .unwrap();

        let out = WorkflowStore::render(&doc).unwrap();
        let body = out.strip_prefix(PROVENANCE_HEADER).unwrap();
        assert!(body.starts_with("name: CI\non: push\nconcurrency: ci\njobs:\n"), "{body}");
        assert!(body.contains("  test:\n    needs: build\n    runs-on: ubuntu-latest\n"), "{body}");
    }
}
