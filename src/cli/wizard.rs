// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Wizard command - interactively create or extend a workflow

use colored::Colorize;
use miette::Result;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use super::{load_config, Overrides};
use crate::answers::{AnswerSource, PromptAnswers, Repository};
use crate::assembler::{AssemblerSettings, JobAssembler, Notice};
use crate::config::WizardConfig;
use crate::errors::{WizardError, WizardResult};
use crate::providers::AwsCli;
use crate::store::WorkflowStore;
use crate::templates::{find_template, TemplateApplier};
use crate::utils::{print_header, print_success, print_warning};
use crate::workflow::WorkflowValidator;

/// What a wizard session produced
#[derive(Debug)]
pub struct WizardSummary {
    pub path: PathBuf,
    pub job_ids: Vec<String>,
    pub notices: Vec<Notice>,
    pub warnings: Vec<String>,
}

/// Fail unless `root` is the top of a git repository
pub fn ensure_repository(root: &Path) -> WizardResult<()> {
    if root.join(".git").exists() {
        Ok(())
    } else {
        Err(WizardError::NotARepository {
            path: root.to_path_buf(),
        })
    }
}

static REMOTE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[:/]([A-Za-z0-9-]+/[A-Za-z0-9._-]+?)(?:\.git)?\s*$")
        .expect("valid remote pattern")
});

/// GitHub repository of the `origin` remote, if it points at github.com
pub fn detect_repository(root: &Path) -> Option<Repository> {
    let config = std::fs::read_to_string(root.join(".git").join("config")).ok()?;
    config
        .lines()
        .filter(|line| line.trim_start().starts_with("url"))
        .find_map(|line| REMOTE_URL_PATTERN.captures(line.trim()))
        .and_then(|caps| caps[1].parse().ok())
}

/// Run one wizard session against `store`, saving the result
///
/// Nothing is written unless every action succeeded.
pub fn run_session(
    store: &WorkflowStore,
    config: &WizardConfig,
    assembler: &JobAssembler<'_>,
    answers: &mut dyn AnswerSource,
) -> WizardResult<WizardSummary> {
    let mut notices = Vec::new();

    let (mut document, path) = match answers.template_name()? {
        Some(name) => {
            let template = find_template(&name)?;
            let path = store.workflow_path(template.file_name);
            let mut document = store.load(&path)?;
            for outcome in TemplateApplier::apply(assembler, &mut document, &name, &mut *answers)? {
                notices.extend(outcome.notices);
            }
            (document, path)
        }
        None => {
            let file = answers.workflow_file_name(&config.default_workflow_file)?;
            let path = store.workflow_path(&file);
            let mut document = store.load(&path)?;
            loop {
                let action = answers.action_kind()?;
                let outcome = assembler.assemble(&mut document, action, &mut *answers)?;
                notices.extend(outcome.notices);
                if !answers.add_another()? {
                    break;
                }
            }
            (document, path)
        }
    };
    assembler.ensure_trigger(&mut document, &mut *answers)?;

    let validation = WorkflowValidator::validate(&document);
    let mut warnings = validation.errors;
    warnings.extend(validation.warnings);

    let path = store.save(&document, &path)?;
    debug!(path = %path.display(), notices = notices.len(), "wizard session finished");

    Ok(WizardSummary {
        path,
        job_ids: document.job_ids(),
        notices,
        warnings,
    })
}

/// Run the interactive wizard in the current directory
pub fn run(overrides: Overrides, verbose: bool) -> Result<()> {
    let root = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    ensure_repository(&root)?;

    let config = load_config(&root, &overrides)?;
    let store = WorkflowStore::from_config(&root, &config);
    let provisioner = AwsCli::new().with_progress(true);
    let assembler = JobAssembler::new(AssemblerSettings::from(&config), &provisioner);
    let mut answers = PromptAnswers::new().with_default_repository(detect_repository(&root));

    print_header("GitHub Actions workflow wizard");
    let summary = run_session(&store, &config, &assembler, &mut answers)?;

    println!();
    print_success(&format!("Wrote {}", summary.path.display()));
    if verbose {
        for job in &summary.job_ids {
            println!("    {}", job.dimmed());
        }
    }

    for warning in &summary.warnings {
        print_warning(warning);
    }

    if !summary.notices.is_empty() {
        println!();
        for notice in &summary.notices {
            println!("{} {}", "IMPORTANT:".yellow().bold(), notice);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ensure_repository(dir.path()),
            Err(WizardError::NotARepository { .. })
        ));
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(ensure_repository(dir.path()).is_ok());
    }

    #[test]
    fn test_detect_repository_from_origin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(detect_repository(dir.path()).is_none());

        std::fs::write(
            dir.path().join(".git/config"),
            "[remote \"origin\"]\n\turl = git@github.com:octo-org/site.git\n\tfetch = +refs/heads/*:refs/remotes/origin/*\n",
        )
        .unwrap();
        assert_eq!(
            detect_repository(dir.path()),
            Some(Repository::new("octo-org", "site"))
        );

        std::fs::write(
            dir.path().join(".git/config"),
            "[remote \"origin\"]\n\turl = https://github.com/octo/tools\n",
        )
        .unwrap();
        assert_eq!(detect_repository(dir.path()), Some(Repository::new("octo", "tools")));
    }
}
