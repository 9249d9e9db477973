// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Validate command - check a workflow file

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{load_config, resolve_workflow, Overrides};
use crate::store::WorkflowStore;
use crate::workflow::{DependencyResolver, WorkflowValidator};

/// Run the validate command
pub fn run(file: Option<PathBuf>, overrides: Overrides, verbose: bool) -> Result<()> {
    let root = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    let config = load_config(&root, &overrides)?;
    let store = WorkflowStore::from_config(&root, &config);
    let path = resolve_workflow(&store, &config, file);

    println!("{}", format!("Validating {}...", path.display()).bold());
    println!();

    if !path.exists() {
        return Err(miette::miette!(
            "Workflow file not found: {}\n\n\
             Run 'gha-wizard' to create one.",
            path.display()
        ));
    }

    let document = match store.load(&path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("  {} Failed to parse workflow", "✗".red());
            eprintln!();
            return Err(e.into());
        }
    };

    println!("  {} Workflow file is valid YAML", "✓".green());

    let validation = WorkflowValidator::validate(&document);

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Workflow summary".bold());
        println!("  Name: {}", document.name.as_deref().unwrap_or("(unnamed)"));
        println!("  Jobs: {}", document.job_count());
        for (id, job) in document.jobs() {
            let deps = if job.needs.is_empty() {
                String::new()
            } else {
                format!(" (needs: {})", job.needs.join(", "))
            };
            println!("    • {}{}", id, deps.dimmed());
        }

        let canonical = DependencyResolver::canonical_order(&document);
        if canonical != document.job_ids() {
            println!(
                "  {} Jobs are not in build, test, deploy order; the wizard will reorder them to: {}",
                "→".blue(),
                canonical.join(", ")
            );
        }
    }

    println!();
    if validation.is_valid() {
        println!("{}", "Workflow is valid!".green().bold());
        Ok(())
    } else {
        Err(miette::miette!(
            "Workflow has {} error(s)",
            validation.errors.len()
        ))
    }
}
