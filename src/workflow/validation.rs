// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Workflow validation
//!
//! Checks document invariants before saving, mostly to catch problems in
//! files edited by hand.

use super::document::Document;
use super::graph::JobGraph;
use super::resolver::{JobCategory, BUILD_JOB};
use super::step::Step;

/// Workflow validator
pub struct WorkflowValidator;

impl WorkflowValidator {
    /// Validate a workflow document
    pub fn validate(document: &Document) -> ValidationResult {
        let mut result = ValidationResult::new();

        if document.job_count() == 0 {
            result.add_error("Workflow has no jobs defined");
        }

        if document.triggers.is_empty() {
            result.add_warning("Workflow has no triggers and will never run");
        }

        for issue in JobGraph::build(document).issues() {
            result.add_error(&issue.to_string());
        }

        for (id, job) in document.jobs() {
            if job.runs_on.is_empty() {
                result.add_error(&format!("Job '{}': runs-on is empty", id));
            }

            if job.steps.is_empty() {
                result.add_warning(&format!("Job '{}' has no steps", id));
            }

            for (idx, step) in job.steps.iter().enumerate() {
                if let Step::Run(run) = step {
                    if run.run.trim().is_empty() {
                        result.add_error(&format!("Job '{}', step {}: command is empty", id, idx + 1));
                    }
                }
            }

            if JobCategory::of(id) == JobCategory::Deploy && job.guard.is_none() {
                result.add_warning(&format!(
                    "Job '{}' has no 'if' guard and will deploy on every trigger",
                    id
                ));
            }

            if JobCategory::of(id) == JobCategory::Deploy
                && document.has_job(BUILD_JOB)
                && job.needs.is_empty()
            {
                result.add_warning(&format!(
                    "Job '{}' does not wait for the build job",
                    id
                ));
            }
        }

        result
    }
}

/// Result of workflow validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{checkout_step, JobField, Trigger, DEFAULT_RUNNER};

    #[test]
    fn test_validate_empty_workflow() {
        let result = WorkflowValidator::validate(&Document::new());
        assert!(!result.is_valid());
        assert!(result.errors[0].contains("no jobs"));
        assert!(result.has_warnings());
    }

    #[test]
    fn test_validate_dangling_needs() {
        let mut doc = Document::new();
        doc.add_trigger(Trigger::push("main"));
        doc.ensure_job("deploy_to_npm", DEFAULT_RUNNER).steps.push(checkout_step());
        doc.set_job_field("deploy_to_npm", JobField::Needs(vec!["test".into()]))
            .unwrap();

        let result = WorkflowValidator::validate(&doc);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("unknown job 'test'")));
        assert!(result.warnings.iter().any(|w| w.contains("'if' guard")));
    }

    #[test]
    fn test_validate_clean_workflow() {
        let mut doc = Document::new();
        doc.add_trigger(Trigger::push("main"));
        doc.ensure_job("build", DEFAULT_RUNNER).steps.push(checkout_step());

        let result = WorkflowValidator::validate(&doc);
        assert!(result.is_valid());
        assert!(!result.has_warnings());
    }
}
