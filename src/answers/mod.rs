// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Answer sources
//!
//! Every decision the wizard needs is a query on an [`AnswerSource`]. The
//! interactive CLI asks the user; tests and templates supply literal
//! answers instead.

mod checks;
mod prompt;

pub use checks::*;
pub use prompt::PromptAnswers;

use std::fmt;
use std::str::FromStr;

use crate::assembler::{ActionKind, BuildType, DeployTarget};
use crate::errors::{WizardError, WizardResult};
use crate::workflow::TriggerKind;

/// GitHub repository coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = check_repository(s)?;
        let (owner, name) = slug
            .split_once('/')
            .ok_or_else(|| WizardError::invalid_answer("repository", "expected owner/name"))?;
        Ok(Self::new(owner, name))
    }
}

/// One query per decision point of the wizard
pub trait AnswerSource {
    /// Which kind of job to add next
    fn action_kind(&mut self) -> WizardResult<ActionKind>;

    /// Template to start from, if any
    fn template_name(&mut self) -> WizardResult<Option<String>>;

    /// Workflow file to create or edit
    fn workflow_file_name(&mut self, default: &str) -> WizardResult<String>;

    fn build_type(&mut self) -> WizardResult<BuildType>;

    fn deploy_target(&mut self) -> WizardResult<DeployTarget>;

    /// Trigger for deploy jobs (push or release)
    fn deploy_trigger(&mut self) -> WizardResult<TriggerKind>;

    /// Trigger for a workflow that only tests (push, release or schedule)
    fn test_trigger(&mut self) -> WizardResult<TriggerKind>;

    fn branch_name(&mut self) -> WizardResult<String>;

    fn cron_schedule(&mut self) -> WizardResult<String>;

    fn repository(&mut self) -> WizardResult<Repository>;

    /// S3 destination as `bucket[/prefix]`
    fn s3_path(&mut self) -> WizardResult<String>;

    fn lambda_function_name(&mut self) -> WizardResult<String>;

    fn test_command(&mut self) -> WizardResult<String>;

    /// Whether to add another job after the current one
    fn add_another(&mut self) -> WizardResult<bool>;
}

/// Literal answers, for tests and scripted runs
///
/// Unset answers fail with [`WizardError::MissingAnswer`].
#[derive(Debug, Clone, Default)]
pub struct FixedAnswers {
    pub actions: Vec<ActionKind>,
    pub template: Option<String>,
    pub workflow_file: Option<String>,
    pub build_type: Option<BuildType>,
    pub deploy_target: Option<DeployTarget>,
    pub deploy_trigger: Option<TriggerKind>,
    pub test_trigger: Option<TriggerKind>,
    pub branch: Option<String>,
    pub cron: Option<String>,
    pub repository: Option<Repository>,
    pub s3_path: Option<String>,
    pub lambda_function: Option<String>,
    pub test_command: Option<String>,
}

fn answer<T: Clone>(value: &Option<T>, question: &str) -> WizardResult<T> {
    value.clone().ok_or_else(|| WizardError::MissingAnswer {
        question: question.to_string(),
    })
}

impl AnswerSource for FixedAnswers {
    fn action_kind(&mut self) -> WizardResult<ActionKind> {
        if self.actions.is_empty() {
            return Err(WizardError::MissingAnswer {
                question: "action".to_string(),
            });
        }
        Ok(self.actions.remove(0))
    }

    fn template_name(&mut self) -> WizardResult<Option<String>> {
        Ok(self.template.clone())
    }

    fn workflow_file_name(&mut self, default: &str) -> WizardResult<String> {
        Ok(self
            .workflow_file
            .clone()
            .unwrap_or_else(|| default.to_string()))
    }

    fn build_type(&mut self) -> WizardResult<BuildType> {
        answer(&self.build_type, "build type")
    }

    fn deploy_target(&mut self) -> WizardResult<DeployTarget> {
        answer(&self.deploy_target, "deployment target")
    }

    fn deploy_trigger(&mut self) -> WizardResult<TriggerKind> {
        answer(&self.deploy_trigger, "deployment trigger")
    }

    fn test_trigger(&mut self) -> WizardResult<TriggerKind> {
        answer(&self.test_trigger, "test trigger")
    }

    fn branch_name(&mut self) -> WizardResult<String> {
        answer(&self.branch, "branch")
    }

    fn cron_schedule(&mut self) -> WizardResult<String> {
        answer(&self.cron, "cron schedule")
    }

    fn repository(&mut self) -> WizardResult<Repository> {
        answer(&self.repository, "repository")
    }

    fn s3_path(&mut self) -> WizardResult<String> {
        answer(&self.s3_path, "S3 path")
    }

    fn lambda_function_name(&mut self) -> WizardResult<String> {
        answer(&self.lambda_function, "Lambda function name")
    }

    fn test_command(&mut self) -> WizardResult<String> {
        answer(&self.test_command, "test command")
    }

    fn add_another(&mut self) -> WizardResult<bool> {
        Ok(!self.actions.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_parsing() {
        let repo: Repository = "octo-org/my.repo".parse().unwrap();
        assert_eq!(repo, Repository::new("octo-org", "my.repo"));
        assert_eq!(repo.to_string(), "octo-org/my.repo");
        assert!("no-slash".parse::<Repository>().is_err());
    }

    #[test]
    fn test_fixed_answers_consume_actions() {
        let mut answers = FixedAnswers {
            actions: vec![ActionKind::Build, ActionKind::Deploy],
            ..Default::default()
        };
        assert_eq!(answers.action_kind().unwrap(), ActionKind::Build);
        assert!(answers.add_another().unwrap());
        assert_eq!(answers.action_kind().unwrap(), ActionKind::Deploy);
        assert!(!answers.add_another().unwrap());
        assert!(answers.action_kind().is_err());
    }

    #[test]
    fn test_fixed_answers_missing() {
        let mut answers = FixedAnswers::default();
        assert!(matches!(
            answers.s3_path(),
            Err(WizardError::MissingAnswer { ref question }) if question == "S3 path"
        ));
        assert_eq!(answers.workflow_file_name("ci.yml").unwrap(), "ci.yml");
    }
}
