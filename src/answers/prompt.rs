// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Interactive prompts
//!
//! Questions are drawn on stderr so stdout stays clean. Invalid input is
//! reported and the question asked again.

use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use super::{check_branch, check_cron, check_lambda_name, check_s3_path, check_workflow_file};
use super::{AnswerSource, Repository};
use crate::assembler::{ActionKind, BuildType, DeployTarget};
use crate::errors::WizardResult;
use crate::templates::TEMPLATES;
use crate::workflow::TriggerKind;

/// Answers read from the terminal
pub struct PromptAnswers {
    term: Term,
    theme: ColorfulTheme,
    default_branch: String,
    default_repository: Option<Repository>,
}

impl PromptAnswers {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            theme: ColorfulTheme::default(),
            default_branch: "main".to_string(),
            default_repository: None,
        }
    }

    /// Offer `repository` as the default answer for the repository question
    pub fn with_default_repository(mut self, repository: Option<Repository>) -> Self {
        self.default_repository = repository;
        self
    }

    /// Ask a free-form question, re-asking until `check` accepts the answer
    fn ask<T>(
        &self,
        question: &str,
        default: Option<&str>,
        check: impl Fn(&str) -> WizardResult<T>,
    ) -> WizardResult<T> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(question);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }

        let answer = input
            .validate_with(|value: &String| check(value).map(|_| ()))
            .interact_text_on(&self.term)?;
        check(&answer)
    }

    /// Ask the user to pick one of `options` (value, description)
    fn choose<'a>(&self, question: &str, options: &[(&'a str, &str)]) -> WizardResult<&'a str> {
        let items: Vec<String> = options
            .iter()
            .map(|(value, description)| format!("{} - {}", value, description))
            .collect();

        let picked = Select::with_theme(&self.theme)
            .with_prompt(question)
            .items(&items)
            .default(0)
            .interact_on(&self.term)?;
        Ok(options[picked].0)
    }

    fn confirm(&self, question: &str) -> WizardResult<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(question)
            .default(false)
            .interact_on(&self.term)?)
    }
}

impl Default for PromptAnswers {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerSource for PromptAnswers {
    fn action_kind(&mut self) -> WizardResult<ActionKind> {
        let options: Vec<(&str, &str)> = ActionKind::ALL
            .iter()
            .map(|a| (a.as_str(), a.description()))
            .collect();
        self.choose("What would you like to add?", &options)?.parse()
    }

    fn template_name(&mut self) -> WizardResult<Option<String>> {
        let mut options = vec![("custom", "Pick jobs one at a time")];
        options.extend(TEMPLATES.iter().map(|t| (t.name, t.description)));
        let picked = self.choose("Start from a template?", &options)?;
        Ok((picked != "custom").then(|| picked.to_string()))
    }

    fn workflow_file_name(&mut self, default: &str) -> WizardResult<String> {
        self.ask("Workflow file name", Some(default), check_workflow_file)
    }

    fn build_type(&mut self) -> WizardResult<BuildType> {
        let options: Vec<(&str, &str)> = BuildType::ALL
            .iter()
            .map(|b| (b.as_str(), b.description()))
            .collect();
        self.choose("How should the project be built?", &options)?.parse()
    }

    fn deploy_target(&mut self) -> WizardResult<DeployTarget> {
        let options: Vec<(&str, &str)> = DeployTarget::ALL
            .iter()
            .map(|t| (t.as_str(), t.description()))
            .collect();
        self.choose("Where should it be deployed?", &options)?.parse()
    }

    fn deploy_trigger(&mut self) -> WizardResult<TriggerKind> {
        self.choose(
            "When should the deployment run?",
            &[
                ("push", "On every push to a branch"),
                ("release", "When a release is created"),
            ],
        )?
        .parse()
    }

    fn test_trigger(&mut self) -> WizardResult<TriggerKind> {
        self.choose(
            "When should the tests run?",
            &[
                ("push", "On every push to a branch"),
                ("release", "When a release is created"),
                ("schedule", "Periodically, on a cron schedule"),
            ],
        )?
        .parse()
    }

    fn branch_name(&mut self) -> WizardResult<String> {
        let branch = self.ask("Branch name", Some(&self.default_branch.clone()), check_branch)?;
        self.default_branch = branch.clone();
        Ok(branch)
    }

    fn cron_schedule(&mut self) -> WizardResult<String> {
        self.ask("Cron schedule (UTC)", Some("0 0 * * *"), check_cron)
    }

    fn repository(&mut self) -> WizardResult<Repository> {
        let default = self.default_repository.as_ref().map(|r| r.to_string());
        let repo: Repository =
            self.ask("GitHub repository (owner/name)", default.as_deref(), |s| s.parse())?;
        self.default_repository = Some(repo.clone());
        Ok(repo)
    }

    fn s3_path(&mut self) -> WizardResult<String> {
        self.ask("S3 destination (bucket/prefix)", None, check_s3_path)
    }

    fn lambda_function_name(&mut self) -> WizardResult<String> {
        self.ask("Lambda function name", None, check_lambda_name)
    }

    fn test_command(&mut self) -> WizardResult<String> {
        self.ask(
            "Test command",
            Some("# Add your test commands here"),
            |s| Ok(s.to_string()),
        )
    }

    fn add_another(&mut self) -> WizardResult<bool> {
        self.confirm("Add another job?")
    }
}
