// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Error types
//!
//! Every failure is local and synchronous: it is reported to the caller with
//! a human-readable message and a hint, and never retried.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for gha-wizard operations
pub type WizardResult<T> = Result<T, WizardError>;

/// Main error type for gha-wizard
#[derive(Error, Debug, Diagnostic)]
pub enum WizardError {
    // ─────────────────────────────────────────────────────────────────────────
    // Preconditions
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Not inside a git repository: {path}")]
    #[diagnostic(
        code(gha_wizard::not_a_repository),
        help("Run gha-wizard from the root of a git repository (the directory containing .git)")
    )]
    NotARepository { path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration selection
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Unknown action: '{action}'")]
    #[diagnostic(
        code(gha_wizard::unknown_action),
        help("Available actions: build, test, deploy")
    )]
    UnknownAction { action: String },

    #[error("Unknown deployment target: '{target}'")]
    #[diagnostic(
        code(gha_wizard::unknown_target),
        help("Available targets: aws_s3, aws_lambda, pypi, npm, github_pages, itch.io")
    )]
    UnknownTarget { target: String },

    #[error("Unknown build type: '{build_type}'")]
    #[diagnostic(
        code(gha_wizard::unknown_build_type),
        help("Available build types: copy, zip, python_build, npm_build, hugo")
    )]
    UnknownBuildType { build_type: String },

    #[error("Unknown trigger: '{trigger}'")]
    #[diagnostic(
        code(gha_wizard::unknown_trigger),
        help("Available triggers: push, release, schedule")
    )]
    UnknownTrigger { trigger: String },

    #[error("Unknown template: '{template}'")]
    #[diagnostic(
        code(gha_wizard::unknown_template),
        help("Run 'gha-wizard templates' to list the available templates")
    )]
    UnknownTemplate { template: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Document errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Job '{job}' not found in workflow")]
    #[diagnostic(code(gha_wizard::unknown_job))]
    UnknownJob { job: String },

    #[error("Job order {requested:?} is not a permutation of {current:?}")]
    #[diagnostic(
        code(gha_wizard::order_mismatch),
        help("A reorder must mention every existing job exactly once")
    )]
    OrderMismatch {
        current: Vec<String>,
        requested: Vec<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // External collaborators
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{service} call failed: {message}")]
    #[diagnostic(code(gha_wizard::external_call))]
    ExternalCall {
        service: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Tool '{tool}' not found")]
    #[diagnostic(code(gha_wizard::tool_not_found), help("{suggestion}"))]
    ToolNotFound { tool: String, suggestion: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Answers
    // ─────────────────────────────────────────────────────────────────────────
    #[error("No answer available for '{question}'")]
    #[diagnostic(code(gha_wizard::missing_answer))]
    MissingAnswer { question: String },

    #[error("Invalid answer for '{question}': {reason}")]
    #[diagnostic(code(gha_wizard::invalid_answer))]
    InvalidAnswer { question: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(gha_wizard::file_read_error))]
    FileRead { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(gha_wizard::file_write_error))]
    FileWrite { path: PathBuf, error: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(gha_wizard::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(gha_wizard::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(gha_wizard::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for WizardError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<dialoguer::Error> for WizardError {
    fn from(e: dialoguer::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for WizardError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for WizardError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl WizardError {
    /// Create a tool not found error with installation suggestion
    pub fn tool_not_found(tool: &str) -> Self {
        let suggestion = match tool {
            "aws" => "Install the AWS CLI: https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html".to_string(),
            _ => format!("Install {} and ensure it's in your PATH", tool),
        };

        Self::ToolNotFound {
            tool: tool.to_string(),
            suggestion,
        }
    }

    /// Create an external call error, attaching a hint for well-known AWS failures
    pub fn external(service: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let help = if message.contains("EntityAlreadyExists") {
            Some("The IAM role already exists. Delete it or reuse its ARN.".to_string())
        } else if message.contains("Unable to locate credentials")
            || message.contains("ExpiredToken")
        {
            Some("Configure AWS credentials first, e.g. with 'aws configure' or 'aws sso login'.".to_string())
        } else if message.contains("AccessDenied") {
            Some("Your AWS identity lacks IAM permissions to create roles and policies.".to_string())
        } else {
            None
        };

        Self::ExternalCall {
            service: service.to_string(),
            message,
            help,
        }
    }

    pub fn invalid_answer(question: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAnswer {
            question: question.to_string(),
            reason: reason.into(),
        }
    }
}
