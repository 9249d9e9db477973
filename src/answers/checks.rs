// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Answer validation
//!
//! Each check trims its input and returns the normalised value.

use regex::Regex;
use std::sync::LazyLock;

use crate::errors::{WizardError, WizardResult};

static BRANCH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._/-]+$").expect("valid branch pattern"));

static CRON_FIELD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9*/,\-A-Za-z?]+$").expect("valid cron pattern"));

static BUCKET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("valid bucket pattern")
});

static LAMBDA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid function name pattern"));

static REPOSITORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9-]+/[A-Za-z0-9._-]+$").expect("valid repository pattern")
});

static WORKFLOW_FILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+\.ya?ml$").expect("valid file name pattern"));

/// Git branch name
pub fn check_branch(value: &str) -> WizardResult<String> {
    let value = value.trim();
    let valid = BRANCH_PATTERN.is_match(value)
        && !value.starts_with('/')
        && !value.ends_with('/')
        && !value.ends_with(".lock")
        && !value.contains("..")
        && !value.contains("//");
    if !valid {
        return Err(WizardError::invalid_answer(
            "branch",
            format!("'{}' is not a valid branch name", value),
        ));
    }
    Ok(value.to_string())
}

/// Five-field cron expression
pub fn check_cron(value: &str) -> WizardResult<String> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(WizardError::invalid_answer(
            "cron schedule",
            format!("expected 5 fields, got {}", fields.len()),
        ));
    }
    for field in &fields {
        if !CRON_FIELD_PATTERN.is_match(field) {
            return Err(WizardError::invalid_answer(
                "cron schedule",
                format!("invalid field '{}'", field),
            ));
        }
    }
    Ok(fields.join(" "))
}

/// `bucket[/prefix]`, with an optional `s3://` scheme
pub fn check_s3_path(value: &str) -> WizardResult<String> {
    let value = value.trim();
    let value = value.strip_prefix("s3://").unwrap_or(value);
    let (bucket, _) = value.split_once('/').unwrap_or((value, ""));
    if !BUCKET_PATTERN.is_match(bucket) || bucket.contains("..") {
        return Err(WizardError::invalid_answer(
            "S3 path",
            format!("'{}' is not a valid bucket name", bucket),
        ));
    }
    Ok(value.to_string())
}

/// Lambda function name
pub fn check_lambda_name(value: &str) -> WizardResult<String> {
    let value = value.trim();
    if !LAMBDA_PATTERN.is_match(value) {
        return Err(WizardError::invalid_answer(
            "Lambda function name",
            "use 1-64 letters, digits, hyphens or underscores",
        ));
    }
    Ok(value.to_string())
}

/// `owner/name` repository slug
pub fn check_repository(value: &str) -> WizardResult<String> {
    let value = value.trim().trim_end_matches(".git");
    if !REPOSITORY_PATTERN.is_match(value) {
        return Err(WizardError::invalid_answer(
            "repository",
            format!("'{}' is not in owner/name form", value),
        ));
    }
    Ok(value.to_string())
}

/// Workflow file name inside the workflows directory
pub fn check_workflow_file(value: &str) -> WizardResult<String> {
    let value = value.trim();
    if !WORKFLOW_FILE_PATTERN.is_match(value) {
        return Err(WizardError::invalid_answer(
            "workflow file",
            "expected a file name ending in .yml or .yaml",
        ));
    }
    Ok(value.to_string())
}
