// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Workflow document model
//!
//! Typed representation of a GitHub Actions workflow: triggers, jobs,
//! steps and permissions, plus job ordering, dependency inference and
//! validation.

mod document;
mod graph;
mod job;
mod layout;
mod ordered;
mod resolver;
mod step;
mod validation;

pub use document::*;
pub use graph::{GraphIssue, JobGraph};
pub use job::{Environment, Job, RunsOn, DEFAULT_RUNNER};
pub use layout::Layout;
pub use ordered::OrderedMap;
pub use resolver::{DependencyResolver, JobCategory, BUILD_JOB, DEPLOY_JOB_PREFIX, TEST_JOB};
pub use step::{ActionStep, RunStep, Step, DEFAULT_SHELL};
pub use validation::{ValidationResult, WorkflowValidator};
