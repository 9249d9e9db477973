// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! # gha-wizard - GitHub Actions workflow wizard
//!
//! `gha-wizard` creates and extends GitHub Actions workflows one job at a
//! time: a build job publishing an artifact, test jobs consuming it, and
//! deploy jobs shipping it to AWS, PyPI, npm, GitHub Pages or itch.io.
//!
//! ## Features
//!
//! - **Incremental editing** - existing workflow files are loaded, extended and rewritten
//! - **Dependency inference** - jobs are kept in build, test, deploy order with matching `needs`
//! - **Cloud provisioning** - IAM roles for OIDC deploys are created through the AWS CLI
//! - **Templates** - ready-made build and deploy combinations
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the wizard in a repository
//! gha-wizard
//!
//! # Inspect the result
//! gha-wizard graph
//! gha-wizard validate
//! ```

pub mod answers;
pub mod assembler;
pub mod cli;
pub mod config;
pub mod errors;
pub mod providers;
pub mod store;
pub mod templates;
pub mod utils;
pub mod workflow;

// Re-export commonly used types
pub use answers::{AnswerSource, FixedAnswers, PromptAnswers, Repository};
pub use assembler::{ActionKind, AssemblyOutcome, BuildType, DeployTarget, JobAssembler, Notice};
pub use config::WizardConfig;
pub use errors::{WizardError, WizardResult};
pub use store::WorkflowStore;
pub use templates::{TemplateApplier, TEMPLATES};
pub use workflow::{DependencyResolver, Document, Job, Step};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
