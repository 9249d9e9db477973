// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Deploy jobs
//!
//! One job per target, named `deploy_to_<target>`. A deploy job runs only for
//! the trigger it was created for: its guard checks the event and, for
//! pushes, the branch.

use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::{Artifact, AssemblerSettings, AssemblyOutcome, Notice};
use crate::answers::AnswerSource;
use crate::errors::{WizardError, WizardResult};
use crate::providers::aws::{self, CloudProvisioner, RoleRequest};
use crate::providers::{NpmRegistry, PackageRegistry, PythonRegistry};
use crate::workflow::{checkout_step, Document, Environment, Step, Trigger, TriggerKind, DEPLOY_JOB_PREFIX};

const S3_ROLE_VARIABLE: &str = "S3_DEPLOY_ROLE";
const LAMBDA_ROLE_VARIABLE: &str = "LAMBDA_DEPLOY_ROLE";
const PAGES_ENVIRONMENT: &str = "github-pages";
const ITCH_CHANNEL: &str = "html5";

/// Where build artifacts are deployed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployTarget {
    AwsS3,
    AwsLambda,
    Pypi,
    Npm,
    GithubPages,
    ItchIo,
}

impl DeployTarget {
    pub const ALL: [DeployTarget; 6] = [
        Self::AwsS3,
        Self::AwsLambda,
        Self::Pypi,
        Self::Npm,
        Self::GithubPages,
        Self::ItchIo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwsS3 => "aws_s3",
            Self::AwsLambda => "aws_lambda",
            Self::Pypi => "pypi",
            Self::Npm => "npm",
            Self::GithubPages => "github_pages",
            Self::ItchIo => "itch.io",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AwsS3 => "Upload to an S3 bucket",
            Self::AwsLambda => "Update an AWS Lambda function",
            Self::Pypi => "Publish a Python package to PyPI",
            Self::Npm => "Publish a package to npm",
            Self::GithubPages => "Publish a static site to GitHub Pages",
            Self::ItchIo => "Push a game build to itch.io",
        }
    }

    /// Id of the job deploying to this target
    pub fn job_id(&self) -> String {
        let target: String = self
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        format!("{}{}", DEPLOY_JOB_PREFIX, target)
    }

    /// Whether the job needs an OIDC token
    pub fn needs_id_token(&self) -> bool {
        matches!(self, Self::AwsS3 | Self::AwsLambda | Self::GithubPages)
    }

    /// Names of every step a deploy to this target may generate
    fn generated_step_names(&self) -> &'static [&'static str] {
        match self {
            Self::AwsS3 => &["Configure AWS credentials", "Upload to S3"],
            Self::AwsLambda => &[
                "Configure AWS credentials",
                "Package function",
                "Update Lambda function",
            ],
            Self::Pypi => &["Check version is unpublished", "Publish to PyPI"],
            Self::Npm => &["Set up Node.js", "Check version is unpublished", "Publish to npm"],
            Self::GithubPages => &["Setup Pages", "Upload Pages artifact", "Deploy to GitHub Pages"],
            Self::ItchIo => &["Install butler", "Push to itch.io"],
        }
    }
}

/// Steps fetching the code or artifact a deploy job works on
const SOURCE_STEP_NAMES: [&str; 2] = ["Checkout", "Download build artifact"];

impl fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployTarget {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "aws_s3" | "s3" => Ok(Self::AwsS3),
            "aws_lambda" | "lambda" => Ok(Self::AwsLambda),
            "pypi" => Ok(Self::Pypi),
            "npm" => Ok(Self::Npm),
            "github_pages" | "pages" => Ok(Self::GithubPages),
            "itch.io" | "itch_io" | "itchio" | "itch" => Ok(Self::ItchIo),
            _ => Err(WizardError::UnknownTarget {
                target: s.to_string(),
            }),
        }
    }
}

/// Condition limiting a deploy job to the event it was created for
pub fn guard_for(trigger: &Trigger) -> String {
    match trigger {
        Trigger::Push { branches } => format!(
            "github.event_name == 'push' && github.ref == 'refs/heads/{}'",
            branches.first().map(String::as_str).unwrap_or("main")
        ),
        Trigger::Release { .. } => {
            "github.event_name == 'release' && github.event.action == 'created'".to_string()
        }
        Trigger::Schedule { .. } => "github.event_name == 'schedule'".to_string(),
    }
}

fn push_branch(trigger: &Trigger) -> Option<String> {
    match trigger {
        Trigger::Push { branches } => branches.first().cloned(),
        _ => None,
    }
}

/// Everything a deploy adds to the document, computed before any mutation
#[derive(Debug, Default)]
struct TargetPlan {
    permissions: Vec<(&'static str, &'static str)>,
    environment: Option<Environment>,
    steps: Vec<Step>,
    /// Top-level settings written only when the document lacks them
    document_fields: Vec<(&'static str, Value)>,
    notices: Vec<Notice>,
}

fn plan_target(
    target: DeployTarget,
    settings: &AssemblerSettings,
    provisioner: &dyn CloudProvisioner,
    trigger: &Trigger,
    artifact: &Artifact,
    answers: &mut dyn AnswerSource,
) -> WizardResult<TargetPlan> {
    let mut plan = TargetPlan::default();
    if target.needs_id_token() {
        plan.permissions.push(("id-token", "write"));
    }
    plan.permissions.push(("contents", "read"));

    match target {
        DeployTarget::AwsS3 => {
            let repository = answers.repository()?;
            let destination = answers.s3_path()?;
            let request = RoleRequest {
                account_id: provisioner.account_id()?,
                repository,
                branch: push_branch(trigger),
                resource: destination.clone(),
            };
            let role_arn = provisioner.create_role_for_s3_deploy(&request)?;

            plan.steps
                .push(aws::configure_credentials_step(S3_ROLE_VARIABLE, &settings.aws_region));
            plan.steps
                .push(aws::s3_upload_step(upload_path(artifact), &destination));
            plan.notices.push(Notice::variable(
                S3_ROLE_VARIABLE,
                Some(role_arn),
                "IAM role assumed by the S3 deployment",
            ));
        }
        DeployTarget::AwsLambda => {
            let repository = answers.repository()?;
            let function_name = answers.lambda_function_name()?;
            let request = RoleRequest {
                account_id: provisioner.account_id()?,
                repository,
                branch: push_branch(trigger),
                resource: function_name.clone(),
            };
            let role_arn = provisioner.create_role_for_lambda_deploy(&request)?;

            plan.steps.push(aws::configure_credentials_step(
                LAMBDA_ROLE_VARIABLE,
                &settings.aws_region,
            ));
            plan.steps.extend(aws::lambda_update_steps(
                upload_path(artifact),
                artifact.is_file(),
                &function_name,
            ));
            plan.notices.push(Notice::variable(
                LAMBDA_ROLE_VARIABLE,
                Some(role_arn),
                "IAM role assumed by the Lambda deployment",
            ));
        }
        DeployTarget::Pypi => publish_plan(&mut plan, &PythonRegistry::default(), artifact, false),
        DeployTarget::Npm => publish_plan(&mut plan, &NpmRegistry::default(), artifact, true),
        DeployTarget::GithubPages => {
            plan.permissions.push(("pages", "write"));
            plan.environment = Some(Environment::new(
                PAGES_ENVIRONMENT,
                Some("${{ steps.deployment.outputs.page_url }}".to_string()),
            ));
            plan.steps.push(Step::uses("actions/configure-pages@v5").named("Setup Pages").into());
            plan.steps.push(
                Step::uses("actions/upload-pages-artifact@v3")
                    .named("Upload Pages artifact")
                    .input("path", artifact.download_dir())
                    .into(),
            );
            plan.steps.push(
                Step::uses("actions/deploy-pages@v4")
                    .named("Deploy to GitHub Pages")
                    .with_id("deployment")
                    .into(),
            );

            let mut concurrency = Mapping::new();
            concurrency.insert("group".into(), "pages".into());
            concurrency.insert("cancel-in-progress".into(), false.into());
            plan.document_fields
                .push(("concurrency", Value::Mapping(concurrency)));
        }
        DeployTarget::ItchIo => {
            plan.steps.push(
                Step::run_lines([
                    "curl -sSL -o butler.zip https://broth.itch.zone/butler/linux-amd64/LATEST/archive/default",
                    "unzip -o butler.zip -d butler",
                    "chmod +x butler/butler",
                    "butler/butler -V",
                ])
                .named("Install butler")
                .into(),
            );
            plan.steps.push(
                Step::run(format!(
                    "BUTLER_API_KEY=\"${{{{ secrets.BUTLER_API_KEY }}}}\" butler/butler push {} \"${{{{ vars.ITCH_USER }}}}/${{{{ vars.ITCH_GAME }}}}:{}\"",
                    upload_path(artifact),
                    ITCH_CHANNEL
                ))
                .named("Push to itch.io")
                .into(),
            );
            plan.notices.extend([
                Notice::secret("BUTLER_API_KEY", "an itch.io API key for butler"),
                Notice::variable("ITCH_USER", None, "your itch.io user name"),
                Notice::variable("ITCH_GAME", None, "the itch.io game slug"),
            ]);
        }
    }

    Ok(plan)
}

/// Local path of the downloaded artifact as later commands see it
fn upload_path(artifact: &Artifact) -> &str {
    if artifact.is_file() {
        &artifact.path
    } else {
        artifact.download_dir()
    }
}

fn publish_plan(
    plan: &mut TargetPlan,
    registry: &dyn PackageRegistry,
    artifact: &Artifact,
    needs_environment: bool,
) {
    if needs_environment {
        plan.steps.push(registry.setup_environment());
    }
    plan.steps.push(registry.version_check(artifact));
    plan.steps.push(registry.publish(artifact));
    plan.notices.push(Notice::secret(
        registry.token_secret(),
        &format!("an API token for {}", registry.name()),
    ));
}

/// Create the deploy job for the chosen target, or augment an existing one
///
/// Answers and external calls happen first; a failure leaves the document untouched.
pub(super) fn assemble(
    settings: &AssemblerSettings,
    provisioner: &dyn CloudProvisioner,
    document: &mut Document,
    answers: &mut dyn AnswerSource,
) -> WizardResult<AssemblyOutcome> {
    let target = answers.deploy_target()?;
    let trigger = match answers.deploy_trigger()? {
        TriggerKind::Push => Trigger::push(answers.branch_name()?),
        TriggerKind::Release => Trigger::release_created(),
        TriggerKind::Schedule => {
            return Err(WizardError::UnknownTrigger {
                trigger: "schedule (deployments run on push or release)".to_string(),
            })
        }
    };

    let built = Artifact::from_document(document);
    let source = match &built {
        Some(artifact) => artifact.download_step(),
        None => checkout_step(),
    };
    let artifact = built.unwrap_or_else(|| Artifact::new(settings.artifact_name.as_str(), "."));

    let plan = plan_target(target, settings, provisioner, &trigger, &artifact, answers)?;
    let job_id = target.job_id();
    debug!(job = %job_id, steps = plan.steps.len(), "planned deploy job");

    let guard = guard_for(&trigger);
    document.add_trigger(trigger);
    for (key, value) in plan.document_fields {
        if document.document_field(key).is_none() {
            document.set_document_field(key, value);
        }
    }

    let job = document.ensure_job(&job_id, &settings.runner);
    job.guard = Some(guard);
    for (scope, level) in plan.permissions {
        job.grant(scope, level);
    }
    if plan.environment.is_some() {
        job.environment = plan.environment;
    }
    let mut owned = SOURCE_STEP_NAMES.to_vec();
    owned.extend_from_slice(target.generated_step_names());
    let mut block = vec![source];
    block.extend(plan.steps);
    job.replace_owned_steps(block, &owned);

    Ok(AssemblyOutcome {
        job_id,
        notices: plan.notices,
    })
}
