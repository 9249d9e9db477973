// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! AWS provisioning
//!
//! Creates the IAM roles GitHub Actions assumes through OIDC, and builds the
//! workflow steps that use them. Provisioning shells out to the `aws` CLI
//! with whatever credentials the user has configured.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

use crate::answers::Repository;
use crate::errors::{WizardError, WizardResult};
use crate::utils::create_spinner;
use crate::workflow::Step;

/// Host of GitHub's OIDC token issuer
pub const GITHUB_OIDC_HOST: &str = "token.actions.githubusercontent.com";

/// Audience AWS expects in GitHub-issued tokens
const STS_AUDIENCE: &str = "sts.amazonaws.com";

/// Who may assume a role, and what it may touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequest {
    pub account_id: String,
    pub repository: Repository,
    /// Branch allowed to assume the role; any ref of the repository when `None`
    pub branch: Option<String>,
    /// S3 `bucket[/prefix]` or Lambda function name
    pub resource: String,
}

impl RoleRequest {
    /// IAM role name, limited to the characters and length IAM accepts
    pub fn role_name(&self, purpose: &str) -> String {
        let raw = format!("github-actions-{}-{}", self.repository.name, purpose);
        let mut name: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || "+=,.@_-".contains(c) {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        name.truncate(64);
        name
    }
}

/// External cloud operations needed by deploy jobs
pub trait CloudProvisioner {
    /// Account id of the configured credentials
    fn account_id(&self) -> WizardResult<String>;

    /// Create a role allowed to write to the requested S3 location; returns its ARN
    fn create_role_for_s3_deploy(&self, request: &RoleRequest) -> WizardResult<String>;

    /// Create a role allowed to update the requested Lambda function; returns its ARN
    fn create_role_for_lambda_deploy(&self, request: &RoleRequest) -> WizardResult<String>;
}

/// Trust policy letting GitHub Actions runs of one repository assume a role
pub fn trust_policy(request: &RoleRequest) -> Value {
    let subject = match &request.branch {
        Some(branch) => format!("repo:{}:ref:refs/heads/{}", request.repository, branch),
        None => format!("repo:{}:*", request.repository),
    };

    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {
                "Federated": format!(
                    "arn:aws:iam::{}:oidc-provider/{}",
                    request.account_id, GITHUB_OIDC_HOST
                )
            },
            "Action": "sts:AssumeRoleWithWebIdentity",
            "Condition": {
                "StringEquals": {
                    (format!("{}:aud", GITHUB_OIDC_HOST)): STS_AUDIENCE
                },
                "StringLike": {
                    (format!("{}:sub", GITHUB_OIDC_HOST)): subject
                }
            }
        }]
    })
}

/// Permissions to sync files into an S3 bucket prefix
pub fn s3_deploy_policy(destination: &str) -> Value {
    let (bucket, prefix) = destination.split_once('/').unwrap_or((destination, ""));
    let prefix = prefix.trim_end_matches('/');
    let objects = if prefix.is_empty() {
        format!("arn:aws:s3:::{}/*", bucket)
    } else {
        format!("arn:aws:s3:::{}/{}/*", bucket, prefix)
    };

    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": ["s3:ListBucket"],
                "Resource": format!("arn:aws:s3:::{}", bucket)
            },
            {
                "Effect": "Allow",
                "Action": ["s3:PutObject", "s3:GetObject", "s3:DeleteObject"],
                "Resource": objects
            }
        ]
    })
}

/// Permissions to replace the code of one Lambda function
pub fn lambda_deploy_policy(account_id: &str, function_name: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Action": ["lambda:UpdateFunctionCode", "lambda:GetFunction"],
            "Resource": format!("arn:aws:lambda:*:{}:function:{}", account_id, function_name)
        }]
    })
}

/// Provisioner backed by the `aws` command line tool
#[derive(Debug, Clone, Default)]
pub struct AwsCli {
    show_progress: bool,
}

impl AwsCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a spinner while AWS calls run
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn binary() -> WizardResult<PathBuf> {
        which::which("aws").map_err(|_| WizardError::tool_not_found("aws"))
    }

    /// Run `aws <args>` and parse its JSON output
    fn call(&self, service: &str, args: &[&str]) -> WizardResult<Value> {
        let binary = Self::binary()?;
        debug!(service, args = ?args, "calling aws");

        let spinner = self
            .show_progress
            .then(|| create_spinner(&format!("Calling aws {}...", service)));

        let output = Command::new(&binary)
            .args(args)
            .args(["--output", "json"])
            .output()
            .map_err(|e| WizardError::external(&format!("aws {}", service), e.to_string()));

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(WizardError::external(&format!("aws {}", service), stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&stdout)?)
    }

    fn ensure_oidc_provider(&self, account_id: &str) -> WizardResult<()> {
        let providers = self.call("iam", &["iam", "list-open-id-connect-providers"])?;
        let exists = providers["OpenIDConnectProviderList"]
            .as_array()
            .map(|list| {
                list.iter().any(|p| {
                    p["Arn"]
                        .as_str()
                        .map(|arn| arn.ends_with(GITHUB_OIDC_HOST))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);

        if !exists {
            debug!(account_id, "creating GitHub OIDC provider");
            let url = format!("https://{}", GITHUB_OIDC_HOST);
            self.call(
                "iam",
                &[
                    "iam",
                    "create-open-id-connect-provider",
                    "--url",
                    &url,
                    "--client-id-list",
                    STS_AUDIENCE,
                ],
            )?;
        }
        Ok(())
    }

    /// Create the role, or refresh the trust policy of an existing one, and attach `policy`
    fn create_role(&self, request: &RoleRequest, purpose: &str, policy: &Value) -> WizardResult<String> {
        self.ensure_oidc_provider(&request.account_id)?;

        let role_name = request.role_name(purpose);
        let trust = trust_policy(request).to_string();

        let arn = match self.call(
            "iam",
            &[
                "iam",
                "create-role",
                "--role-name",
                &role_name,
                "--assume-role-policy-document",
                &trust,
            ],
        ) {
            Ok(created) => created["Role"]["Arn"].as_str().map(String::from),
            Err(WizardError::ExternalCall { message, .. })
                if message.contains("EntityAlreadyExists") =>
            {
                warn!(role = %role_name, "role already exists, updating its trust policy");
                self.call(
                    "iam",
                    &[
                        "iam",
                        "update-assume-role-policy",
                        "--role-name",
                        &role_name,
                        "--policy-document",
                        &trust,
                    ],
                )?;
                let existing = self.call("iam", &["iam", "get-role", "--role-name", &role_name])?;
                existing["Role"]["Arn"].as_str().map(String::from)
            }
            Err(e) => return Err(e),
        }
        .ok_or_else(|| WizardError::external("aws iam", "response did not include a role ARN"))?;

        let policy_name = format!("{}-policy", purpose);
        let policy = policy.to_string();
        self.call(
            "iam",
            &[
                "iam",
                "put-role-policy",
                "--role-name",
                &role_name,
                "--policy-name",
                &policy_name,
                "--policy-document",
                &policy,
            ],
        )?;

        Ok(arn)
    }
}

impl CloudProvisioner for AwsCli {
    fn account_id(&self) -> WizardResult<String> {
        let identity = self.call("sts", &["sts", "get-caller-identity"])?;
        identity["Account"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| WizardError::external("aws sts", "response did not include an account id"))
    }

    fn create_role_for_s3_deploy(&self, request: &RoleRequest) -> WizardResult<String> {
        self.create_role(request, "s3-deploy", &s3_deploy_policy(&request.resource))
    }

    fn create_role_for_lambda_deploy(&self, request: &RoleRequest) -> WizardResult<String> {
        self.create_role(
            request,
            "lambda-deploy",
            &lambda_deploy_policy(&request.account_id, &request.resource),
        )
    }
}

/// Step exchanging the workflow's OIDC token for the role stored in `role_variable`
pub fn configure_credentials_step(role_variable: &str, region: &str) -> Step {
    Step::uses("aws-actions/configure-aws-credentials@v4")
        .named("Configure AWS credentials")
        .input("role-to-assume", format!("${{{{ vars.{} }}}}", role_variable))
        .input("aws-region", region)
        .into()
}

/// Step uploading a local path to `bucket[/prefix]`
///
/// Archives are copied as one object; directories are synced.
pub fn s3_upload_step(local_path: &str, destination: &str) -> Step {
    let destination = format!("s3://{}", destination.trim_end_matches('/'));
    let command = if local_path.ends_with(".zip") {
        format!("aws s3 cp {} {}/", local_path, destination)
    } else {
        format!("aws s3 sync {} {} --exclude '.git/*'", local_path, destination)
    };
    Step::run(command).named("Upload to S3").into()
}

/// Steps packaging `local_path` if needed and replacing a Lambda function's code
pub fn lambda_update_steps(local_path: &str, is_file: bool, function_name: &str) -> Vec<Step> {
    let mut steps = Vec::new();

    let archive = if local_path.ends_with(".zip") {
        local_path.to_string()
    } else {
        let package = if is_file {
            format!("zip function.zip {}", local_path)
        } else {
            format!(
                "(cd {} && zip -r \"$GITHUB_WORKSPACE/function.zip\" . -x '.git/*')",
                local_path
            )
        };
        steps.push(Step::run(package).named("Package function").into());
        "function.zip".to_string()
    };

    steps.push(
        Step::run(format!(
            "aws lambda update-function-code --function-name {} --zip-file fileb://{}",
            function_name, archive
        ))
        .named("Update Lambda function")
        .into(),
    );
    steps
}
