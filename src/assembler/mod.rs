// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Job assembly
//!
//! Turns one requested action (build, test or deploy) into concrete job and
//! step mutations. Each action gathers its answers and performs any external
//! calls first; the document is only touched once all of them succeeded.
//! Job order and `needs` are recomputed after every action.

mod build;
mod deploy;
mod test;

pub use build::BuildType;
pub use deploy::DeployTarget;

use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::answers::AnswerSource;
use crate::config::WizardConfig;
use crate::errors::{WizardError, WizardResult};
use crate::providers::CloudProvisioner;
use crate::workflow::{DependencyResolver, Document, Step, BUILD_JOB};

const UPLOAD_ARTIFACT_ACTION: &str = "actions/upload-artifact";
const DOWNLOAD_ARTIFACT_ACTION: &str = "actions/download-artifact";

/// Kind of job to add
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Build,
    Test,
    Deploy,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [Self::Build, Self::Test, Self::Deploy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::Deploy => "deploy",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Build => "Build the project and publish a build artifact",
            Self::Test => "Run tests",
            Self::Deploy => "Deploy the build artifact",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "build" => Ok(Self::Build),
            "test" => Ok(Self::Test),
            "deploy" | "deployment" => Ok(Self::Deploy),
            _ => Err(WizardError::UnknownAction {
                action: s.to_string(),
            }),
        }
    }
}

/// Settings shared by all generated jobs
#[derive(Debug, Clone)]
pub struct AssemblerSettings {
    pub runner: String,
    pub aws_region: String,
    pub artifact_name: String,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self::from(&WizardConfig::default())
    }
}

impl From<&WizardConfig> for AssemblerSettings {
    fn from(config: &WizardConfig) -> Self {
        Self {
            runner: config.runner.clone(),
            aws_region: config.aws_region.clone(),
            artifact_name: config.artifact_name.clone(),
        }
    }
}

/// Where a repository setting must be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Variable,
    Secret,
}

/// Something the user must configure on the repository for a job to work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub name: String,
    /// Value to store, when the wizard knows it (e.g. a created role ARN)
    pub value: Option<String>,
    pub description: String,
}

impl Notice {
    pub fn variable(name: &str, value: Option<String>, description: &str) -> Self {
        Self {
            kind: NoticeKind::Variable,
            name: name.to_string(),
            value,
            description: description.to_string(),
        }
    }

    pub fn secret(name: &str, description: &str) -> Self {
        Self {
            kind: NoticeKind::Secret,
            name: name.to_string(),
            value: None,
            description: description.to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            NoticeKind::Variable => "variable",
            NoticeKind::Secret => "secret",
        };
        match &self.value {
            Some(value) => write!(f, "Set GitHub repo {} {} to {}", kind, self.name, value),
            None => write!(f, "Set GitHub repo {} {} ({})", kind, self.name, self.description),
        }
    }
}

/// Result of one assembled action
#[derive(Debug, Clone)]
pub struct AssemblyOutcome {
    pub job_id: String,
    pub notices: Vec<Notice>,
}

/// The build output handed from the build job to later jobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    /// Path uploaded by the build job
    pub path: String,
}

impl Artifact {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Artifact published by the document's build job, if there is one
    pub fn from_document(document: &Document) -> Option<Self> {
        let step = document.job(BUILD_JOB)?.find_action(UPLOAD_ARTIFACT_ACTION)?;
        let name = step.input("name").and_then(Value::as_str)?;
        let path = step.input("path").and_then(Value::as_str)?;
        Some(Self::new(name, path))
    }

    /// Whether the artifact is a single archive file rather than a directory
    pub fn is_file(&self) -> bool {
        [".zip", ".tgz", ".tar.gz"]
            .iter()
            .any(|ext| self.path.ends_with(ext))
    }

    /// Directory the artifact is downloaded into by later jobs
    pub fn download_dir(&self) -> &str {
        if self.is_file() {
            "."
        } else {
            &self.path
        }
    }

    pub fn upload_step(&self) -> Step {
        Step::uses("actions/upload-artifact@v4")
            .named("Upload build artifact")
            .input("name", self.name.as_str())
            .input("path", self.path.as_str())
            .into()
    }

    pub fn download_step(&self) -> Step {
        Step::uses("actions/download-artifact@v4")
            .named("Download build artifact")
            .input("name", self.name.as_str())
            .input("path", self.download_dir())
            .into()
    }
}

/// Adds build, test and deploy jobs to documents
pub struct JobAssembler<'a> {
    settings: AssemblerSettings,
    provisioner: &'a dyn CloudProvisioner,
}

impl<'a> JobAssembler<'a> {
    pub fn new(settings: AssemblerSettings, provisioner: &'a dyn CloudProvisioner) -> Self {
        Self {
            settings,
            provisioner,
        }
    }

    pub fn settings(&self) -> &AssemblerSettings {
        &self.settings
    }

    /// Add or augment the job for `action`, then re-resolve order and dependencies
    pub fn assemble(
        &self,
        document: &mut Document,
        action: ActionKind,
        answers: &mut dyn AnswerSource,
    ) -> WizardResult<AssemblyOutcome> {
        let outcome = match action {
            ActionKind::Build => build::assemble(&self.settings, document, answers)?,
            ActionKind::Test => test::assemble(&self.settings, document, answers)?,
            ActionKind::Deploy => {
                deploy::assemble(&self.settings, self.provisioner, document, answers)?
            }
        };

        document.retire_seed();
        DependencyResolver::resolve(document)?;
        info!(action = %action, job = %outcome.job_id, "job assembled");
        Ok(outcome)
    }

    /// Give a workflow without any trigger one, asking which
    ///
    /// Returns whether a trigger was added.
    pub fn ensure_trigger(
        &self,
        document: &mut Document,
        answers: &mut dyn AnswerSource,
    ) -> WizardResult<bool> {
        match test::plan_trigger(document, answers)? {
            Some(trigger) => {
                info!(trigger = %trigger.kind(), "workflow trigger added");
                document.add_trigger(trigger);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Test doubles shared by the assembler and template tests
#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use crate::errors::{WizardError, WizardResult};
    use crate::providers::{CloudProvisioner, RoleRequest};

    /// Provisioner that records requests and returns canned ARNs
    #[derive(Default)]
    pub struct RecordingProvisioner {
        pub fail: bool,
        pub requests: RefCell<Vec<(String, RoleRequest)>>,
    }

    impl RecordingProvisioner {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn record(&self, kind: &str, request: &RoleRequest) -> WizardResult<String> {
            if self.fail {
                return Err(WizardError::external("aws iam", "AccessDenied"));
            }
            self.requests
                .borrow_mut()
                .push((kind.to_string(), request.clone()));
            Ok(format!("arn:aws:iam::{}:role/{}-deploy", request.account_id, kind))
        }
    }

    impl CloudProvisioner for RecordingProvisioner {
        fn account_id(&self) -> WizardResult<String> {
            if self.fail {
                return Err(WizardError::external("aws sts", "Unable to locate credentials"));
            }
            Ok("123456789012".to_string())
        }

        fn create_role_for_s3_deploy(&self, request: &RoleRequest) -> WizardResult<String> {
            self.record("s3", request)
        }

        fn create_role_for_lambda_deploy(&self, request: &RoleRequest) -> WizardResult<String> {
            self.record("lambda", request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingProvisioner;
    use super::*;
    use crate::answers::{FixedAnswers, Repository};
    use crate::workflow::{TriggerKind, DEFAULT_RUNNER, DEPLOY_JOB_PREFIX, TEST_JOB};

    fn answers() -> FixedAnswers {
        FixedAnswers {
            repository: Some(Repository::new("octo", "site")),
            branch: Some("main".into()),
            test_command: Some("make test".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_action_kind_parsing() {
        assert_eq!("Deploy".parse::<ActionKind>().unwrap(), ActionKind::Deploy);
        assert!(matches!(
            "lint".parse::<ActionKind>(),
            Err(WizardError::UnknownAction { .. })
        ));
    }

    #[test]
    fn test_artifact_from_document() {
        let provisioner = RecordingProvisioner::default();
        let assembler = JobAssembler::new(AssemblerSettings::default(), &provisioner);
        let mut doc = Document::new();
        assert!(Artifact::from_document(&doc).is_none());

        let mut answers = FixedAnswers {
            build_type: Some(BuildType::Zip),
            ..answers()
        };
        assembler
            .assemble(&mut doc, ActionKind::Build, &mut answers)
            .unwrap();

        let artifact = Artifact::from_document(&doc).unwrap();
        assert_eq!(artifact, Artifact::new("build-artifact", "build.zip"));
        assert!(artifact.is_file());
        assert_eq!(artifact.download_dir(), ".");
    }

    #[test]
    fn test_build_test_deploy_scenario() {
        let provisioner = RecordingProvisioner::default();
        let assembler = JobAssembler::new(AssemblerSettings::default(), &provisioner);
        let mut doc = Document::new();

        let mut answers = FixedAnswers {
            build_type: Some(BuildType::Copy),
            deploy_target: Some(DeployTarget::AwsS3),
            deploy_trigger: Some(TriggerKind::Push),
            s3_path: Some("my-bucket/site".into()),
            ..answers()
        };

        assembler.assemble(&mut doc, ActionKind::Build, &mut answers).unwrap();
        assembler.assemble(&mut doc, ActionKind::Test, &mut answers).unwrap();
        let outcome = assembler
            .assemble(&mut doc, ActionKind::Deploy, &mut answers)
            .unwrap();

        assert_eq!(outcome.job_id, format!("{}aws_s3", DEPLOY_JOB_PREFIX));
        assert_eq!(doc.job_ids(), vec!["build", "test", "deploy_to_aws_s3"]);
        assert_eq!(doc.job(TEST_JOB).unwrap().needs, vec!["build"]);

        let deploy = doc.job("deploy_to_aws_s3").unwrap();
        assert_eq!(deploy.needs, vec!["test"]);
        assert!(deploy.guard.as_deref().unwrap().contains("refs/heads/main"));
        assert_eq!(
            deploy.permissions.get("id-token").map(String::as_str),
            Some("write")
        );
        assert_eq!(
            outcome.notices[0].value.as_deref(),
            Some("arn:aws:iam::123456789012:role/s3-deploy")
        );
    }

    #[test]
    fn test_trigger_added_only_when_missing() {
        let provisioner = RecordingProvisioner::default();
        let assembler = JobAssembler::new(AssemblerSettings::default(), &provisioner);
        let mut doc = Document::new();
        let mut answers = FixedAnswers {
            test_command: Some("pytest".into()),
            test_trigger: Some(TriggerKind::Schedule),
            cron: Some("0 3 * * *".into()),
            ..answers()
        };

        assembler.assemble(&mut doc, ActionKind::Test, &mut answers).unwrap();
        assert!(doc.triggers.is_empty());

        assert!(assembler.ensure_trigger(&mut doc, &mut answers).unwrap());
        assert!(doc.triggers.has(TriggerKind::Schedule));
        assert!(!assembler.ensure_trigger(&mut doc, &mut answers).unwrap());
    }

    #[test]
    fn test_seed_job_dropped_by_first_assembly() {
        let provisioner = RecordingProvisioner::default();
        let assembler = JobAssembler::new(AssemblerSettings::default(), &provisioner);
        let mut doc = Document::with_legacy_job(DEFAULT_RUNNER);
        let mut answers = FixedAnswers {
            build_type: Some(BuildType::Hugo),
            ..answers()
        };

        assembler.assemble(&mut doc, ActionKind::Build, &mut answers).unwrap();
        assert_eq!(doc.job_ids(), vec!["build"]);
    }

    #[test]
    fn test_notice_display() {
        let notice = Notice::variable("S3_DEPLOY_ROLE", Some("arn:x".into()), "role");
        assert_eq!(notice.to_string(), "Set GitHub repo variable S3_DEPLOY_ROLE to arn:x");
        let notice = Notice::secret("NPM_TOKEN", "an npm access token");
        assert_eq!(
            notice.to_string(),
            "Set GitHub repo secret NPM_TOKEN (an npm access token)"
        );
    }
}
