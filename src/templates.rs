// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Workflow templates
//!
//! A template is a build type plus a deploy target. Applying it runs the
//! normal assembler with those two answers preset; every other question
//! goes to the caller's answer source.

use tracing::info;

use crate::answers::{AnswerSource, Repository};
use crate::assembler::{ActionKind, AssemblyOutcome, BuildType, DeployTarget, JobAssembler};
use crate::errors::{WizardError, WizardResult};
use crate::workflow::{Document, TriggerKind};

/// File every template writes to
pub const CI_DEPLOY_FILE: &str = "ci_deploy_workflow.yml";

/// A named build and deploy combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    pub build_type: BuildType,
    pub deploy_target: DeployTarget,
    pub file_name: &'static str,
}

pub static TEMPLATES: &[Template] = &[
    Template {
        name: "python_package",
        description: "Build a Python package and publish it to PyPI",
        build_type: BuildType::PythonBuild,
        deploy_target: DeployTarget::Pypi,
        file_name: CI_DEPLOY_FILE,
    },
    Template {
        name: "static_hugo_website",
        description: "Build a Hugo site and publish it to GitHub Pages",
        build_type: BuildType::Hugo,
        deploy_target: DeployTarget::GithubPages,
        file_name: CI_DEPLOY_FILE,
    },
    Template {
        name: "static_s3_website",
        description: "Sync the repository files to an S3 bucket",
        build_type: BuildType::Copy,
        deploy_target: DeployTarget::AwsS3,
        file_name: CI_DEPLOY_FILE,
    },
    Template {
        name: "lambda_deploy",
        description: "Zip the repository and update an AWS Lambda function",
        build_type: BuildType::Zip,
        deploy_target: DeployTarget::AwsLambda,
        file_name: CI_DEPLOY_FILE,
    },
    Template {
        name: "itch.io",
        description: "Zip the repository and push it to itch.io",
        build_type: BuildType::Zip,
        deploy_target: DeployTarget::ItchIo,
        file_name: CI_DEPLOY_FILE,
    },
];

/// Look up a template by name
pub fn find_template(name: &str) -> WizardResult<&'static Template> {
    TEMPLATES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| WizardError::UnknownTemplate {
            template: name.to_string(),
        })
}

/// Answers preset by a template, falling back to another source
pub struct TemplateAnswers<'a> {
    template: &'a Template,
    fallback: &'a mut dyn AnswerSource,
}

impl<'a> TemplateAnswers<'a> {
    pub fn new(template: &'a Template, fallback: &'a mut dyn AnswerSource) -> Self {
        Self { template, fallback }
    }
}

impl AnswerSource for TemplateAnswers<'_> {
    fn action_kind(&mut self) -> WizardResult<ActionKind> {
        self.fallback.action_kind()
    }

    fn template_name(&mut self) -> WizardResult<Option<String>> {
        Ok(Some(self.template.name.to_string()))
    }

    fn workflow_file_name(&mut self, _default: &str) -> WizardResult<String> {
        Ok(self.template.file_name.to_string())
    }

    fn build_type(&mut self) -> WizardResult<BuildType> {
        Ok(self.template.build_type)
    }

    fn deploy_target(&mut self) -> WizardResult<DeployTarget> {
        Ok(self.template.deploy_target)
    }

    fn deploy_trigger(&mut self) -> WizardResult<TriggerKind> {
        self.fallback.deploy_trigger()
    }

    fn test_trigger(&mut self) -> WizardResult<TriggerKind> {
        self.fallback.test_trigger()
    }

    fn branch_name(&mut self) -> WizardResult<String> {
        self.fallback.branch_name()
    }

    fn cron_schedule(&mut self) -> WizardResult<String> {
        self.fallback.cron_schedule()
    }

    fn repository(&mut self) -> WizardResult<Repository> {
        self.fallback.repository()
    }

    fn s3_path(&mut self) -> WizardResult<String> {
        self.fallback.s3_path()
    }

    fn lambda_function_name(&mut self) -> WizardResult<String> {
        self.fallback.lambda_function_name()
    }

    fn test_command(&mut self) -> WizardResult<String> {
        self.fallback.test_command()
    }

    fn add_another(&mut self) -> WizardResult<bool> {
        Ok(false)
    }
}

/// Applies templates to documents
pub struct TemplateApplier;

impl TemplateApplier {
    /// Add the template's build and deploy jobs and set its target file name
    ///
    /// All-or-nothing: on any failure the document is left as it was.
    pub fn apply(
        assembler: &JobAssembler<'_>,
        document: &mut Document,
        name: &str,
        answers: &mut dyn AnswerSource,
    ) -> WizardResult<Vec<AssemblyOutcome>> {
        let template = find_template(name)?;
        let mut preset = TemplateAnswers::new(template, answers);

        let mut draft = document.clone();
        let mut outcomes = Vec::new();
        for action in [ActionKind::Build, ActionKind::Deploy] {
            outcomes.push(assembler.assemble(&mut draft, action, &mut preset)?);
        }
        draft.file_name = Some(template.file_name.to_string());

        *document = draft;
        info!(template = template.name, "template applied");
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::FixedAnswers;
    use crate::assembler::testing::RecordingProvisioner;
    use crate::assembler::AssemblerSettings;

    fn push_main() -> FixedAnswers {
        FixedAnswers {
            deploy_trigger: Some(TriggerKind::Push),
            branch: Some("main".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_hugo_template() {
        let provisioner = RecordingProvisioner::default();
        let assembler = JobAssembler::new(AssemblerSettings::default(), &provisioner);
        let mut doc = Document::new();

        let outcomes =
            TemplateApplier::apply(&assembler, &mut doc, "static_hugo_website", &mut push_main())
                .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(doc.job_ids(), vec!["build", "deploy_to_github_pages"]);
        assert_eq!(doc.file_name.as_deref(), Some(CI_DEPLOY_FILE));
        assert_eq!(doc.job("deploy_to_github_pages").unwrap().needs, vec!["build"]);
    }

    #[test]
    fn test_unknown_template_leaves_document_untouched() {
        let provisioner = RecordingProvisioner::default();
        let assembler = JobAssembler::new(AssemblerSettings::default(), &provisioner);
        let mut doc = Document::new();
        let before = doc.clone();

        let result = TemplateApplier::apply(&assembler, &mut doc, "rails_app", &mut push_main());
        assert!(matches!(result, Err(WizardError::UnknownTemplate { .. })));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_failed_deploy_rolls_back_build() {
        let provisioner = RecordingProvisioner::failing();
        let assembler = JobAssembler::new(AssemblerSettings::default(), &provisioner);
        let mut doc = Document::new();
        let mut answers = FixedAnswers {
            repository: Some(Repository::new("octo", "fn")),
            lambda_function: Some("handler".into()),
            ..push_main()
        };

        let result = TemplateApplier::apply(&assembler, &mut doc, "lambda_deploy", &mut answers);
        assert!(result.is_err());
        assert_eq!(doc.job_count(), 0);
        assert!(doc.file_name.is_none());
    }

    #[test]
    fn test_every_template_names_a_valid_file() {
        for template in TEMPLATES {
            assert!(crate::answers::check_workflow_file(template.file_name).is_ok());
            assert!(find_template(template.name).is_ok());
        }
    }
}
