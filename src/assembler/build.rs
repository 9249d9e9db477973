// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Build jobs

use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::{AssemblerSettings, AssemblyOutcome, Artifact};
use crate::answers::AnswerSource;
use crate::errors::{WizardError, WizardResult};
use crate::providers::{NpmRegistry, PackageRegistry, PythonRegistry};
use crate::workflow::{checkout_step, Document, Step, BUILD_JOB};

/// How the project is turned into a build artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    /// Publish the repository contents as they are
    Copy,
    /// Publish the repository as a single zip archive
    Zip,
    PythonBuild,
    NpmBuild,
    Hugo,
}

impl BuildType {
    pub const ALL: [BuildType; 5] = [
        Self::Copy,
        Self::Zip,
        Self::PythonBuild,
        Self::NpmBuild,
        Self::Hugo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Zip => "zip",
            Self::PythonBuild => "python_build",
            Self::NpmBuild => "npm_build",
            Self::Hugo => "hugo",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Copy => "Use the repository files as they are",
            Self::Zip => "Zip the repository files",
            Self::PythonBuild => "Build a Python sdist and wheel",
            Self::NpmBuild => "Build and pack an npm package",
            Self::Hugo => "Build a Hugo static site",
        }
    }

    /// Path the build job uploads as its artifact
    pub fn output_path(&self) -> &'static str {
        match self {
            Self::Copy => ".",
            Self::Zip => "build.zip",
            Self::PythonBuild => "dist",
            Self::NpmBuild => "package.tgz",
            Self::Hugo => "public",
        }
    }

    /// Steps between checkout and artifact upload
    fn strategy_steps(&self) -> Vec<Step> {
        match self {
            Self::Copy => Vec::new(),
            Self::Zip => vec![Step::run(format!(
                "zip -r {} . -x '.git/*' '.github/*'",
                self.output_path()
            ))
            .named("Create zip archive")
            .into()],
            Self::PythonBuild => {
                let registry = PythonRegistry::default();
                vec![
                    registry.setup_environment(),
                    registry.install_dependencies(),
                    registry.build_package(),
                ]
            }
            Self::NpmBuild => {
                let registry = NpmRegistry::default();
                vec![
                    registry.setup_environment(),
                    registry.install_dependencies(),
                    registry.build_package(),
                ]
            }
            Self::Hugo => vec![
                Step::uses("peaceiris/actions-hugo@v3")
                    .named("Setup Hugo")
                    .input("hugo-version", "latest")
                    .input("extended", true)
                    .into(),
                Step::run("hugo --minify").named("Build site").into(),
            ],
        }
    }

    /// Complete step list of a build job
    pub fn steps(&self, artifact_name: &str) -> Vec<Step> {
        let mut steps = vec![checkout_step()];
        steps.extend(self.strategy_steps());
        steps.push(Artifact::new(artifact_name, self.output_path()).upload_step());
        steps
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "copy" | "none" => Ok(Self::Copy),
            "zip" => Ok(Self::Zip),
            "python_build" | "python" => Ok(Self::PythonBuild),
            "npm_build" | "npm" => Ok(Self::NpmBuild),
            "hugo" => Ok(Self::Hugo),
            _ => Err(WizardError::UnknownBuildType {
                build_type: s.to_string(),
            }),
        }
    }
}

/// Create the build job, or replace the steps of an existing one
pub(super) fn assemble(
    settings: &AssemblerSettings,
    document: &mut Document,
    answers: &mut dyn AnswerSource,
) -> WizardResult<AssemblyOutcome> {
    let build_type = answers.build_type()?;
    let steps = build_type.steps(&settings.artifact_name);
    debug!(build_type = %build_type, steps = steps.len(), "planned build job");

    document.ensure_job(BUILD_JOB, &settings.runner);
    document.replace_job_steps(BUILD_JOB, steps)?;

    Ok(AssemblyOutcome {
        job_id: BUILD_JOB.to_string(),
        notices: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::FixedAnswers;

    #[test]
    fn test_build_type_parsing() {
        assert_eq!("python-build".parse::<BuildType>().unwrap(), BuildType::PythonBuild);
        assert_eq!("HUGO".parse::<BuildType>().unwrap(), BuildType::Hugo);
        assert!(matches!(
            "maven".parse::<BuildType>(),
            Err(WizardError::UnknownBuildType { .. })
        ));
        for build_type in BuildType::ALL {
            assert_eq!(build_type.as_str().parse::<BuildType>().unwrap(), build_type);
        }
    }

    #[test]
    fn test_build_steps_shape() {
        for build_type in BuildType::ALL {
            let steps = build_type.steps("build-artifact");
            assert_eq!(steps.first(), Some(&checkout_step()));
            let upload = steps.last().unwrap();
            assert!(upload.uses_action("actions/upload-artifact"));
            assert_eq!(
                upload.input("path").and_then(|v| v.as_str()),
                Some(build_type.output_path())
            );
        }
        assert_eq!(BuildType::Copy.steps("a").len(), 2);
    }

    #[test]
    fn test_rebuild_replaces_steps() {
        let mut doc = Document::new();
        let settings = AssemblerSettings::default();

        let mut answers = FixedAnswers {
            build_type: Some(BuildType::Hugo),
            ..Default::default()
        };
        assemble(&settings, &mut doc, &mut answers).unwrap();
        answers.build_type = Some(BuildType::Zip);
        let outcome = assemble(&settings, &mut doc, &mut answers).unwrap();

        assert_eq!(outcome.job_id, BUILD_JOB);
        assert_eq!(doc.job_count(), 1);
        assert_eq!(doc.job(BUILD_JOB).unwrap().steps, BuildType::Zip.steps("build-artifact"));
    }

    #[test]
    fn test_missing_answer_leaves_document_untouched() {
        let mut doc = Document::new();
        let before = doc.clone();
        let result = assemble(&AssemblerSettings::default(), &mut doc, &mut FixedAnswers::default());
        assert!(matches!(result, Err(WizardError::MissingAnswer { .. })));
        assert_eq!(doc, before);
    }
}
