// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Test jobs

use tracing::debug;

use super::{Artifact, AssemblerSettings, AssemblyOutcome, DOWNLOAD_ARTIFACT_ACTION};
use crate::answers::AnswerSource;
use crate::errors::WizardResult;
use crate::workflow::{checkout_step, Document, Step, Trigger, TriggerKind, TEST_JOB};

/// Ask for a trigger when the workflow would otherwise never run
pub(super) fn plan_trigger(
    document: &Document,
    answers: &mut dyn AnswerSource,
) -> WizardResult<Option<Trigger>> {
    if !document.triggers.is_empty() {
        return Ok(None);
    }

    let trigger = match answers.test_trigger()? {
        TriggerKind::Push => Trigger::push(answers.branch_name()?),
        TriggerKind::Release => Trigger::release_created(),
        TriggerKind::Schedule => Trigger::schedule(answers.cron_schedule()?),
    };
    Ok(Some(trigger))
}

/// Create the test job or append another test step to it
///
/// The job checks out the repository once and, when a build job exists,
/// downloads its artifact once. Every call appends one test step.
pub(super) fn assemble(
    settings: &AssemblerSettings,
    document: &mut Document,
    answers: &mut dyn AnswerSource,
) -> WizardResult<AssemblyOutcome> {
    let command = answers.test_command()?;
    let artifact = Artifact::from_document(document);
    debug!(command = %command, with_artifact = artifact.is_some(), "planned test step");

    let job = document.ensure_job(TEST_JOB, &settings.runner);
    job.push_step_once(checkout_step());
    if let Some(artifact) = artifact {
        if job.find_action(DOWNLOAD_ARTIFACT_ACTION).is_none() {
            job.steps.push(artifact.download_step());
        }
    }
    job.steps.push(Step::run(command).named("Run tests").into());

    Ok(AssemblyOutcome {
        job_id: TEST_JOB.to_string(),
        notices: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::FixedAnswers;
    use crate::assembler::BuildType;
    use crate::workflow::BUILD_JOB;

    fn answers(command: &str) -> FixedAnswers {
        FixedAnswers {
            test_command: Some(command.into()),
            test_trigger: Some(TriggerKind::Schedule),
            cron: Some("0 3 * * *".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_without_build_checks_out() {
        let mut doc = Document::new();
        assemble(&AssemblerSettings::default(), &mut doc, &mut answers("pytest")).unwrap();

        assert!(doc.triggers.is_empty());
        let job = doc.job(TEST_JOB).unwrap();
        assert_eq!(job.steps.len(), 2);
        assert_eq!(job.steps[0], checkout_step());
        assert!(job.find_action(DOWNLOAD_ARTIFACT_ACTION).is_none());
    }

    #[test]
    fn test_trigger_asked_only_without_one() {
        let mut doc = Document::new();
        assert_eq!(
            plan_trigger(&doc, &mut answers("pytest")).unwrap(),
            Some(Trigger::schedule("0 3 * * *"))
        );

        doc.add_trigger(Trigger::push("main"));
        let mut answers = FixedAnswers::default();
        assert_eq!(plan_trigger(&doc, &mut answers).unwrap(), None);
    }

    #[test]
    fn test_repeated_tests_download_once() {
        let mut doc = Document::new();
        doc.add_trigger(Trigger::push("main"));
        doc.ensure_job(BUILD_JOB, "ubuntu-latest").steps = BuildType::Zip.steps("build-artifact");

        let settings = AssemblerSettings::default();
        assemble(&settings, &mut doc, &mut answers("make unit")).unwrap();
        assemble(&settings, &mut doc, &mut answers("make integration")).unwrap();

        let job = doc.job(TEST_JOB).unwrap();
        let downloads = job
            .steps
            .iter()
            .filter(|s| s.uses_action(DOWNLOAD_ARTIFACT_ACTION))
            .count();
        assert_eq!(downloads, 1);
        assert_eq!(job.steps.len(), 4);
        assert_eq!(job.steps[3].name(), Some("Run tests"));
    }
}
