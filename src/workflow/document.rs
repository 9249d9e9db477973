// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Workflow document
//!
//! The in-memory source of truth for one workflow file: triggers, jobs and
//! any top-level settings this tool does not manage itself.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;

use super::job::{Environment, Job, RunsOn};
use super::layout::Layout;
use super::ordered::OrderedMap;
use super::step::Step;
use crate::errors::{WizardError, WizardResult};

/// Job seeded into documents created from scratch by older releases
pub const LEGACY_JOB_ID: &str = "deploy";

/// Action used to check out the repository
pub const CHECKOUT_ACTION: &str = "actions/checkout@v4";

fn default_name() -> String {
    "CI".to_string()
}

fn default_run_name() -> String {
    "CI for ${{ github.ref_name }}".to_string()
}

/// A GitHub Actions workflow document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "run-name", default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,

    #[serde(rename = "on", default)]
    pub triggers: Triggers,

    #[serde(default)]
    jobs: OrderedMap<Job>,

    /// Other top-level settings (concurrency, env, permissions, ...)
    #[serde(flatten)]
    extra: Mapping,

    /// Target file name chosen by a template, if any
    #[serde(skip)]
    pub file_name: Option<String>,

    /// Key order of the file this document was loaded from
    #[serde(skip)]
    layout: Layout,

    /// Whether the legacy job is still the untouched seed
    #[serde(skip)]
    seeded: bool,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            name: Some(default_name()),
            run_name: Some(default_run_name()),
            triggers: Triggers::default(),
            jobs: OrderedMap::new(),
            extra: Mapping::new(),
            file_name: None,
            layout: Layout::default(),
            seeded: false,
        }
    }

    /// Create a document holding the single checkout job older releases started from
    ///
    /// The seed job is dropped again by [`Document::retire_seed`] once another
    /// job is added, unless it was changed in between.
    pub fn with_legacy_job(runs_on: &str) -> Self {
        let mut doc = Self::new();
        doc.ensure_job(LEGACY_JOB_ID, runs_on)
            .steps
            .push(checkout_step());
        doc.seeded = true;
        doc
    }

    /// Drop the seeded legacy job if it is unchanged and other jobs exist
    pub fn retire_seed(&mut self) {
        if !self.seeded || self.job_count() < 2 {
            return;
        }
        self.seeded = false;

        let untouched = self.job(LEGACY_JOB_ID).is_some_and(|job| {
            job.needs.is_empty()
                && job.guard.is_none()
                && job.environment.is_none()
                && job.permissions.is_empty()
                && job.steps == [checkout_step()]
        });
        if untouched {
            self.jobs.remove(LEGACY_JOB_ID);
        }
    }

    /// Set the display name, and the run name when given
    pub fn set_name(&mut self, name: impl Into<String>, run_name: Option<String>) {
        self.name = Some(name.into());
        if let Some(run_name) = run_name {
            self.run_name = Some(run_name);
        }
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    /// Add or merge a trigger
    pub fn add_trigger(&mut self, trigger: Trigger) {
        self.triggers.add(trigger);
    }

    /// Return the job with `id`, creating it at the end of the job order if absent
    pub fn ensure_job(&mut self, id: &str, runs_on: &str) -> &mut Job {
        self.jobs.get_or_insert_with(id, || Job::new(runs_on))
    }

    pub fn has_job(&self, id: &str) -> bool {
        self.jobs.contains_key(id)
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn job_mut(&mut self, id: &str) -> WizardResult<&mut Job> {
        self.jobs.get_mut(id).ok_or_else(|| WizardError::UnknownJob {
            job: id.to_string(),
        })
    }

    /// Job ids in their current order
    pub fn job_ids(&self) -> Vec<String> {
        self.jobs.keys().map(String::from).collect()
    }

    pub fn jobs(&self) -> impl Iterator<Item = (&str, &Job)> {
        self.jobs.iter()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn set_job_field(&mut self, id: &str, field: JobField) -> WizardResult<()> {
        let job = self.job_mut(id)?;
        match field {
            JobField::RunsOn(runs_on) => job.runs_on = runs_on,
            JobField::Guard(guard) => job.guard = guard,
            JobField::Needs(needs) => job.needs = needs,
            JobField::Environment(env) => job.environment = env,
        }
        Ok(())
    }

    pub fn add_job_permission(&mut self, id: &str, scope: &str, level: &str) -> WizardResult<()> {
        self.job_mut(id)?.grant(scope, level);
        Ok(())
    }

    pub fn add_job_step(&mut self, id: &str, step: impl Into<Step>) -> WizardResult<()> {
        self.job_mut(id)?.steps.push(step.into());
        Ok(())
    }

    pub fn replace_job_steps(&mut self, id: &str, steps: Vec<Step>) -> WizardResult<()> {
        self.job_mut(id)?.steps = steps;
        Ok(())
    }

    /// Upsert a top-level setting such as `concurrency`
    pub fn set_document_field(&mut self, key: &str, value: Value) {
        self.extra.insert(Value::String(key.to_string()), value);
    }

    pub fn document_field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Replace the job order. `new_order` must be a permutation of the current ids.
    pub fn reorder_jobs<S: AsRef<str>>(&mut self, new_order: &[S]) -> WizardResult<()> {
        if self.jobs.reorder(new_order) {
            Ok(())
        } else {
            Err(WizardError::OrderMismatch {
                current: self.job_ids(),
                requested: new_order.iter().map(|s| s.as_ref().to_string()).collect(),
            })
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Checkout step shared by build, test and legacy jobs
pub fn checkout_step() -> Step {
    Step::uses(CHECKOUT_ACTION).named("Checkout").into()
}

/// A single job attribute for [`Document::set_job_field`]
#[derive(Debug, Clone, PartialEq)]
pub enum JobField {
    RunsOn(RunsOn),
    Guard(Option<String>),
    Needs(Vec<String>),
    Environment(Option<Environment>),
}

/// Trigger kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Push,
    Release,
    Schedule,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Release => "release",
            Self::Schedule => "schedule",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "push" | "commit" => Ok(Self::Push),
            "release" => Ok(Self::Release),
            "schedule" | "periodic" | "cron" => Ok(Self::Schedule),
            _ => Err(WizardError::UnknownTrigger {
                trigger: s.to_string(),
            }),
        }
    }
}

/// A trigger to add to a document
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Pushes to the given branches
    Push { branches: Vec<String> },
    /// Release events of the given types
    Release { types: Vec<String> },
    /// Cron schedules
    Schedule { crons: Vec<String> },
}

impl Trigger {
    pub fn push(branch: impl Into<String>) -> Self {
        Self::Push {
            branches: vec![branch.into()],
        }
    }

    /// Release trigger reacting to newly created releases
    pub fn release_created() -> Self {
        Self::Release {
            types: vec!["created".to_string()],
        }
    }

    pub fn schedule(cron: impl Into<String>) -> Self {
        Self::Schedule {
            crons: vec![cron.into()],
        }
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Push { .. } => TriggerKind::Push,
            Self::Release { .. } => TriggerKind::Release,
            Self::Schedule { .. } => TriggerKind::Schedule,
        }
    }
}

/// The `on:` block of a workflow
///
/// Accepts the mapping form as well as a single event name (`on: push`) or
/// a list of names (`on: [push, pull_request]`). A name list is written back
/// as one while every event in it stays bare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TriggersForm", into = "TriggersForm")]
pub struct Triggers {
    pub push: Option<PushTrigger>,
    pub release: Option<ReleaseTrigger>,
    pub schedule: Option<Vec<CronEntry>>,

    /// Trigger kinds this tool does not manage (workflow_dispatch, pull_request, ...)
    extra: Mapping,

    /// Event names as written when the block was not a mapping
    names: Option<Vec<String>>,
}

impl Triggers {
    pub fn is_empty(&self) -> bool {
        self.push.is_none()
            && self.release.is_none()
            && self.schedule.is_none()
            && self.extra.is_empty()
    }

    pub fn has(&self, kind: TriggerKind) -> bool {
        match kind {
            TriggerKind::Push => self.push.is_some(),
            TriggerKind::Release => self.release.is_some(),
            TriggerKind::Schedule => self.schedule.is_some(),
        }
    }

    fn add(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Push { branches } => {
                // A bare push already fires for every branch
                if self.push.as_ref().is_some_and(Bare::is_bare) {
                    return;
                }
                let push = self.push.get_or_insert_with(PushTrigger::default);
                for branch in branches {
                    if !push.branches.contains(&branch) {
                        push.branches.push(branch);
                    }
                }
            }
            Trigger::Release { types } => {
                self.release = Some(ReleaseTrigger {
                    types,
                    extra: Mapping::new(),
                });
            }
            Trigger::Schedule { crons } => {
                self.schedule = Some(crons.into_iter().map(|cron| CronEntry { cron }).collect());
            }
        }
    }

    fn is_bare(&self) -> bool {
        self.push.as_ref().map_or(true, Bare::is_bare)
            && self.release.as_ref().map_or(true, Bare::is_bare)
            && self.schedule.is_none()
            && self.extra.values().all(Value::is_null)
    }

    /// Names of the events present, in `names` order first
    fn event_names(&self, names: &[String]) -> Vec<String> {
        let mut present: Vec<String> = Vec::new();
        if self.push.is_some() {
            present.push(TriggerKind::Push.as_str().to_string());
        }
        if self.release.is_some() {
            present.push(TriggerKind::Release.as_str().to_string());
        }
        present.extend(self.extra.keys().filter_map(Value::as_str).map(String::from));

        let mut ordered: Vec<String> = names
            .iter()
            .filter(|name| present.contains(name))
            .cloned()
            .collect();
        for name in present {
            if !ordered.contains(&name) {
                ordered.push(name);
            }
        }
        ordered
    }

    fn from_names(names: Vec<String>) -> Self {
        let mut triggers = Self::default();
        for name in &names {
            match name.as_str() {
                "push" => triggers.push = Some(PushTrigger::default()),
                "release" => triggers.release = Some(ReleaseTrigger::default()),
                other => {
                    triggers
                        .extra
                        .insert(Value::String(other.to_string()), Value::Null);
                }
            }
        }
        triggers.names = Some(names);
        triggers
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TriggersForm {
    Name(String),
    Names(Vec<String>),
    Map(TriggerMap),
}

#[derive(Default, Serialize, Deserialize)]
struct TriggerMap {
    #[serde(
        default,
        deserialize_with = "bare::deserialize",
        serialize_with = "bare::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    push: Option<PushTrigger>,

    #[serde(
        default,
        deserialize_with = "bare::deserialize",
        serialize_with = "bare::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    release: Option<ReleaseTrigger>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<CronEntry>>,

    #[serde(flatten)]
    extra: Mapping,
}

impl From<TriggersForm> for Triggers {
    fn from(form: TriggersForm) -> Self {
        match form {
            TriggersForm::Name(name) => Self::from_names(vec![name]),
            TriggersForm::Names(names) => Self::from_names(names),
            TriggersForm::Map(map) => Self {
                push: map.push,
                release: map.release,
                schedule: map.schedule,
                extra: map.extra,
                names: None,
            },
        }
    }
}

impl From<Triggers> for TriggersForm {
    fn from(triggers: Triggers) -> Self {
        if let Some(names) = &triggers.names {
            if triggers.is_bare() && !triggers.is_empty() {
                let mut names = triggers.event_names(names);
                return match names.len() {
                    1 => Self::Name(names.remove(0)),
                    _ => Self::Names(names),
                };
            }
        }
        Self::Map(TriggerMap {
            push: triggers.push,
            release: triggers.release,
            schedule: triggers.schedule,
            extra: triggers.extra,
        })
    }
}

/// An event key without settings (`push:`) means "all of them"
trait Bare {
    fn is_bare(&self) -> bool;
}

/// `push:` with no value reads as a default trigger and is written back empty
mod bare {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
    }

    pub(super) fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize + super::Bare,
    {
        match value {
            Some(trigger) if !trigger.is_bare() => trigger.serialize(serializer),
            _ => serializer.serialize_unit(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushTrigger {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    /// Other filters (tags, paths, branches-ignore, ...)
    #[serde(flatten)]
    extra: Mapping,
}

impl Bare for PushTrigger {
    fn is_bare(&self) -> bool {
        self.branches.is_empty() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseTrigger {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,

    #[serde(flatten)]
    extra: Mapping,
}

impl Bare for ReleaseTrigger {
    fn is_bare(&self) -> bool {
        self.types.is_empty() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CronEntry {
    pub cron: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::DEFAULT_RUNNER;

    #[test]
    fn test_push_trigger_unions_branches() {
        let mut doc = Document::new();
        doc.add_trigger(Trigger::push("main"));
        doc.add_trigger(Trigger::push("dev"));
        doc.add_trigger(Trigger::push("main"));

        let push = doc.triggers.push.as_ref().unwrap();
        assert_eq!(push.branches, vec!["main", "dev"]);
    }

    #[test]
    fn test_release_and_schedule_replace() {
        let mut doc = Document::new();
        doc.add_trigger(Trigger::Release {
            types: vec!["published".into()],
        });
        doc.add_trigger(Trigger::release_created());
        doc.add_trigger(Trigger::schedule("0 0 * * *"));
        doc.add_trigger(Trigger::schedule("30 5 * * 1"));

        assert_eq!(doc.triggers.release.as_ref().unwrap().types, vec!["created"]);
        let schedule = doc.triggers.schedule.as_ref().unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].cron, "30 5 * * 1");
        assert!(doc.triggers.has(TriggerKind::Release));
        assert!(!doc.triggers.has(TriggerKind::Push));
    }

    #[test]
    fn test_ensure_job_is_idempotent() {
        let mut doc = Document::new();
        doc.ensure_job("build", DEFAULT_RUNNER).steps.push(checkout_step());
        doc.ensure_job("test", DEFAULT_RUNNER);
        doc.ensure_job("build", "windows-latest");

        assert_eq!(doc.job_ids(), vec!["build", "test"]);
        let build = doc.job("build").unwrap();
        assert_eq!(build.runs_on, DEFAULT_RUNNER);
        assert_eq!(build.steps.len(), 1);
    }

    #[test]
    fn test_job_mutators_reject_unknown_job() {
        let mut doc = Document::new();
        let err = doc
            .set_job_field("missing", JobField::Guard(Some("true".into())))
            .unwrap_err();
        assert!(matches!(err, WizardError::UnknownJob { ref job } if job == "missing"));
        assert!(doc.add_job_permission("missing", "contents", "read").is_err());
        assert!(doc.add_job_step("missing", checkout_step()).is_err());
    }

    #[test]
    fn test_set_job_field() {
        let mut doc = Document::new();
        doc.ensure_job("deploy_to_npm", DEFAULT_RUNNER);
        doc.set_job_field("deploy_to_npm", JobField::Needs(vec!["build".into()]))
            .unwrap();
        doc.set_job_field("deploy_to_npm", JobField::RunsOn("macos-latest".into()))
            .unwrap();
        doc.add_job_permission("deploy_to_npm", "contents", "read").unwrap();

        let job = doc.job("deploy_to_npm").unwrap();
        assert_eq!(job.needs, vec!["build"]);
        assert_eq!(job.runs_on, "macos-latest");
        assert_eq!(job.permissions.get("contents").map(String::as_str), Some("read"));
    }

    #[test]
    fn test_reorder_rejects_missing_job() {
        let mut doc = Document::new();
        for id in ["build", "test", "deploy_to_aws_s3"] {
            doc.ensure_job(id, DEFAULT_RUNNER);
        }

        let err = doc.reorder_jobs(&["test", "build"]).unwrap_err();
        assert!(matches!(err, WizardError::OrderMismatch { .. }));
        assert_eq!(doc.job_ids(), vec!["build", "test", "deploy_to_aws_s3"]);

        doc.reorder_jobs(&["deploy_to_aws_s3", "build", "test"]).unwrap();
        assert_eq!(doc.job_ids(), vec!["deploy_to_aws_s3", "build", "test"]);
    }

    #[test]
    fn test_set_name_keeps_run_name_unless_given() {
        let mut doc = Document::new();
        let run_name = doc.run_name.clone();

        doc.set_name("Release", None);
        assert_eq!(doc.name.as_deref(), Some("Release"));
        assert_eq!(doc.run_name, run_name);

        doc.set_name("Release", Some("Release ${{ github.ref_name }}".into()));
        assert_eq!(doc.run_name.as_deref(), Some("Release ${{ github.ref_name }}"));
    }

    #[test]
    fn test_legacy_job_seed() {
        let doc = Document::with_legacy_job(DEFAULT_RUNNER);
        assert_eq!(doc.job_ids(), vec![LEGACY_JOB_ID]);
        assert!(doc
            .job(LEGACY_JOB_ID)
            .unwrap()
            .find_action("actions/checkout")
            .is_some());
    }

    #[test]
    fn test_parse_workflow_preserves_unmanaged_fields() {
        let yaml = r#"
name: Release
run-name: Release ${{ github.ref_name }}
on:
  workflow_dispatch: {}
  push:
    branches: [main]
    paths: ["src/**"]
concurrency:
  group: release
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
"#;
        let doc: Document = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.name.as_deref(), Some("Release"));
        assert_eq!(doc.job_ids(), vec!["build"]);
        assert!(doc.document_field("concurrency").is_some());

        let out = serde_yaml::to_string(&doc).unwrap();
        assert!(out.contains("workflow_dispatch"));
        assert!(out.contains("paths:"));
        assert!(out.contains("concurrency:"));
    }

    #[test]
    fn test_bare_triggers_survive() {
        let doc: Document =
            serde_yaml::from_str("on:\n  push:\n  release:\n  workflow_dispatch:\njobs: {}\n")
                .unwrap();
        assert!(doc.triggers.has(TriggerKind::Push));
        assert!(doc.triggers.has(TriggerKind::Release));

        let out = serde_yaml::to_string(&doc).unwrap();
        assert!(out.contains("  push: null\n"), "{out}");
        assert!(out.contains("  release: null\n"), "{out}");
        assert!(out.contains("  workflow_dispatch: null\n"), "{out}");
    }

    #[test]
    fn test_push_filters_without_branches() {
        let doc: Document =
            serde_yaml::from_str("on:\n  push:\n    tags:\n    - v*\njobs: {}\n").unwrap();
        let out = serde_yaml::to_string(&doc).unwrap();
        assert!(out.contains("tags:"));
        assert!(!out.contains("branches"));
    }

    #[test]
    fn test_push_onto_bare_push_keeps_every_branch() {
        let mut doc: Document = serde_yaml::from_str("on:\n  push:\njobs: {}\n").unwrap();
        doc.add_trigger(Trigger::push("main"));
        assert!(doc.triggers.push.as_ref().unwrap().branches.is_empty());
    }

    #[test]
    fn test_event_name_shorthand() {
        let doc: Document = serde_yaml::from_str("on: push\njobs: {}\n").unwrap();
        assert!(doc.triggers.has(TriggerKind::Push));
        assert!(serde_yaml::to_string(&doc).unwrap().contains("on: push\n"));

        let mut doc: Document =
            serde_yaml::from_str("on: [pull_request, push]\njobs: {}\n").unwrap();
        assert!(doc.triggers.has(TriggerKind::Push));
        assert!(serde_yaml::to_string(&doc)
            .unwrap()
            .contains("on:\n- pull_request\n- push\n"));

        // Settings force the mapping form
        doc.add_trigger(Trigger::release_created());
        let out = serde_yaml::to_string(&doc).unwrap();
        assert!(out.contains("  pull_request: null\n"), "{out}");
        assert!(out.contains("  push: null\n"), "{out}");
        assert!(out.contains("    - created\n"), "{out}");
    }

    #[test]
    fn test_seed_job_retired_once_jobs_are_added() {
        let mut doc = Document::with_legacy_job(DEFAULT_RUNNER);
        doc.retire_seed();
        assert_eq!(doc.job_ids(), vec![LEGACY_JOB_ID]);

        doc.ensure_job("build", DEFAULT_RUNNER);
        doc.retire_seed();
        assert_eq!(doc.job_ids(), vec!["build"]);

        let mut doc = Document::with_legacy_job(DEFAULT_RUNNER);
        doc.add_job_step(LEGACY_JOB_ID, Step::run("make deploy")).unwrap();
        doc.ensure_job("build", DEFAULT_RUNNER);
        doc.retire_seed();
        assert_eq!(doc.job_ids(), vec![LEGACY_JOB_ID, "build"]);
    }

    #[test]
    fn test_trigger_kind_from_str() {
        assert_eq!("push".parse::<TriggerKind>().unwrap(), TriggerKind::Push);
        assert_eq!("periodic".parse::<TriggerKind>().unwrap(), TriggerKind::Schedule);
        assert!(matches!(
            "nightly".parse::<TriggerKind>(),
            Err(WizardError::UnknownTrigger { .. })
        ));
    }
}
