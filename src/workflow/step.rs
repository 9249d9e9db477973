// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Workflow steps
//!
//! A step is either a shell command (`run`) or a reusable action (`uses`).

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Default shell interpreter for run steps
pub const DEFAULT_SHELL: &str = "bash";

/// A single step within a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Invocation of a reusable action
    Action(ActionStep),
    /// Shell command
    Run(RunStep),
}

impl Step {
    /// Build a run step with the default shell
    pub fn run(command: impl Into<String>) -> RunStep {
        RunStep {
            name: None,
            id: None,
            run: command.into(),
            shell: Some(DEFAULT_SHELL.to_string()),
            extra: Mapping::new(),
        }
    }

    /// Build a run step from several commands, one per line
    pub fn run_lines<I, S>(commands: I) -> RunStep
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = commands
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        Self::run(lines.join("\n"))
    }

    /// Build an action step
    pub fn uses(action: impl Into<String>) -> ActionStep {
        ActionStep {
            name: None,
            id: None,
            uses: action.into(),
            with: Mapping::new(),
            extra: Mapping::new(),
        }
    }

    /// Display name, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Action(s) => s.name.as_deref(),
            Self::Run(s) => s.name.as_deref(),
        }
    }

    /// Step id, if any
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Action(s) => s.id.as_deref(),
            Self::Run(s) => s.id.as_deref(),
        }
    }

    /// Action reference for action steps
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::Action(s) => Some(s.uses.as_str()),
            Self::Run(_) => None,
        }
    }

    /// Whether this step invokes the given action, ignoring the version suffix
    pub fn uses_action(&self, action: &str) -> bool {
        self.action()
            .map(|uses| uses.split('@').next() == Some(action))
            .unwrap_or(false)
    }

    /// Value of a `with` input for action steps
    pub fn input(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Action(s) => s.with.get(key),
            Self::Run(_) => None,
        }
    }
}

/// Shell command step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub run: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    /// Keys this tool does not manage (env, working-directory, ...), kept from loaded files
    #[serde(flatten)]
    extra: Mapping,
}

impl RunStep {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }
}

impl From<RunStep> for Step {
    fn from(step: RunStep) -> Self {
        Self::Run(step)
    }
}

/// Reusable action step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub uses: String,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub with: Mapping,

    #[serde(flatten)]
    extra: Mapping,
}

impl ActionStep {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a static input parameter
    pub fn input(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.with.insert(Value::String(key.to_string()), value.into());
        self
    }
}

impl From<ActionStep> for Step {
    fn from(step: ActionStep) -> Self {
        Self::Action(step)
    }
}
