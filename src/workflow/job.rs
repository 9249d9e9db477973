// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Workflow jobs

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use super::ordered::OrderedMap;
use super::step::Step;

/// Default runner label for new jobs
pub const DEFAULT_RUNNER: &str = "ubuntu-latest";

/// A job: a named unit of work run under one runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Jobs that must succeed before this one starts
    #[serde(default, with = "needs_format", skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    /// Conditional guard expression
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,

    #[serde(rename = "runs-on")]
    pub runs_on: RunsOn,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    /// Permission grants (scope -> access level)
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub permissions: OrderedMap<String>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Keys this tool does not manage (strategy, env, timeout-minutes, ...)
    #[serde(flatten)]
    pub(crate) extra: Mapping,
}

impl Job {
    pub fn new(runs_on: impl Into<RunsOn>) -> Self {
        Self {
            needs: Vec::new(),
            guard: None,
            runs_on: runs_on.into(),
            environment: None,
            permissions: OrderedMap::new(),
            steps: Vec::new(),
            extra: Mapping::new(),
        }
    }

    /// Grant `level` access on `scope`, replacing any previous grant for the scope
    pub fn grant(&mut self, scope: &str, level: &str) {
        self.permissions.insert(scope, level.to_string());
    }

    /// Append a step unless an identical one is already present.
    ///
    /// Returns whether the step was added.
    pub fn push_step_once(&mut self, step: Step) -> bool {
        if self.steps.contains(&step) {
            return false;
        }
        self.steps.push(step);
        true
    }

    /// Replace the steps a generator owns with `block`
    ///
    /// A step is owned when its name appears in `block` or in `owned_names`.
    /// The block takes the place of the first owned step and every other
    /// step keeps its position.
    pub fn replace_owned_steps(&mut self, block: Vec<Step>, owned_names: &[&str]) {
        let is_owned = |step: &Step| match step.name() {
            Some(name) => {
                owned_names.contains(&name) || block.iter().any(|b| b.name() == Some(name))
            }
            None => block.contains(step),
        };

        let at = self
            .steps
            .iter()
            .position(|step| is_owned(step))
            .unwrap_or(self.steps.len());
        let mut after: Vec<Step> = self.steps.split_off(at);
        after.retain(|step| !is_owned(step));

        self.steps.extend(block);
        self.steps.extend(after);
    }

    /// First step invoking `action` (version suffix ignored)
    pub fn find_action(&self, action: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.uses_action(action))
    }
}

/// Runner selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunsOn {
    /// A single label such as `ubuntu-latest`
    Label(String),
    /// Labels a self-hosted runner must all carry
    Labels(Vec<String>),
    /// A runner group (`group`, `labels`)
    Group(Mapping),
}

impl RunsOn {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Label(label) => label.trim().is_empty(),
            Self::Labels(labels) => labels.is_empty(),
            Self::Group(group) => group.is_empty(),
        }
    }
}

impl From<&str> for RunsOn {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for RunsOn {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl PartialEq<&str> for RunsOn {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Self::Label(label) if label == other)
    }
}

/// Deployment environment descriptor
///
/// Written back as a plain name when it was read as one and has no URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EnvironmentForm", into = "EnvironmentForm")]
pub struct Environment {
    pub name: String,
    pub url: Option<String>,
    plain: bool,
}

impl Environment {
    pub fn new(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            url,
            plain: false,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EnvironmentForm {
    Name(String),
    Full {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl From<EnvironmentForm> for Environment {
    fn from(form: EnvironmentForm) -> Self {
        match form {
            EnvironmentForm::Name(name) => Self {
                name,
                url: None,
                plain: true,
            },
            EnvironmentForm::Full { name, url } => Self::new(name, url),
        }
    }
}

impl From<Environment> for EnvironmentForm {
    fn from(env: Environment) -> Self {
        match env.url {
            None if env.plain => Self::Name(env.name),
            url => Self::Full { name: env.name, url },
        }
    }
}

/// `needs` is written as a scalar for a single dependency and as a list otherwise
mod needs_format {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(needs: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        match needs {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        })
    }
}
