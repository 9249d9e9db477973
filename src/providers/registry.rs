// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Package registries
//!
//! Step builders shared by the build jobs that produce packages and the
//! deploy jobs that publish them.

use crate::assembler::Artifact;
use crate::workflow::Step;

/// Steps needed to build and publish packages for one registry
pub trait PackageRegistry {
    /// Registry name for messages
    fn name(&self) -> &'static str;

    /// Repository secret holding the publish token
    fn token_secret(&self) -> &'static str;

    fn setup_environment(&self) -> Step;

    fn install_dependencies(&self) -> Step;

    fn build_package(&self) -> Step;

    /// Fail the job when the artifact's version is already published
    fn version_check(&self, artifact: &Artifact) -> Step;

    fn publish(&self, artifact: &Artifact) -> Step;
}

/// The Python Package Index
#[derive(Debug, Clone)]
pub struct PythonRegistry {
    pub python_version: String,
}

impl Default for PythonRegistry {
    fn default() -> Self {
        Self {
            python_version: "3.x".to_string(),
        }
    }
}

impl PackageRegistry for PythonRegistry {
    fn name(&self) -> &'static str {
        "PyPI"
    }

    fn token_secret(&self) -> &'static str {
        "PYPI_API_TOKEN"
    }

    fn setup_environment(&self) -> Step {
        Step::uses("actions/setup-python@v5")
            .named("Set up Python")
            .input("python-version", self.python_version.as_str())
            .into()
    }

    fn install_dependencies(&self) -> Step {
        Step::run("python -m pip install --upgrade pip build")
            .named("Install build dependencies")
            .into()
    }

    fn build_package(&self) -> Step {
        Step::run("python -m build").named("Build package").into()
    }

    fn version_check(&self, artifact: &Artifact) -> Step {
        let dist = artifact.download_dir();
        Step::run_lines([
            format!("SDIST=$(ls {}/*.tar.gz | head -n 1)", dist),
            "BASE=$(basename \"$SDIST\" .tar.gz)".to_string(),
            "NAME=${BASE%-*}".to_string(),
            "VERSION=${BASE##*-}".to_string(),
            "if curl -sf \"https://pypi.org/pypi/${NAME}/${VERSION}/json\" > /dev/null; then".to_string(),
            "  echo \"${NAME} ${VERSION} is already on PyPI\" >&2".to_string(),
            "  exit 1".to_string(),
            "fi".to_string(),
        ])
        .named("Check version is unpublished")
        .into()
    }

    fn publish(&self, artifact: &Artifact) -> Step {
        Step::uses("pypa/gh-action-pypi-publish@release/v1")
            .named("Publish to PyPI")
            .input("password", format!("${{{{ secrets.{} }}}}", self.token_secret()))
            .input("packages-dir", format!("{}/", artifact.download_dir()))
            .into()
    }
}

/// The npm registry
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    pub node_version: String,
    pub registry_url: String,
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self {
            node_version: "lts/*".to_string(),
            registry_url: "https://registry.npmjs.org".to_string(),
        }
    }
}

impl PackageRegistry for NpmRegistry {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn token_secret(&self) -> &'static str {
        "NPM_TOKEN"
    }

    fn setup_environment(&self) -> Step {
        Step::uses("actions/setup-node@v4")
            .named("Set up Node.js")
            .input("node-version", self.node_version.as_str())
            .input("registry-url", self.registry_url.as_str())
            .into()
    }

    fn install_dependencies(&self) -> Step {
        Step::run("npm ci").named("Install dependencies").into()
    }

    fn build_package(&self) -> Step {
        Step::run_lines([
            "npm run build --if-present",
            "mv \"$(npm pack | tail -n 1)\" package.tgz",
        ])
        .named("Build package")
        .into()
    }

    fn version_check(&self, artifact: &Artifact) -> Step {
        Step::run_lines([
            format!("MANIFEST=$(tar -xOzf {} package/package.json)", artifact.path),
            "NAME=$(echo \"$MANIFEST\" | node -p \"JSON.parse(require('fs').readFileSync(0)).name\")".to_string(),
            "VERSION=$(echo \"$MANIFEST\" | node -p \"JSON.parse(require('fs').readFileSync(0)).version\")".to_string(),
            "if npm view \"${NAME}@${VERSION}\" version > /dev/null 2>&1; then".to_string(),
            "  echo \"${NAME}@${VERSION} is already on npm\" >&2".to_string(),
            "  exit 1".to_string(),
            "fi".to_string(),
        ])
        .named("Check version is unpublished")
        .into()
    }

    fn publish(&self, artifact: &Artifact) -> Step {
        Step::run(format!(
            "NODE_AUTH_TOKEN=\"${{{{ secrets.{} }}}}\" npm publish {} --access public",
            self.token_secret(),
            artifact.path
        ))
        .named("Publish to npm")
        .into()
    }
}
