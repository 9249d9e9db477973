// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Job ordering and `needs` inference
//!
//! Runs after every job addition. Jobs are ordered build, test, deploy
//! jobs, then anything else; deploy jobs wait for test (or build), test
//! waits for build.

use tracing::debug;

use super::document::{Document, JobField};
use crate::errors::WizardResult;

pub const BUILD_JOB: &str = "build";
pub const TEST_JOB: &str = "test";
pub const DEPLOY_JOB_PREFIX: &str = "deploy_to_";

/// Ordering bucket of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobCategory {
    Build,
    Test,
    Deploy,
    Other,
}

impl JobCategory {
    pub fn of(job_id: &str) -> Self {
        if job_id == BUILD_JOB {
            Self::Build
        } else if job_id == TEST_JOB {
            Self::Test
        } else if job_id.starts_with(DEPLOY_JOB_PREFIX) {
            Self::Deploy
        } else {
            Self::Other
        }
    }
}

/// Recomputes job order and dependency edges over a whole document
pub struct DependencyResolver;

impl DependencyResolver {
    /// Apply canonical ordering and `needs` inference. Idempotent.
    pub fn resolve(document: &mut Document) -> WizardResult<()> {
        let order = Self::canonical_order(document);
        document.reorder_jobs(&order)?;

        let has_build = document.has_job(BUILD_JOB);
        let has_test = document.has_job(TEST_JOB);

        for id in &order {
            let needs = match JobCategory::of(id) {
                JobCategory::Test => upstream(&[(has_build, BUILD_JOB)]),
                JobCategory::Deploy => upstream(&[(has_test, TEST_JOB), (has_build, BUILD_JOB)]),
                JobCategory::Build | JobCategory::Other => continue,
            };
            debug!(job = %id, ?needs, "resolved job dependencies");
            document.set_job_field(id, JobField::Needs(needs))?;
        }

        Ok(())
    }

    /// Stable partition of the current job ids by category
    pub fn canonical_order(document: &Document) -> Vec<String> {
        let mut ids = document.job_ids();
        // sort_by_key is stable, so each bucket keeps its relative order
        ids.sort_by_key(|id| JobCategory::of(id));
        ids
    }
}

/// First present candidate, as a `needs` list
fn upstream(candidates: &[(bool, &str)]) -> Vec<String> {
    candidates
        .iter()
        .find(|(present, _)| *present)
        .map(|(_, id)| vec![id.to_string()])
        .unwrap_or_default()
}
