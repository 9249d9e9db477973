// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! External services used by generated jobs
//!
//! - `aws`: IAM role provisioning and AWS deploy steps
//! - `registry`: PyPI and npm build and publish steps

pub mod aws;
pub mod registry;

pub use aws::{AwsCli, CloudProvisioner, RoleRequest};
pub use registry::{NpmRegistry, PackageRegistry, PythonRegistry};
