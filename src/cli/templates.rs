// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Templates command - list available templates

use colored::Colorize;
use miette::Result;

use crate::templates::TEMPLATES;
use crate::utils::{print_header, print_numbered};

/// Run the templates command
pub fn run(verbose: bool) -> Result<()> {
    print_header("Available templates");

    for (i, template) in TEMPLATES.iter().enumerate() {
        print_numbered(
            i + 1,
            &format!("{} {}", template.name.bold(), template.description.dimmed()),
        );
        if verbose {
            println!(
                "       build: {}, deploy: {}, file: {}",
                template.build_type, template.deploy_target, template.file_name
            );
        }
    }

    Ok(())
}
