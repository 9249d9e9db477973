// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! gha-wizard - GitHub Actions workflow wizard
//!
//! Create and extend build, test and deploy workflows interactively.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gha_wizard::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "gha_wizard=debug"
    } else {
        "gha_wizard=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    match cli.command {
        None => gha_wizard::cli::wizard::run(cli.overrides, cli.verbose),
        Some(Commands::Graph { file, format }) => {
            gha_wizard::cli::graph::run(file, format, cli.overrides)
        }
        Some(Commands::Validate { file }) => {
            gha_wizard::cli::validate::run(file, cli.overrides, cli.verbose)
        }
        Some(Commands::Templates) => gha_wizard::cli::templates::run(cli.verbose),
    }
}
