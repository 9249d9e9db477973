// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Graph command - visualize workflow jobs as a graph

use miette::Result;
use std::path::PathBuf;

use super::{load_config, resolve_workflow, GraphFormat, Overrides};
use crate::store::WorkflowStore;
use crate::utils::print_warning;
use crate::workflow::JobGraph;

/// Run the graph command
pub fn run(file: Option<PathBuf>, format: GraphFormat, overrides: Overrides) -> Result<()> {
    let root = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    let config = load_config(&root, &overrides)?;
    let store = WorkflowStore::from_config(&root, &config);
    let path = resolve_workflow(&store, &config, file);

    if !path.exists() {
        return Err(miette::miette!(
            "Workflow file not found: {}\n\n\
             Run 'gha-wizard' to create one.",
            path.display()
        ));
    }

    let document = store.load(&path)?;
    let graph = JobGraph::build(&document);

    let output = match format {
        GraphFormat::Text => graph.to_text(),
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };
    println!("{}", output.trim_end());

    for issue in graph.issues() {
        print_warning(&issue.to_string());
    }

    Ok(())
}
