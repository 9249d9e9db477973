// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Job dependency graph
//!
//! Builds the `needs` graph of a workflow, detects cycles in hand-edited
//! files and renders the graph for the `graph` command.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, Control, DfsEvent};
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::document::Document;

/// Problems found while building the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    /// `job` needs `dependency`, which is not defined
    UnknownNeed { job: String, dependency: String },
    /// The listed jobs form a cycle
    Cycle { jobs: Vec<String> },
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNeed { job, dependency } => {
                write!(f, "Job '{}' needs unknown job '{}'", job, dependency)
            }
            Self::Cycle { jobs } => write!(f, "Circular job dependency: {}", jobs.join(" → ")),
        }
    }
}

/// `needs` graph over the jobs of a document
pub struct JobGraph {
    graph: DiGraph<String, ()>,
    name_to_index: HashMap<String, NodeIndex>,
    order: Vec<String>,
    issues: Vec<GraphIssue>,
}

impl JobGraph {
    /// Build the graph. Dangling edges are recorded as issues rather than failing.
    pub fn build(document: &Document) -> Self {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();
        let mut issues = Vec::new();

        for (id, _) in document.jobs() {
            let node = graph.add_node(id.to_string());
            name_to_index.insert(id.to_string(), node);
        }

        for (id, job) in document.jobs() {
            let job_node = name_to_index[id];
            for dep in &job.needs {
                match name_to_index.get(dep) {
                    Some(dep_node) => {
                        if !graph.contains_edge(*dep_node, job_node) {
                            graph.add_edge(*dep_node, job_node, ());
                        }
                    }
                    None => issues.push(GraphIssue::UnknownNeed {
                        job: id.to_string(),
                        dependency: dep.clone(),
                    }),
                }
            }
        }

        let mut built = Self {
            graph,
            name_to_index,
            order: document.job_ids(),
            issues,
        };

        if let Err(cycle) = toposort(&built.graph, None) {
            let jobs = built.find_cycle_members(cycle.node_id());
            built.issues.push(GraphIssue::Cycle { jobs });
        }

        built
    }

    pub fn issues(&self) -> &[GraphIssue] {
        &self.issues
    }

    pub fn is_acyclic(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|i| matches!(i, GraphIssue::Cycle { .. }))
    }

    /// Jobs that must finish before `job`
    pub fn dependencies(&self, job: &str) -> Option<Vec<String>> {
        let node = self.name_to_index.get(job)?;
        Some(
            self.graph
                .neighbors_directed(*node, petgraph::Direction::Incoming)
                .map(|n| self.graph[n].clone())
                .collect(),
        )
    }

    /// Whether `job_a` waits (directly or transitively) on `job_b`
    pub fn depends_on(&self, job_a: &str, job_b: &str) -> bool {
        let (Some(a), Some(b)) = (self.name_to_index.get(job_a), self.name_to_index.get(job_b))
        else {
            return false;
        };
        a != b && petgraph::algo::has_path_connecting(&self.graph, *b, *a, None)
    }

    fn find_cycle_members(&self, start: NodeIndex) -> Vec<String> {
        let mut members = vec![self.graph[start].clone()];
        let mut visited = HashSet::new();
        visited.insert(start);

        depth_first_search(&self.graph, Some(start), |event| {
            if let DfsEvent::BackEdge(_, target) = event {
                if target == start {
                    return Control::Break(());
                }
            }
            if let DfsEvent::Discover(node, _) = event {
                if visited.insert(node) {
                    members.push(self.graph[node].clone());
                }
            }
            Control::Continue
        });

        members
    }

    fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(from, to)| (self.graph[from].as_str(), self.graph[to].as_str()))
            .collect()
    }

    /// Mermaid flowchart
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");
        for name in &self.order {
            out.push_str(&format!("    {}[{}]\n", mermaid_id(name), name));
        }
        for (from, to) in self.edges() {
            out.push_str(&format!("    {} --> {}\n", mermaid_id(from), mermaid_id(to)));
        }
        out
    }

    /// Graphviz DOT
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph workflow {\n");
        out.push_str("    rankdir=LR;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for (from, to) in self.edges() {
            out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to));
        }

        for name in &self.order {
            let node = self.name_to_index[name];
            if self.graph.neighbors_undirected(node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", name));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Numbered listing in document order
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (i, name) in self.order.iter().enumerate() {
            out.push_str(&format!("{}. {}", i + 1, name));
            let deps = self.dependencies(name).unwrap_or_default();
            if !deps.is_empty() {
                out.push_str(&format!(" [needs: {}]", deps.join(", ")));
            }
            out.push('\n');
        }
        out
    }
}

/// Mermaid node ids cannot contain dots
fn mermaid_id(name: &str) -> String {
    name.replace(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{JobField, DEFAULT_RUNNER};

    fn make_doc(jobs: &[(&str, &[&str])]) -> Document {
        let mut doc = Document::new();
        for (id, needs) in jobs {
            doc.ensure_job(id, DEFAULT_RUNNER);
            doc.set_job_field(
                id,
                JobField::Needs(needs.iter().map(|s| s.to_string()).collect()),
            )
            .unwrap();
        }
        doc
    }

    #[test]
    fn test_linear_graph() {
        let doc = make_doc(&[("build", &[]), ("test", &["build"]), ("deploy_to_pypi", &["test"])]);
        let graph = JobGraph::build(&doc);

        assert!(graph.issues().is_empty());
        assert!(graph.depends_on("deploy_to_pypi", "build"));
        assert!(!graph.depends_on("build", "test"));
        assert_eq!(graph.dependencies("test").unwrap(), vec!["build"]);
    }

    #[test]
    fn test_unknown_need_is_reported() {
        let doc = make_doc(&[("deploy_to_npm", &["build"])]);
        let graph = JobGraph::build(&doc);
        assert_eq!(
            graph.issues(),
            &[GraphIssue::UnknownNeed {
                job: "deploy_to_npm".into(),
                dependency: "build".into()
            }]
        );
    }

    #[test]
    fn test_cycle_detection() {
        let doc = make_doc(&[("a", &["b"]), ("b", &["a"])]);
        let graph = JobGraph::build(&doc);
        assert!(!graph.is_acyclic());
    }

    #[test]
    fn test_renderers() {
        let doc = make_doc(&[("build", &[]), ("deploy_to_itch_io", &["build"]), ("lint", &[])]);
        let graph = JobGraph::build(&doc);

        assert!(graph.to_mermaid().contains("build --> deploy_to_itch_io"));
        let dot = graph.to_dot();
        assert!(dot.contains("\"build\" -> \"deploy_to_itch_io\";"));
        assert!(dot.contains("    \"lint\";"));
        assert_eq!(
            graph.to_text(),
            "1. build\n2. deploy_to_itch_io [needs: build]\n3. lint\n"
        );
    }
}
