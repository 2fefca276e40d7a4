// src/groups/graph.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::contract::TaskFlags;
use crate::errors::{Result, SyncError};
use crate::groups::TaskGroupRegistry;

/// One registered group with its provider and dependent indices.
#[derive(Debug, Clone)]
struct GroupNode {
    name: String,
    provides: TaskFlags,
    depends: TaskFlags,
    /// Groups providing at least one flag of `depends`.
    deps: Vec<usize>,
    /// Groups depending on at least one flag of `provides`.
    dependents: Vec<usize>,
    /// Part of `depends` no group provides.
    unprovided: TaskFlags,
}

/// Provider -> dependent graph derived from `provides` / `depends` flags.
///
/// Nodes are addressed by registration index, matching
/// [`TaskGroupRegistry::get`].
#[derive(Debug, Clone)]
pub struct GroupGraph {
    nodes: Vec<GroupNode>,
}

impl GroupGraph {
    /// Build from `(name, provides, depends)` declarations.
    pub fn build<'a, I>(decls: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, TaskFlags, TaskFlags)>,
    {
        let mut nodes: Vec<GroupNode> = decls
            .into_iter()
            .map(|(name, provides, depends)| GroupNode {
                name: name.to_string(),
                provides,
                depends,
                deps: Vec::new(),
                dependents: Vec::new(),
                unprovided: TaskFlags::empty(),
            })
            .collect();

        for idx in 0..nodes.len() {
            let depends = nodes[idx].depends;
            let mut covered = TaskFlags::empty();

            for provider in 0..nodes.len() {
                if provider != idx && nodes[provider].provides.intersects(depends) {
                    covered |= nodes[provider].provides & depends;
                    nodes[idx].deps.push(provider);
                    nodes[provider].dependents.push(idx);
                }
            }

            // A group depending on its own output can never run either.
            nodes[idx].unprovided = depends.difference(covered);
        }

        Self { nodes }
    }

    pub fn from_registry(registry: &TaskGroupRegistry) -> Self {
        let decls: Vec<(String, TaskFlags, TaskFlags)> = registry
            .iter()
            .map(|g| (g.name().to_string(), g.provides(), g.depends()))
            .collect();
        Self::build(decls.iter().map(|(n, p, d)| (n.as_str(), *p, *d)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name(&self, idx: usize) -> &str {
        self.nodes.get(idx).map(|n| n.name.as_str()).unwrap_or("<unknown>")
    }

    pub fn provides(&self, idx: usize) -> TaskFlags {
        self.nodes.get(idx).map(|n| n.provides).unwrap_or_default()
    }

    pub fn depends(&self, idx: usize) -> TaskFlags {
        self.nodes.get(idx).map(|n| n.depends).unwrap_or_default()
    }

    pub fn dependents_of(&self, idx: usize) -> &[usize] {
        self.nodes
            .get(idx)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Flags `idx` depends on that no other group provides.
    pub fn unprovided(&self, idx: usize) -> TaskFlags {
        self.nodes.get(idx).map(|n| n.unprovided).unwrap_or_default()
    }

    /// Close `requested` over the dependencies of the groups serving it.
    ///
    /// A requested flag pulls in whatever its provider depends on, and so on
    /// transitively. Flags nobody provides stay in the result so the caller
    /// can report them.
    pub fn close_over_depends(&self, requested: TaskFlags) -> TaskFlags {
        let mut needed = requested;
        loop {
            let extra: TaskFlags = self
                .nodes
                .iter()
                .filter(|n| n.provides.intersects(needed))
                .map(|n| n.depends)
                .collect();
            if needed.contains(extra) {
                return needed;
            }
            needed |= extra;
        }
    }

    /// Check the provider graph for cycles.
    pub fn check_acyclic(&self) -> Result<()> {
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();

        for idx in 0..self.nodes.len() {
            graph.add_node(idx);
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            for dep in &node.deps {
                graph.add_edge(*dep, idx, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(SyncError::DagCycle(format!(
                "cycle detected between task groups involving '{}'",
                self.name(cycle.node_id())
            ))),
        }
    }
}
