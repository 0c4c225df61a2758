//! Live server state, read once per kind pass.

use std::collections::{BTreeMap, BTreeSet};

use hottest_core::{CanonicalPath, RESERVED_AGENT};

use crate::transport::{CiServer, RemoteJob, TransportError, FOLDER_CLASS};

/// Display name of the built-in executor on servers that no longer call it
/// `master`.
pub const BUILTIN_NODE: &str = "Built-In Node";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Every item of the tree by canonical path, with its server class.
    pub items: BTreeMap<CanonicalPath, String>,
    /// Node names, the built-in executor excluded under either of its names.
    pub nodes: BTreeSet<String>,
}

impl Snapshot {
    pub fn read<S: CiServer + ?Sized>(server: &S) -> Result<Self, TransportError> {
        let mut items = BTreeMap::new();
        flatten(&CanonicalPath::root(), &server.list_jobs()?, &mut items);
        let nodes = server
            .list_nodes()?
            .into_iter()
            .filter(|n| n != RESERVED_AGENT && n != BUILTIN_NODE)
            .collect();
        Ok(Snapshot { items, nodes })
    }

    pub fn class_of(&self, path: &CanonicalPath) -> Option<&str> {
        self.items.get(path).map(String::as_str)
    }

    pub fn paths_with_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a CanonicalPath> {
        self.items
            .iter()
            .filter(move |(_, c)| c.as_str() == class)
            .map(|(p, _)| p)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }
}

fn flatten(parent: &CanonicalPath, jobs: &[RemoteJob], out: &mut BTreeMap<CanonicalPath, String>) {
    for job in jobs {
        let path = parent.join(&job.name);
        if job.class == FOLDER_CLASS {
            flatten(&path, &job.children, out);
        }
        out.insert(path, job.class.clone());
    }
}
