//! Desired-state items, grouped per kind.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;

use hottest_core::CanonicalPath;

use crate::transport::{Artifact, JOB_CLASS, PIPELINE_CLASS};

/// The three kinds of item a sync run manages, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Node,
    Job,
    Pipeline,
}

impl ItemKind {
    pub fn all() -> &'static [ItemKind] {
        &[ItemKind::Node, ItemKind::Job, ItemKind::Pipeline]
    }

    /// Server class for job-like kinds; nodes have none.
    pub fn class(&self) -> Option<&'static str> {
        match self {
            ItemKind::Node => None,
            ItemKind::Job => Some(JOB_CLASS),
            ItemKind::Pipeline => Some(PIPELINE_CLASS),
        }
    }

    /// Subdirectory of a backup holding this kind.
    pub fn backup_dir(&self) -> &'static str {
        match self {
            ItemKind::Node => "nodes",
            ItemKind::Job => "jobs",
            ItemKind::Pipeline => "pipelines",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Node => "node",
            ItemKind::Job => "job",
            ItemKind::Pipeline => "pipeline",
        })
    }
}

/// A job a pipeline triggers, with the parameters it passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub job: CanonicalPath,
    pub params: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredItem {
    pub path: CanonicalPath,
    pub artifact: Artifact,
    /// Pipelines only: the jobs checked by the validation hook.
    pub job_refs: Vec<JobRef>,
}

/// Everything desired for one kind.
///
/// `full` holds every name the definition mentions, whitelisted or not;
/// `items` only the in-scope ones, in definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredSet {
    pub kind: ItemKind,
    pub full: BTreeSet<CanonicalPath>,
    pub items: Vec<DesiredItem>,
}

impl DesiredSet {
    pub fn new(kind: ItemKind) -> Self {
        DesiredSet {
            kind,
            full: BTreeSet::new(),
            items: Vec::new(),
        }
    }

    /// Desired but filtered out by the whitelist.
    pub fn skipped(&self) -> impl Iterator<Item = &CanonicalPath> {
        self.full
            .iter()
            .filter(move |p| !self.items.iter().any(|i| &i.path == *p))
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }
}
