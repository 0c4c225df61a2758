//! Shared value types: canonical item paths and wrapped text fields.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CanonicalPath
// ---------------------------------------------------------------------------

/// Slash-joined, separator-normalised identifier shared by agents, jobs,
/// pipelines and folders.
///
/// Repeated separators collapse into one and no leading or trailing separator
/// is kept, so `"/team//a/"` and `"team/a"` name the same item. The empty path
/// is the server root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// Canonicalise a raw path.
    pub fn new(raw: &str) -> Self {
        Self::root().join(raw)
    }

    /// The server root (empty path).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Append `add` below `self` and normalise the result.
    pub fn join(&self, add: &str) -> Self {
        let joined = self
            .0
            .split('/')
            .chain(add.split('/'))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments, root-to-leaf.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment; empty for the root.
    pub fn leaf(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Containing folder, or `None` when the item sits at the root.
    pub fn parent(&self) -> Option<CanonicalPath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| CanonicalPath(parent.to_string()))
    }

    /// Every containing folder, root-to-leaf, excluding the root and `self`.
    pub fn ancestors(&self) -> Vec<CanonicalPath> {
        let mut out = Vec::new();
        let mut current = CanonicalPath::root();
        let segments: Vec<&str> = self.segments().collect();
        for segment in segments.iter().take(segments.len().saturating_sub(1)) {
            current = current.join(segment);
            out.push(current.clone());
        }
        out
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CanonicalPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CanonicalPath {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// TextLines
// ---------------------------------------------------------------------------

/// A text field written either as one string or as a list of strings, the
/// latter letting long values wrap across lines in the source document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextLines {
    One(String),
    Many(Vec<String>),
}

impl TextLines {
    /// The value with list items joined by single spaces.
    pub fn joined(&self) -> String {
        match self {
            TextLines::One(s) => s.clone(),
            TextLines::Many(parts) => parts.join(" "),
        }
    }
}

impl Default for TextLines {
    fn default() -> Self {
        TextLines::One(String::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
