//! Item whitelist and sync mode string.

use std::str::FromStr;

use regex::Regex;

use crate::error::SyncError;

/// Regular expressions selecting in-scope items by substring search.
/// An empty whitelist selects everything.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    patterns: Vec<Regex>,
}

impl Whitelist {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, SyncError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| SyncError::Whitelist {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Whitelist { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|re| re.is_match(name))
    }
}

/// Which phases a sync run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncMode {
    pub backup: bool,
    pub nodes: bool,
    pub tests: bool,
    pub pipelines: bool,
}

impl Default for SyncMode {
    fn default() -> Self {
        SyncMode {
            backup: true,
            nodes: true,
            tests: true,
            pipelines: true,
        }
    }
}

impl FromStr for SyncMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mode = SyncMode {
            backup: false,
            nodes: false,
            tests: false,
            pipelines: false,
        };
        for c in s.chars() {
            match c {
                'b' => mode.backup = true,
                'n' => mode.nodes = true,
                't' => mode.tests = true,
                'p' => mode.pipelines = true,
                found => {
                    return Err(SyncError::Mode {
                        mode: s.to_string(),
                        found,
                    })
                }
            }
        }
        Ok(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_whitelist_selects_everything() {
        let w = Whitelist::new::<&str>(&[]).unwrap();
        assert!(w.matches("anything/at/all"));
    }

    #[test]
    fn patterns_match_anywhere_in_the_name() {
        let w = Whitelist::new(&["evk", "^test/net"]).unwrap();
        assert!(w.matches("test/boot-evk"));
        assert!(w.matches("test/net-imx"));
        assert!(!w.matches("other/test/net-imx"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = Whitelist::new(&["("]).unwrap_err();
        assert!(err.to_string().contains("\"(\""));
    }

    #[test]
    fn mode_parses_subset() {
        let m: SyncMode = "nt".parse().unwrap();
        assert!(!m.backup && m.nodes && m.tests && !m.pipelines);
        assert_eq!("btnp".parse::<SyncMode>().unwrap(), SyncMode::default());
    }

    #[test]
    fn mode_rejects_unknown_chars() {
        let err = "bx".parse::<SyncMode>().unwrap_err();
        assert!(matches!(err, SyncError::Mode { found: 'x', .. }));
    }
}
