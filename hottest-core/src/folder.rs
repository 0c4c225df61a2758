//! Folder model. Folders carry no data; their document is static.

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderModel;

impl fmt::Display for FolderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[folder ]")
    }
}
