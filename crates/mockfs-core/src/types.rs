//! Core type definitions for the simulated filesystem

use serde::{Deserialize, Serialize};

/// Opaque handle identifier returned by `open`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl HandleId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Kind of node a path resolves to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    File,
    Directory,
    Symlink,
}

/// Result of `stat` / `lstat`
#[derive(Clone, Copy, Debug)]
pub struct Stats {
    pub kind: NodeType,
    /// Payload length for files, target length for symlinks, 0 for directories
    pub len: u64,
    /// Seconds since the Unix epoch. Not meaningful beyond being present.
    pub mtime: i64,
}

impl Stats {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeType::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == NodeType::Symlink
    }
}
