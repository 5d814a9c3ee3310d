//! mockfs core — in-memory simulated filesystem for tests
//!
//! A test builds a [`MockFs`], installs a tree with
//! [`MockFs::set_mock_filesystem`], runs the code under test against the
//! [`FileSystem`] trait, and inspects the result with
//! [`MockFs::get_mock_filesystem`]. Nothing touches the real disk.

pub mod config;
pub mod error;
pub mod node;
pub mod ops;
mod path;
pub mod types;
pub mod vfs;

// Re-export key types for convenience
pub use config::{FsConfig, FsLimits};
pub use error::{FsError, FsResult};
pub use node::{Directory, Node, SYMLINK_KEY};
pub use ops::{Deferred, FileSystem};
pub use types::*;
pub use vfs::MockFs;
