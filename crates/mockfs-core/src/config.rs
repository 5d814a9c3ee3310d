//! Configuration types for the simulated filesystem

use serde::{Deserialize, Serialize};

use crate::error::FsResult;

/// Resolution and handle limits
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsLimits {
    /// Symlinks followed in a single resolution before giving up
    pub max_symlink_depth: u32,
    pub max_open_handles: u32,
}

impl Default for FsLimits {
    fn default() -> Self {
        Self {
            max_symlink_depth: 40,
            max_open_handles: 1024,
        }
    }
}

/// Main filesystem configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Accept `C:\...` style paths by dropping the drive prefix
    pub strip_drive_prefix: bool,
    pub limits: FsLimits,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            strip_drive_prefix: true,
            limits: FsLimits::default(),
        }
    }
}

impl FsConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> FsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
