//! Error types for the simulated filesystem

use std::io;

/// Core filesystem error type
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    #[error("no such file or directory: {path}")]
    NotFound { path: String },
    #[error("path must be absolute: {path}")]
    NotAbsolute { path: String },
    #[error("not a directory: {path}")]
    NotADirectory { path: String },
    #[error("already exists: {path}")]
    AlreadyExists { path: String },
    #[error("invalid argument")]
    InvalidArgument,
    #[error("is a directory: {path}")]
    IsADirectory { path: String },
    #[error("directory not empty: {path}")]
    DirectoryNotEmpty { path: String },
    #[error("too many levels of symbolic links: {path}")]
    SymlinkLoop { path: String },
    #[error("too many open files")]
    TooManyOpenFiles,
    #[error("stream did not contain valid UTF-8")]
    InvalidData,
    #[error("invalid filesystem json: {0}")]
    Json(#[from] serde_json::Error),
}

impl FsError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub(crate) fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory { path: path.into() }
    }

    pub(crate) fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    pub(crate) fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory { path: path.into() }
    }
}

impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        let kind = match &err {
            FsError::NotFound { .. } => io::ErrorKind::NotFound,
            FsError::NotAbsolute { .. } | FsError::InvalidArgument => io::ErrorKind::InvalidInput,
            FsError::NotADirectory { .. } => io::ErrorKind::NotADirectory,
            FsError::AlreadyExists { .. } => io::ErrorKind::AlreadyExists,
            FsError::IsADirectory { .. } => io::ErrorKind::IsADirectory,
            FsError::DirectoryNotEmpty { .. } => io::ErrorKind::DirectoryNotEmpty,
            FsError::InvalidData | FsError::Json(_) => io::ErrorKind::InvalidData,
            FsError::SymlinkLoop { .. } | FsError::TooManyOpenFiles => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub type FsResult<T> = Result<T, FsError>;
