//! Error types shared across the organizer.
//!
//! Fatal errors (`ConfigError`, `OrganizeError`, `CleanupError`) are returned to the
//! caller. `MoveError` describes a single file that could not be moved; the worker
//! pool logs it and counts the file as skipped, so it never aborts a run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the category document or the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The category document is not valid JSON or lacks the `categories` object.
    #[error("invalid category document {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The settings file is not valid TOML for the expected structure.
    #[error("invalid settings file {}: {reason}", .path.display())]
    InvalidToml { path: PathBuf, reason: String },

    /// A category name is not a single plain folder name, or its value is neither
    /// an extension list, a mixed array nor an object.
    #[error("unable to parse category '{path}': expected a plain folder name holding a list of extensions or an object")]
    InvalidCategory { path: String },

    /// An ignore glob did not compile.
    #[error("invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    /// An ignore regex did not compile.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    /// A settings value is out of range.
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

/// Fatal errors for an organization run. Nothing has been moved when one of these
/// is returned.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The source tree could not be walked at all.
    #[error("failed to scan {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
}

/// Result type for organization runs.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Why a single file could not be moved.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to reserve a destination name in {}: {source}", .dir.display())]
    Reserve {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("open source file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("create destination file {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sync destination file {}: {source}", .path.display())]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remove source after copy {}: {source}", .path.display())]
    RemoveSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors for the empty-directory pass.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("cannot access {}: {source}", .path.display())]
    InaccessibleRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
