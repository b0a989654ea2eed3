//! folder-organizer - sort a directory tree into extension folders
//!
//! A nested JSON category document maps file extensions to destination folders.
//! Every matching file under the source directory is moved to
//! `<destination>/<extension>/` by a pool of worker threads, name collisions get
//! `_1`, `_2`, ... suffixes, and directories left empty can be reclaimed
//! afterwards. Run settings and ignore rules come from an optional TOML file.

pub mod category;
pub mod classifier;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_organizer;
pub mod logging;
pub mod organize;
pub mod output;
pub mod stats;

pub use category::{CategoryConfig, CategoryNode, ExtensionMapping};
pub use cleanup::cleanup_empty_directories;
pub use config::{CompiledFilters, Settings};
pub use error::{CleanupError, ConfigError, MoveError, OrganizeError, OrganizeResult};
pub use file_organizer::{FileJob, FileOrganizer};
pub use organize::{OrganizeOptions, organize};
pub use stats::{Stats, StatsSnapshot};

pub use cli::{Cli, run_cli};
