//! Run settings and ignore rules.
//!
//! Settings are read from an optional TOML file. Every key has a default, so an
//! empty file (or no file at all) behaves like the plain command line.
//!
//! # Settings File Format
//!
//! ```toml
//! [organizer]
//! workers = 4
//! recursive = true
//! progress = true
//! cleanup = true
//!
//! [filters]
//! include_hidden = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! extensions = ["tmp", "part"]
//! patterns = ["node_modules/**"]
//! regex = ["^~\\$"]
//! ```
//!
//! Glob patterns are matched against the path relative to the directory being
//! organized; regexes are matched against the file name only.

use crate::category::file_extension;
use crate::error::ConfigError;
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the settings file looked up in the current directory.
pub const LOCAL_SETTINGS_FILE: &str = ".folder-organizer.toml";

/// Number of workers used when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 4;

/// Everything that can be set in the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub organizer: OrganizerSettings,
    pub filters: FilterRules,
}

/// Defaults for the organize command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrganizerSettings {
    /// Size of the mover pool.
    pub workers: usize,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Show the progress spinner.
    pub progress: bool,
    /// Remove empty directories after organizing.
    pub cleanup: bool,
}

impl Default for OrganizerSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            recursive: true,
            progress: true,
            cleanup: true,
        }
    }
}

/// Which files the organizer should leave alone entirely.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Whether dot-files are considered at all.
    pub include_hidden: bool,
    pub exclude: ExcludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: true,
            exclude: ExcludeRules::default(),
        }
    }
}

/// Exclusion rules, checked in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact file names.
    pub filenames: Vec<String>,
    /// Extensions without the dot, case-insensitive.
    pub extensions: Vec<String>,
    /// Glob patterns on the relative path.
    pub patterns: Vec<String>,
    /// Regexes on the file name.
    pub regex: Vec<String>,
}

impl Settings {
    /// Loads settings with the following precedence:
    /// 1. `settings_path`, if given (must exist)
    /// 2. `.folder-organizer.toml` in the current directory
    /// 3. `~/.config/folder-organizer/config.toml`
    /// 4. built-in defaults
    pub fn load(settings_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = settings_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_SETTINGS_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Ok(home) = std::env::var("HOME") {
            let user = PathBuf::from(home)
                .join(".config")
                .join("folder-organizer")
                .join("config.toml");
            if user.exists() {
                return Self::load_from_file(&user);
            }
        }

        Ok(Self::default())
    }

    /// Loads and validates a specific settings file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Self = toml::from_str(&content).map_err(|e| ConfigError::InvalidToml {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.organizer.workers == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "organizer.workers",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl FilterRules {
    /// Compiles the rules for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled ignore rules.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl Default for CompiledFilters {
    /// Accepts every file.
    fn default() -> Self {
        Self {
            include_hidden: true,
            filenames: HashSet::new(),
            extensions: HashSet::new(),
            patterns: Vec::new(),
            regexes: Vec::new(),
        }
    }
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            filenames: rules.exclude.filenames.iter().cloned().collect(),
            extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }

    /// Whether the file at `relative_path` (relative to the organized root) takes
    /// part in the run.
    pub fn accepts(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.file_name().and_then(file_extension)
            && self.extensions.contains(&ext)
        {
            return false;
        }

        if self
            .patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self.regexes.iter().any(|regex| regex.is_match(&file_name))
    }
}
