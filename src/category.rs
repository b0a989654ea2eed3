//! Category resolution: from a nested JSON configuration to a flat extension lookup.
//!
//! A category value may take one of three shapes:
//!
//! ```json
//! {
//!   "categories": {
//!     "images": [".jpg", ".png"],
//!     "media": [[".mp4"], { "audio": ["mp3", "flac"] }],
//!     "docs": { "text": [".txt", ".md"], "office": { "sheets": [".xlsx"] } }
//!   }
//! }
//! ```
//!
//! Flattening the document above yields `.jpg -> images`, `.mp4 -> media`,
//! `.mp3 -> media/audio`, `.txt -> docs/text`, `.xlsx -> docs/office/sheets`.
//!
//! # Examples
//!
//! ```
//! use folder_organizer::category::{CategoryConfig, ExtensionMapping};
//! use std::path::Path;
//!
//! let config = CategoryConfig::from_json_str(r#"{"categories": {"a": {"b": [".x"]}}}"#).unwrap();
//! let mapping = ExtensionMapping::from_config(&config).unwrap();
//! assert_eq!(mapping.destination(".x"), Some(Path::new("a/b")));
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// The raw category document: a single `categories` object whose values are
/// parsed lazily into [`CategoryNode`]s. Key order follows the document.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub categories: Map<String, Value>,
}

impl CategoryConfig {
    /// Reads and parses a category document from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a category document held in memory.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::InvalidJson {
            path: PathBuf::from("<inline>"),
            source,
        })
    }
}

/// Named children of a category, in order of first appearance. Names are
/// unique: a later object in a mixed array replaces an earlier child of the same
/// name.
pub type Subcategories = Vec<(String, CategoryNode)>;

/// One node of the parsed category tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryNode {
    /// `[".jpg", ".png"]`
    Extensions(Vec<String>),
    /// `[[".mp4"], {"audio": [".mp3"]}]`: string arrays add extensions, objects add
    /// subcategories, anything else is ignored.
    Mixed {
        extensions: Vec<String>,
        subcategories: Subcategories,
    },
    /// `{"text": [".txt"]}`
    Nested(Subcategories),
}

impl CategoryNode {
    /// Recognizes the shape of `value` and parses it recursively.
    ///
    /// `path` is the slash-joined name of the node, used in error messages.
    pub fn parse(value: &Value, path: &str) -> Result<Self, ConfigError> {
        match value {
            Value::Array(items) => match string_list(items) {
                Some(extensions) => Ok(CategoryNode::Extensions(extensions)),
                None => {
                    let mut extensions = Vec::new();
                    let mut subcategories = Vec::new();
                    for item in items {
                        match item {
                            Value::Array(inner) => {
                                if let Some(list) = string_list(inner) {
                                    extensions.extend(list);
                                }
                            }
                            Value::Object(map) => {
                                for (name, child) in parse_children(map, path)? {
                                    insert_child(&mut subcategories, name, child);
                                }
                            }
                            _ => {}
                        }
                    }
                    Ok(CategoryNode::Mixed {
                        extensions,
                        subcategories,
                    })
                }
            },
            Value::Object(map) => Ok(CategoryNode::Nested(parse_children(map, path)?)),
            _ => Err(ConfigError::InvalidCategory {
                path: path.to_string(),
            }),
        }
    }

    /// Extensions declared directly on this node.
    pub fn extensions(&self) -> &[String] {
        match self {
            CategoryNode::Extensions(extensions) => extensions,
            CategoryNode::Mixed { extensions, .. } => extensions,
            CategoryNode::Nested(_) => &[],
        }
    }

    /// Direct children of this node.
    pub fn subcategories(&self) -> &[(String, CategoryNode)] {
        match self {
            CategoryNode::Extensions(_) => &[],
            CategoryNode::Mixed { subcategories, .. } => subcategories,
            CategoryNode::Nested(subcategories) => subcategories,
        }
    }
}

/// Returns the items as strings if every item is a string.
fn string_list(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn parse_children(map: &Map<String, Value>, parent: &str) -> Result<Subcategories, ConfigError> {
    map.iter()
        .map(|(name, value)| {
            let child_path = format!("{}/{}", parent, name);
            check_category_name(name, &child_path)?;
            CategoryNode::parse(value, &child_path).map(|node| (name.clone(), node))
        })
        .collect()
}

fn insert_child(subcategories: &mut Subcategories, name: String, child: CategoryNode) {
    match subcategories.iter_mut().find(|(existing, _)| *existing == name) {
        Some((_, slot)) => *slot = child,
        None => subcategories.push((name, child)),
    }
}

/// A category name becomes one folder under the source root, so it must be a
/// single plain path component: no separators, no `.` or `..`, not absolute.
fn check_category_name(name: &str, path: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(ConfigError::InvalidCategory {
            path: path.to_string(),
        }),
    }
}

/// Extension of a file name in lower case without the dot: everything after the
/// last `.`, wherever it is. A leading dot counts, so `.bashrc` has extension
/// `bashrc`; `archive.tar.gz` has `gz`. Names without a dot, or ending in one,
/// have none.
///
/// ```
/// use folder_organizer::category::file_extension;
/// use std::ffi::OsStr;
///
/// assert_eq!(file_extension(OsStr::new("Photo.JPG")).as_deref(), Some("jpg"));
/// assert_eq!(file_extension(OsStr::new(".bashrc")).as_deref(), Some("bashrc"));
/// assert_eq!(file_extension(OsStr::new("Makefile")), None);
/// ```
pub fn file_extension(file_name: &OsStr) -> Option<String> {
    let name = file_name.to_string_lossy();
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Normalizes an extension into its lookup key: lower-case with a leading dot.
///
/// ```
/// use folder_organizer::category::normalize_extension;
///
/// assert_eq!(normalize_extension("JPG"), ".jpg");
/// assert_eq!(normalize_extension(".Tar"), ".tar");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Flat lookup from normalized extension to destination path relative to the
/// source root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionMapping {
    extension_map: HashMap<String, PathBuf>,
}

impl ExtensionMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses every top-level category and flattens the tree depth-first.
    ///
    /// When an extension appears in several categories the one processed last
    /// (later in the document) wins.
    pub fn from_config(config: &CategoryConfig) -> Result<Self, ConfigError> {
        let mut mapping = Self::new();
        for (name, value) in &config.categories {
            check_category_name(name, name)?;
            let node = CategoryNode::parse(value, name)?;
            mapping.flatten(&node, PathBuf::from(name));
        }
        Ok(mapping)
    }

    /// Loads a category document and flattens it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_config(&CategoryConfig::load(path)?)
    }

    fn flatten(&mut self, node: &CategoryNode, destination: PathBuf) {
        for ext in node.extensions() {
            self.add_extension_mapping(ext, destination.clone());
        }
        for (name, child) in node.subcategories() {
            self.flatten(child, destination.join(name));
        }
    }

    /// Maps an extension (any case, dot optional) to a destination path.
    pub fn add_extension_mapping(&mut self, ext: &str, destination: impl Into<PathBuf>) {
        self.extension_map
            .insert(normalize_extension(ext), destination.into());
    }

    /// Looks up the destination for an extension (any case, dot optional).
    pub fn destination(&self, ext: &str) -> Option<&Path> {
        self.extension_map
            .get(&normalize_extension(ext))
            .map(PathBuf::as_path)
    }

    /// First path component of every destination, e.g. `docs` for `docs/text`.
    pub fn top_level_folders(&self) -> HashSet<OsString> {
        self.extension_map
            .values()
            .filter_map(|dest| match dest.components().next() {
                Some(Component::Normal(name)) => Some(name.to_os_string()),
                _ => None,
            })
            .collect()
    }

    /// Number of distinct mapped extensions.
    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }
}
