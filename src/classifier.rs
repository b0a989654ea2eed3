//! Walks the source tree and decides, per file, whether it must be moved.
//!
//! The same [`TreeClassifier::classify`] drives both passes of a run: the
//! counting pass that fixes the total, and the dispatch pass that feeds the job
//! queue. Keeping one decision function keeps the two in agreement.

use crate::category::{ExtensionMapping, file_extension};
use crate::config::CompiledFilters;
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_organizer::FileJob;
use crate::stats::Stats;
use crossbeam_channel::Sender;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path};
use walkdir::{DirEntry, WalkDir};

/// Outcome of classifying one regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Already under `<category>/<ext>/`; invisible to the run.
    AlreadyOrganized,
    /// Excluded by the ignore rules; invisible to the run.
    Ignored,
    /// No extension, or an extension with no mapping; counted as skipped.
    Unmapped,
    /// Must be moved.
    Eligible(FileJob),
}

impl Classification {
    /// Whether the file contributes to the run's total.
    pub fn is_counted(&self) -> bool {
        matches!(self, Classification::Unmapped | Classification::Eligible(_))
    }
}

pub struct TreeClassifier<'a> {
    root: &'a Path,
    mapping: &'a ExtensionMapping,
    filters: &'a CompiledFilters,
    recursive: bool,
    top_folders: HashSet<OsString>,
}

impl<'a> TreeClassifier<'a> {
    pub fn new(
        root: &'a Path,
        mapping: &'a ExtensionMapping,
        filters: &'a CompiledFilters,
        recursive: bool,
    ) -> Self {
        Self {
            root,
            mapping,
            filters,
            recursive,
            top_folders: mapping.top_level_folders(),
        }
    }

    /// Classifies the file at `path`, which must lie under the root.
    pub fn classify(&self, path: &Path) -> Classification {
        let Ok(relative) = path.strip_prefix(self.root) else {
            return Classification::Unmapped;
        };
        let Some(file_name) = path.file_name() else {
            return Classification::Unmapped;
        };

        if !self.filters.accepts(relative) {
            return Classification::Ignored;
        }

        let Some(ext) = file_extension(file_name) else {
            return Classification::Unmapped;
        };

        if self.is_already_organized(relative, &ext) {
            return Classification::AlreadyOrganized;
        }

        match self.mapping.destination(&ext) {
            Some(destination) => Classification::Eligible(FileJob {
                source: path.to_path_buf(),
                target_dir: self.root.join(destination).join(&ext),
                file_name: file_name.to_os_string(),
            }),
            None => Classification::Unmapped,
        }
    }

    /// `ext` is the lower-cased extension without its dot.
    fn is_already_organized(&self, relative: &Path, ext: &str) -> bool {
        let parts: Vec<&OsStr> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        if parts.len() < 3 {
            return false;
        }

        if self.top_folders.contains(parts[0]) && eq_ignore_case(parts[1], ext) {
            return true;
        }

        // nested categories put the extension folder deeper than the second level
        match (self.mapping.destination(ext), relative.parent()) {
            (Some(destination), Some(parent)) => parent == destination.join(ext),
            _ => false,
        }
    }

    /// Number of files the dispatch pass will account for.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::Scan`] if the root cannot be read.
    pub fn count(&self) -> OrganizeResult<usize> {
        let mut total = 0;
        for entry in self.walker() {
            let Some(entry) = self.accept_entry(entry)? else {
                continue;
            };
            if self.classify(entry.path()).is_counted() {
                total += 1;
            }
        }
        Ok(total)
    }

    /// Walks the tree, records unmapped files as skipped and sends eligible jobs.
    ///
    /// `send` blocks while the queue is full, so the walk advances at the pace of
    /// the workers. Returns the number of jobs sent.
    pub fn dispatch(&self, stats: &Stats, jobs: &Sender<FileJob>) -> OrganizeResult<usize> {
        let mut sent = 0;
        for entry in self.walker() {
            let Some(entry) = self.accept_entry(entry)? else {
                continue;
            };
            match self.classify(entry.path()) {
                Classification::Eligible(job) => {
                    if jobs.send(job).is_err() {
                        tracing::error!("all workers stopped, abandoning dispatch");
                        break;
                    }
                    sent += 1;
                }
                Classification::Unmapped => {
                    tracing::debug!(path = %entry.path().display(), "no mapping, skipping");
                    stats.record_skipped();
                }
                Classification::AlreadyOrganized | Classification::Ignored => {
                    tracing::trace!(path = %entry.path().display(), "left out of the run");
                }
            }
        }
        Ok(sent)
    }

    fn walker(&self) -> walkdir::IntoIter {
        let walker = WalkDir::new(self.root);
        if self.recursive {
            walker.into_iter()
        } else {
            walker.max_depth(1).into_iter()
        }
    }

    /// Keeps regular files below the root. An error on the root itself is fatal;
    /// deeper errors are logged and the entry is dropped.
    fn accept_entry(
        &self,
        entry: walkdir::Result<DirEntry>,
    ) -> OrganizeResult<Option<DirEntry>> {
        match entry {
            Ok(entry) if entry.depth() > 0 && entry.file_type().is_file() => Ok(Some(entry)),
            Ok(_) => Ok(None),
            Err(e) if e.depth() == 0 => Err(OrganizeError::Scan {
                path: self.root.to_path_buf(),
                source: e,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable entry, skipping");
                Ok(None)
            }
        }
    }
}

fn eq_ignore_case(folder: &OsStr, ext: &str) -> bool {
    folder.to_string_lossy().to_lowercase() == ext
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryConfig;
    use std::fs;
    use tempfile::TempDir;

    fn mapping() -> ExtensionMapping {
        let config = CategoryConfig::from_json_str(
            r#"{"categories": {"images": [".jpg"], "docs": {"text": [".txt"]}}}"#,
        )
        .unwrap();
        ExtensionMapping::from_config(&config).unwrap()
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_eligible_job_targets_extension_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let mapping = mapping();
        let filters = CompiledFilters::default();
        let classifier = TreeClassifier::new(root, &mapping, &filters, true);

        match classifier.classify(&root.join("notes.TXT")) {
            Classification::Eligible(job) => {
                assert_eq!(job.target_dir, root.join("docs").join("text").join("txt"));
                assert_eq!(job.file_name, OsString::from("notes.TXT"));
                assert_eq!(job.source, root.join("notes.TXT"));
            }
            other => panic!("expected eligible, got {:?}", other),
        }
    }

    #[test]
    fn test_unmapped_and_extensionless_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let mapping = mapping();
        let filters = CompiledFilters::default();
        let classifier = TreeClassifier::new(root, &mapping, &filters, true);

        assert_eq!(classifier.classify(&root.join("c.bin")), Classification::Unmapped);
        assert_eq!(classifier.classify(&root.join("Makefile")), Classification::Unmapped);
    }

    #[test]
    fn test_already_organized_detection() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let mapping = mapping();
        let filters = CompiledFilters::default();
        let classifier = TreeClassifier::new(root, &mapping, &filters, true);

        assert_eq!(
            classifier.classify(&root.join("images/jpg/a.jpg")),
            Classification::AlreadyOrganized
        );
        assert_eq!(
            classifier.classify(&root.join("images/JPG/b.JPG")),
            Classification::AlreadyOrganized
        );
        assert_eq!(
            classifier.classify(&root.join("docs/text/txt/b.txt")),
            Classification::AlreadyOrganized
        );
        // right category, wrong extension folder
        assert!(matches!(
            classifier.classify(&root.join("images/png/a.jpg")),
            Classification::Eligible(_)
        ));
        // two levels only
        assert!(matches!(
            classifier.classify(&root.join("images/a.jpg")),
            Classification::Eligible(_)
        ));
    }

    #[test]
    fn test_dotfile_extension_is_its_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let mut mapping = mapping();
        mapping.add_extension_mapping(".bashrc", "shell");
        let filters = CompiledFilters::default();
        let classifier = TreeClassifier::new(root, &mapping, &filters, true);

        match classifier.classify(&root.join(".bashrc")) {
            Classification::Eligible(job) => {
                assert_eq!(job.target_dir, root.join("shell").join("bashrc"));
                assert_eq!(job.file_name, OsString::from(".bashrc"));
            }
            other => panic!("expected eligible, got {:?}", other),
        }
        assert_eq!(
            classifier.classify(&root.join("shell/bashrc/.bashrc")),
            Classification::AlreadyOrganized
        );
    }

    #[test]
    fn test_ignored_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let mapping = mapping();
        let filters = crate::config::FilterRules {
            include_hidden: false,
            exclude: Default::default(),
        }
        .compile()
        .unwrap();
        let classifier = TreeClassifier::new(root, &mapping, &filters, true);

        let classification = classifier.classify(&root.join(".secret.txt"));
        assert_eq!(classification, Classification::Ignored);
        assert!(!classification.is_counted());
    }

    #[test]
    fn test_count_matches_dispatch() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("a.jpg"));
        touch(&root.join("b.txt"));
        touch(&root.join("c.bin"));
        touch(&root.join("nested/d.jpg"));
        touch(&root.join("images/jpg/done.jpg"));

        let mapping = mapping();
        let filters = CompiledFilters::default();
        let classifier = TreeClassifier::new(root, &mapping, &filters, true);

        let total = classifier.count().unwrap();
        assert_eq!(total, 4);

        let stats = Stats::with_total(total);
        let (tx, rx) = crossbeam_channel::unbounded();
        let sent = classifier.dispatch(&stats, &tx).unwrap();
        drop(tx);

        assert_eq!(sent, 3);
        assert_eq!(rx.iter().count(), 3);
        assert_eq!(stats.snapshot().skipped, 1);
    }

    #[test]
    fn test_non_recursive_prunes_subdirectories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("a.jpg"));
        touch(&root.join("sub/b.jpg"));
        touch(&root.join("sub/deeper/c.txt"));

        let mapping = mapping();
        let filters = CompiledFilters::default();
        let classifier = TreeClassifier::new(root, &mapping, &filters, false);

        assert_eq!(classifier.count().unwrap(), 1);

        let stats = Stats::with_total(1);
        let (tx, rx) = crossbeam_channel::unbounded();
        classifier.dispatch(&stats, &tx).unwrap();
        drop(tx);

        let jobs: Vec<FileJob> = rx.iter().collect();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].source, root.join("a.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_classified() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(&root.join("real.jpg"));
        std::os::unix::fs::symlink(root.join("real.jpg"), root.join("link.jpg")).unwrap();

        let mapping = mapping();
        let filters = CompiledFilters::default();
        let classifier = TreeClassifier::new(root, &mapping, &filters, true);

        assert_eq!(classifier.count().unwrap(), 1);
    }

    #[test]
    fn test_missing_root_is_a_scan_error() {
        let mapping = mapping();
        let filters = CompiledFilters::default();
        let root = Path::new("/non/existent/root");
        let classifier = TreeClassifier::new(root, &mapping, &filters, true);

        assert!(matches!(classifier.count(), Err(OrganizeError::Scan { .. })));
    }
}
