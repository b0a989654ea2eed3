//! Entry point for an organization run.
//!
//! A run loads the category document, counts candidate files, then walks the
//! tree a second time on the calling thread while a fixed pool of workers
//! drains a bounded job queue. The walk blocks whenever the queue is full.

use crate::category::ExtensionMapping;
use crate::classifier::TreeClassifier;
use crate::config::{CompiledFilters, DEFAULT_WORKERS};
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_organizer::{FileJob, FileOrganizer};
use crate::output::ProgressDisplay;
use crate::stats::{Stats, StatsSnapshot};
use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// Maximum number of jobs waiting for a worker.
pub const JOB_QUEUE_CAPACITY: usize = 100;

/// Parameters of one run.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    /// JSON category document.
    pub config_path: PathBuf,
    /// Directory to organize; destinations are created inside it.
    pub source_path: PathBuf,
    pub workers: usize,
    pub recursive: bool,
    pub show_progress: bool,
    /// Files rejected here are left out of the run entirely.
    pub filters: CompiledFilters,
}

impl OrganizeOptions {
    /// Options with the default worker count, recursion on, no progress display
    /// and no ignore rules.
    pub fn new(config_path: impl Into<PathBuf>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            source_path: source_path.into(),
            workers: DEFAULT_WORKERS,
            recursive: true,
            show_progress: false,
            filters: CompiledFilters::default(),
        }
    }
}

/// Organizes `options.source_path` according to the category document.
///
/// # Errors
///
/// Fails before anything is moved if the document cannot be loaded or parsed,
/// if the source directory cannot be walked, or if `workers` is zero. Failures
/// on individual files only show up in the returned `skipped` count.
///
/// # Examples
///
/// ```no_run
/// use folder_organizer::organize::{OrganizeOptions, organize};
///
/// let stats = organize(&OrganizeOptions::new("categories.json", "/home/me/Downloads"))?;
/// println!("{} of {} files organized", stats.organized, stats.total);
/// # Ok::<(), folder_organizer::OrganizeError>(())
/// ```
pub fn organize(options: &OrganizeOptions) -> OrganizeResult<StatsSnapshot> {
    let mapping = ExtensionMapping::load(&options.config_path)?;
    tracing::info!(
        config = %options.config_path.display(),
        extensions = mapping.len(),
        "loaded category mapping"
    );
    if mapping.is_empty() {
        tracing::warn!(
            config = %options.config_path.display(),
            "category document maps no extensions, every file will be skipped"
        );
    }

    organize_with_mapping(&mapping, options)
}

/// Runs the scan and the worker pool with an already built mapping.
/// `options.config_path` is not read.
pub fn organize_with_mapping(
    mapping: &ExtensionMapping,
    options: &OrganizeOptions,
) -> OrganizeResult<StatsSnapshot> {
    if options.workers == 0 {
        return Err(OrganizeError::InvalidWorkerCount);
    }

    let root = options.source_path.as_path();
    let classifier = TreeClassifier::new(root, mapping, &options.filters, options.recursive);

    let total = classifier.count()?;
    tracing::info!(
        root = %root.display(),
        total,
        workers = options.workers,
        recursive = options.recursive,
        "starting organization"
    );

    let stats = Arc::new(Stats::with_total(total));
    let progress = options
        .show_progress
        .then(|| ProgressDisplay::start(Arc::clone(&stats)));

    let dispatched = run_pool(&classifier, &stats, options.workers);

    if let Some(progress) = progress {
        progress.finish();
    }
    dispatched?;

    let snapshot = stats.snapshot();
    tracing::info!(
        total = snapshot.total,
        organized = snapshot.organized,
        skipped = snapshot.skipped,
        "organization finished"
    );
    Ok(snapshot)
}

/// Spawns the workers, dispatches on the current thread, closes the queue and
/// waits for every worker to exit.
fn run_pool(classifier: &TreeClassifier<'_>, stats: &Stats, workers: usize) -> OrganizeResult<usize> {
    let (sender, receiver) = crossbeam_channel::bounded::<FileJob>(JOB_QUEUE_CAPACITY);

    thread::scope(|scope| {
        for id in 0..workers {
            let receiver = receiver.clone();
            scope.spawn(move || run_worker(id, receiver, stats));
        }
        drop(receiver);

        let result = classifier.dispatch(stats, &sender);
        // disconnecting lets workers finish the backlog and exit
        drop(sender);
        result
    })
}

fn run_worker(id: usize, jobs: Receiver<FileJob>, stats: &Stats) {
    for job in jobs.iter() {
        match FileOrganizer::execute(&job) {
            Ok(destination) => {
                tracing::debug!(
                    worker = id,
                    source = %job.source.display(),
                    destination = %destination.display(),
                    "moved file"
                );
                stats.record_organized();
            }
            Err(e) => {
                tracing::warn!(
                    worker = id,
                    source = %job.source.display(),
                    error = %e,
                    "could not move file, skipping"
                );
                stats.record_skipped();
            }
        }
    }
}

/// Convenience wrapper matching the command-line parameters.
pub fn organize_path(
    config_path: &Path,
    source_path: &Path,
    workers: usize,
    recursive: bool,
    show_progress: bool,
) -> OrganizeResult<StatsSnapshot> {
    organize(&OrganizeOptions {
        workers,
        recursive,
        show_progress,
        ..OrganizeOptions::new(config_path, source_path)
    })
}
