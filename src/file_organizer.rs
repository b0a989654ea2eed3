/// Physical file moves for the worker pool.
///
/// A move creates the target directory, reserves a free file name inside it
/// with an exclusive create, then renames the source over the reservation.
/// When the rename fails (typically across devices) the bytes are copied into
/// the reservation instead and the source is removed.
use crate::error::MoveError;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// One pending move, produced by the classifier and consumed once by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    /// Absolute path of the file to move.
    pub source: PathBuf,
    /// `<root>/<mapped destination>/<extension>`.
    pub target_dir: PathBuf,
    /// File name to use inside `target_dir` before collision suffixes.
    pub file_name: OsString,
}

/// Carries out [`FileJob`]s.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves the job's file into its target directory and returns the final path.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use folder_organizer::file_organizer::{FileJob, FileOrganizer};
    /// use std::path::PathBuf;
    ///
    /// let job = FileJob {
    ///     source: PathBuf::from("/data/report.pdf"),
    ///     target_dir: PathBuf::from("/data/documents/pdf"),
    ///     file_name: "report.pdf".into(),
    /// };
    /// match FileOrganizer::execute(&job) {
    ///     Ok(dest) => println!("moved to {}", dest.display()),
    ///     Err(e) => eprintln!("skipped: {}", e),
    /// }
    /// ```
    pub fn execute(job: &FileJob) -> Result<PathBuf, MoveError> {
        fs::create_dir_all(&job.target_dir).map_err(|source| MoveError::CreateDir {
            path: job.target_dir.clone(),
            source,
        })?;

        let destination = Self::reserve_destination(&job.target_dir, &job.file_name)?;

        if let Err(e) = Self::move_file(&job.source, &destination) {
            // drop the placeholder so a failed move leaves no empty file behind
            let _ = fs::remove_file(&destination);
            return Err(e);
        }

        Ok(destination)
    }

    /// Claims the first free name among `name`, `name_1`, `name_2`, ... by creating
    /// an empty file with `create_new`, which fails if the name is taken. Concurrent
    /// callers therefore never receive the same path.
    pub fn reserve_destination(dir: &Path, file_name: &OsStr) -> Result<PathBuf, MoveError> {
        let mut counter = 0usize;
        loop {
            let candidate = dir.join(Self::candidate_name(file_name, counter));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
                Err(source) => {
                    return Err(MoveError::Reserve {
                        dir: dir.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }

    /// `report.pdf` with counter 2 becomes `report_2.pdf`; counter 0 keeps the name.
    pub fn candidate_name(file_name: &OsStr, counter: usize) -> OsString {
        if counter == 0 {
            return file_name.to_os_string();
        }

        let path = Path::new(file_name);
        let stem = path.file_stem().unwrap_or(file_name);
        let mut name = stem.to_os_string();
        name.push(format!("_{}", counter));
        if let Some(ext) = path.extension() {
            name.push(".");
            name.push(ext);
        }
        name
    }

    fn move_file(source: &Path, destination: &Path) -> Result<(), MoveError> {
        match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(
                    source = %source.display(),
                    error = %e,
                    "rename failed, falling back to copy and delete"
                );
                Self::copy_then_remove(source, destination)
            }
        }
    }

    /// Streams `source` into `destination`, syncs it, then removes `source`.
    pub(crate) fn copy_then_remove(source: &Path, destination: &Path) -> Result<(), MoveError> {
        {
            let mut reader = File::open(source).map_err(|e| MoveError::Open {
                path: source.to_path_buf(),
                source: e,
            })?;
            let mut writer = File::create(destination).map_err(|e| MoveError::Create {
                path: destination.to_path_buf(),
                source: e,
            })?;

            io::copy(&mut reader, &mut writer).map_err(|e| MoveError::Copy {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
                source: e,
            })?;
            writer.sync_all().map_err(|e| MoveError::Sync {
                path: destination.to_path_buf(),
                source: e,
            })?;
        }

        fs::remove_file(source).map_err(|e| MoveError::RemoveSource {
            path: source.to_path_buf(),
            source: e,
        })
    }
}
