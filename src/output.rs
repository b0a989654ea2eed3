//! Terminal output: status lines, the run summary and the live progress spinner.

use crate::stats::{Stats, StatsSnapshot};
use colored::*;
use crossbeam_channel::{Sender, select};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the spinner message is refreshed from the counters.
pub const PROGRESS_REFRESH: Duration = Duration::from_millis(500);

/// Styled status lines for the command-line front end.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the final counters of a run.
    ///
    /// ```no_run
    /// use folder_organizer::output::OutputFormatter;
    /// use folder_organizer::stats::StatsSnapshot;
    ///
    /// OutputFormatter::summary(&StatsSnapshot { total: 3, processed: 3, organized: 2, skipped: 1 });
    /// ```
    pub fn summary(stats: &StatsSnapshot) {
        Self::header("SUMMARY");
        let rows = [
            ("Total files", stats.total.to_string().bold()),
            ("Organized files", stats.organized.to_string().green()),
            ("Skipped files", stats.skipped.to_string().yellow()),
        ];
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in rows {
            println!("  {:<width$} : {}", label, value, width = width);
        }
    }

    /// Reports the outcome of the empty-directory pass.
    pub fn cleanup_result(removed: usize) {
        let noun = if removed == 1 { "directory" } else { "directories" };
        Self::success(&format!("Removed {} empty {}", removed, noun));
    }
}

/// Progress line shown while the pool runs, e.g.
/// `12/40 files (30.0%) | Organized: 10 | Skipped: 2`.
pub fn progress_message(stats: &StatsSnapshot) -> String {
    match stats.percent_complete() {
        Some(percent) => format!(
            "{}/{} files ({:.1}%) | Organized: {} | Skipped: {}",
            stats.processed, stats.total, percent, stats.organized, stats.skipped
        ),
        None => format!(
            "{} files | Organized: {} | Skipped: {}",
            stats.processed, stats.organized, stats.skipped
        ),
    }
}

/// A spinner on its own thread that polls [`Stats`] until told to stop.
///
/// Reads are plain snapshots taken between updates, so the line can trail the
/// workers by up to one refresh interval.
pub struct ProgressDisplay {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl ProgressDisplay {
    pub fn start(stats: Arc<Stats>) -> Self {
        let (stop, stopped) = crossbeam_channel::bounded::<()>(1);
        let spinner = Self::create_spinner();

        let handle = thread::spawn(move || {
            loop {
                select! {
                    recv(stopped) -> _ => break,
                    default(PROGRESS_REFRESH) => {
                        spinner.set_message(progress_message(&stats.snapshot()));
                    }
                }
            }
            let last = stats.snapshot();
            spinner.finish_with_message(format!(
                "Completed! Processed: {} | Organized: {} | Skipped: {}",
                last.processed, last.organized, last.skipped
            ));
        });

        Self { stop, handle }
    }

    /// Stops the spinner and waits for its final line to be drawn.
    pub fn finish(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            tracing::warn!("progress display thread panicked");
        }
    }

    fn create_spinner() -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        // the template is a literal; fall back to the default style if it is rejected
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏✓"));
        }
        spinner.set_message("Starting");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}
