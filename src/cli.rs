//! Command-line front end.
//!
//! Parses arguments with `clap`, merges them over the settings file, runs the
//! organizer and reports the outcome on stdout.

use crate::cleanup::cleanup_empty_directories;
use crate::config::Settings;
use crate::error::ConfigError;
use crate::organize::{OrganizeOptions, organize};
use crate::output::OutputFormatter;
use crate::stats::StatsSnapshot;
use anyhow::{Context, Result, ensure};
use clap::Parser;
use std::path::PathBuf;

/// Sort files into `<category>/<extension>/` folders.
#[derive(Debug, Parser)]
#[command(name = "folder-organizer", version, about, long_about = None)]
pub struct Cli {
    /// JSON document mapping categories to file extensions
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Directory to organize
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub directory: PathBuf,

    /// Number of concurrent movers [default: 4]
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Only organize files directly inside DIRECTORY
    #[arg(long)]
    pub no_recursive: bool,

    /// Do not show the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Keep empty directories after organizing
    #[arg(long)]
    pub no_cleanup: bool,

    /// Settings file to use instead of the discovered one
    #[arg(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    pub settings: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Fully resolved parameters of one invocation.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub options: OrganizeOptions,
    pub cleanup: bool,
}

/// What an invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub stats: StatsSnapshot,
    /// `None` when cleanup was disabled.
    pub removed_directories: Option<usize>,
}

impl Cli {
    /// Applies the flags on top of `settings`. Flags only ever narrow the
    /// settings: `--no-recursive` turns recursion off but nothing turns it on.
    pub fn plan(&self, settings: &Settings) -> Result<RunPlan, ConfigError> {
        let filters = settings.filters.compile()?;
        let organizer = &settings.organizer;

        let options = OrganizeOptions {
            workers: self.workers.unwrap_or(organizer.workers),
            recursive: organizer.recursive && !self.no_recursive,
            show_progress: organizer.progress && !self.no_progress,
            filters,
            ..OrganizeOptions::new(&self.config, &self.directory)
        };

        Ok(RunPlan {
            options,
            cleanup: organizer.cleanup && !self.no_cleanup,
        })
    }
}

/// Runs the whole command: organize, print the summary, then reclaim empty
/// directories if enabled.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use folder_organizer::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["folder-organizer", "categories.json", "/home/me/Downloads"]);
/// let report = run_cli(&cli)?;
/// println!("{} files organized", report.stats.organized);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunReport> {
    ensure!(
        cli.directory.is_dir(),
        "{} is not a directory",
        cli.directory.display()
    );

    let settings = Settings::load(cli.settings.as_deref()).context("Error loading settings")?;
    let plan = cli.plan(&settings).context("Error compiling filters")?;

    OutputFormatter::info(&format!(
        "Organizing {} with {} workers",
        cli.directory.display(),
        plan.options.workers
    ));

    let stats = organize(&plan.options)
        .with_context(|| format!("Failed to organize {}", cli.directory.display()))?;

    OutputFormatter::summary(&stats);
    if stats.skipped > 0 {
        OutputFormatter::warning(&format!(
            "{} files were left in place (no mapping or move failed)",
            stats.skipped
        ));
    }

    let removed_directories = if plan.cleanup {
        let removed = cleanup_empty_directories(&cli.directory)
            .context("Failed to clean up empty directories")?;
        OutputFormatter::cleanup_result(removed);
        Some(removed)
    } else {
        None
    };

    OutputFormatter::success("Organization complete!");

    Ok(RunReport {
        stats,
        removed_directories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["folder-organizer", "categories.json", "/data"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("Failed to parse arguments")
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_come_from_settings() {
        let plan = parse(&[]).plan(&Settings::default()).unwrap();

        assert_eq!(plan.options.workers, 4);
        assert!(plan.options.recursive);
        assert!(plan.options.show_progress);
        assert!(plan.cleanup);
        assert_eq!(plan.options.config_path, PathBuf::from("categories.json"));
        assert_eq!(plan.options.source_path, PathBuf::from("/data"));
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = parse(&["-w", "9", "--no-recursive", "--no-progress", "--no-cleanup", "-vv"]);
        let plan = cli.plan(&Settings::default()).unwrap();

        assert_eq!(plan.options.workers, 9);
        assert!(!plan.options.recursive);
        assert!(!plan.options.show_progress);
        assert!(!plan.cleanup);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_settings_apply_without_flags() {
        let mut settings = Settings::default();
        settings.organizer.workers = 2;
        settings.organizer.cleanup = false;

        let plan = parse(&[]).plan(&settings).unwrap();

        assert_eq!(plan.options.workers, 2);
        assert!(!plan.cleanup);
    }

    #[test]
    fn test_invalid_filter_pattern_fails_plan() {
        let mut settings = Settings::default();
        settings.filters.exclude.regex.push("(".to_string());

        assert!(parse(&[]).plan(&settings).is_err());
    }

    #[test]
    fn test_missing_positional_arguments() {
        assert!(Cli::try_parse_from(["folder-organizer", "categories.json"]).is_err());
    }

    #[test]
    fn test_run_cli_end_to_end() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = temp_dir.path().join("categories.json");
        fs::write(&config, r#"{"categories": {"images": [".jpg"]}}"#).unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir_all(root.join("old/empty")).unwrap();
        fs::write(root.join("a.jpg"), "a").unwrap();
        let settings = temp_dir.path().join("settings.toml");
        fs::write(&settings, "[organizer]\nprogress = false\n").unwrap();

        let cli = Cli::try_parse_from([
            OsStr::new("folder-organizer"),
            config.as_os_str(),
            root.as_os_str(),
            OsStr::new("--settings"),
            settings.as_os_str(),
        ])
        .unwrap();
        let report = run_cli(&cli).unwrap();

        assert_eq!(report.stats.organized, 1);
        assert_eq!(report.removed_directories, Some(2));
        assert!(root.join("images/jpg/a.jpg").exists());
        assert!(!root.join("old").exists());
    }

    #[test]
    fn test_run_cli_rejects_missing_directory() {
        let cli = parse(&["--settings", "/non/existent/settings.toml"]);
        assert!(run_cli(&cli).is_err());
    }
}
