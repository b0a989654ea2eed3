use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive used when `RUST_LOG` is not set.
///
/// `0` shows warnings only, `1` adds run-level information and `2` or more adds
/// per-file debug output.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "folder_organizer=warn",
        1 => "folder_organizer=info",
        _ => "folder_organizer=debug",
    }
}

/// Installs the global subscriber, writing to stderr so it never interleaves
/// with the summary on stdout.
///
/// `RUST_LOG` takes precedence over `verbosity`. A second call is a no-op, which
/// keeps tests that initialize logging independent of each other.
pub fn init_logging(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_names(true),
        )
        .try_init();

    tracing::debug!(verbosity, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_levels() {
        assert_eq!(default_directive(0), "folder_organizer=warn");
        assert_eq!(default_directive(1), "folder_organizer=info");
        assert_eq!(default_directive(2), "folder_organizer=debug");
        assert_eq!(default_directive(9), "folder_organizer=debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(0);
        init_logging(2);
    }
}
