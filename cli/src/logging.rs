//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Logs go to stderr so stdout carries only the document. `MML_LOG` takes
//! an `EnvFilter` directive and overrides the verbosity flags unless they
//! were given explicitly.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "MML_LOG";

const CRATES: &[&str] = &[
    "mml_cli",
    "mml_core",
    "mml_graph",
    "mml_shared",
    "mml_parser",
    "mml_filter",
    "mml_undo",
    "mml_change",
];

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level_filter: LevelFilter,
    /// Let `MML_LOG` override `level_filter`.
    pub use_env_filter: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::WARN,
            use_env_filter: true,
            with_ansi: false,
        }
    }
}

/// Filter directive applying `level` to the workspace crates. Other crates
/// stay at `warn`.
pub fn default_directive(level: LevelFilter) -> String {
    let level = level.to_string().to_lowercase();
    let mut directive = String::from("warn");
    for name in CRATES {
        directive.push_str(&format!(",{name}={level}"));
    }
    directive
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let fallback = || EnvFilter::new(default_directive(config.level_filter));
    if config.use_env_filter {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| fallback())
    } else {
        fallback()
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();
    tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with(layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        // GIVEN/WHEN
        let directive = default_directive(LevelFilter::DEBUG);

        // THEN
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("mml_change=debug"));
        assert!(directive.contains("mml_parser=debug"));
    }
}
