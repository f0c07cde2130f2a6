//! Tracing subscriber setup for the CLI.
//!
//! `RUST_LOG` directives take precedence. Crates of this workspace that
//! `RUST_LOG` does not mention log at the `TFQ_LOG` level (default `warn`).
//! Everything goes to stderr so query output on stdout stays clean.

use std::{io::IsTerminal, sync::Once};

use tracing_subscriber::{
    EnvFilter,
    filter::{Directive, LevelFilter},
};

static TFQ_LOG_ENV_VAR: &str = "TFQ_LOG";

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Crates whose level follows `TFQ_LOG`.
const TFQ_CRATES: &[&str] = &["tableflow_core", "tableflow_datafusion", "tfq"];

pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (env_filter, level) = env_filter_and_log_level();

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();

        tracing::debug!("log level: {level}");
    });
}

fn env_filter_and_log_level() -> (EnvFilter, String) {
    let directive_string = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let mut env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(&directive_string);

    let level =
        std::env::var(TFQ_LOG_ENV_VAR).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

    for crate_name in TFQ_CRATES {
        if directive_string.contains(&format!("{crate_name}=")) {
            continue;
        }
        match format!("{crate_name}={level}").parse::<Directive>() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => {
                eprintln!("ignoring invalid {TFQ_LOG_ENV_VAR}={level:?}: {e}");
                break;
            }
        }
    }

    (env_filter, level)
}
