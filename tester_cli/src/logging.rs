//! Tracing subscriber setup: console layer plus optional JSON-lines file.

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::cli::FILE_GUARD;

/// `RUST_LOG` wins over the level picked from flags and config.
fn build_env_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn file_appender(
    path: &Path,
    rotation: Option<&str>,
) -> tracing_appender::rolling::RollingFileAppender {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map_or_else(|| "tester.log".into(), |n| n.to_string_lossy().into_owned());
    match rotation {
        Some("daily") => tracing_appender::rolling::daily(dir, name),
        Some("hourly") => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    }
}

/// Install the global subscriber. Console logs go to stderr so stdout stays
/// free for results.
pub fn init_tracing(json: bool, level: Option<&str>, logging: &tester_config::Logging) {
    let level = level.or(logging.level.as_deref()).unwrap_or("warn");
    let filter = build_env_filter(level);

    let file_layer = logging.file.as_deref().map(|file| {
        let (writer, guard) =
            tracing_appender::non_blocking(file_appender(Path::new(file), logging.rotation.as_deref()));
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_writer(writer).with_ansi(false)
    });

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    let res = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()
    };
    if res.is_err() {
        eprintln!("tracing subscriber already installed");
    }
}
