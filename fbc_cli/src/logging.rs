//! Tracing subscriber setup: console (text or JSON) plus optional rolling file.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::FILE_GUARD;

fn rotation(policy: Option<&str>) -> Rotation {
    match policy {
        Some("daily") => Rotation::DAILY,
        Some("hourly") => Rotation::HOURLY,
        _ => Rotation::NEVER,
    }
}

/// Install the global subscriber.
///
/// Level precedence: `RUST_LOG`, then `--log-level`, then `[logging].level`,
/// then `info`. Console logs go to stderr so stdout stays clean for reports.
pub fn init_tracing(
    cli_level: Option<&str>,
    json: bool,
    cfg: &fbc_config::Logging,
) -> eyre::Result<()> {
    let level = cli_level
        .or(cfg.level.as_deref())
        .unwrap_or("info")
        .to_string();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let console = if json {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .boxed()
    };

    let file = match cfg.file.as_deref() {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {:?}", path))?;
            let appender =
                RollingFileAppender::new(rotation(cfg.rotation.as_deref()), dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .json()
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))
}
