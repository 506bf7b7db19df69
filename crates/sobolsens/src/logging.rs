use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter from `RUST_LOG`, falling back to `level` for this binary
/// and warnings from the estimation library.
fn env_filter(level: &str) -> EnvFilter {
    let default_filter = format!("sobolsens={level},sobolsens_core=warn");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter))
}

/// Initialize logging.
///
/// Without a log file, events go to stderr so that stdout only carries
/// results. With a log file, events are appended to it without ANSI colors.
/// The level can be overridden via the `RUST_LOG` environment variable.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> color_eyre::Result<()> {
    let (file_layer, stderr_layer) = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false);
            (Some(layer), None)
        }
        None => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false);
            (None, Some(layer))
        }
    };

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(file_layer)
        .with(stderr_layer)
        .init();

    match log_file {
        Some(path) => tracing::debug!("logging initialized (log_path={})", path.display()),
        None => tracing::debug!("logging initialized"),
    }
    Ok(())
}
