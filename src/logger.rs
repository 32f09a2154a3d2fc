//! Process-wide tracing setup. Diagnostics go to stderr (stdout belongs to
//! the UCI protocol) or to a log file when one is given.

use std::path::Path;
use std::sync::OnceLock;

use tracing_subscriber::{fmt, EnvFilter};

static GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static INIT: OnceLock<()> = OnceLock::new();

/// Initialize logging once for the whole process. `RUST_LOG` overrides the
/// default `info` filter. Safe to call repeatedly; later calls are ignored.
pub fn init(log_file: Option<&Path>) {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match log_file {
            Some(path) => {
                if let Some(dir) = path.parent() {
                    let _ = std::fs::create_dir_all(dir);
                }
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .expect("open log file");

                let (writer, guard) = tracing_appender::non_blocking(file);
                let _ = GUARD.set(guard);

                let subscriber = fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer)
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
            None => {
                let subscriber = fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
        }
    });
}
