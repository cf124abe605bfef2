//! File logging for the console client.
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_FILE: &str = "client.log";

/// Install a file-backed subscriber in a fresh per-run directory.
///
/// Logs go to `<base>/run_<unix seconds>/client.log`, where `<base>` is
/// `log_dir` or the platform cache directory. The console stays free for the
/// front-end. Keep the returned guard alive for the life of the process;
/// dropping it flushes and stops the writer.
pub fn setup_logging(log_dir: Option<&Path>) -> Result<(WorkerGuard, PathBuf)> {
    let base = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_log_directory()?,
    };
    let run_dir = run_directory(&base);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating log directory {}", run_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&run_dir, LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    tracing::info!("Log file: {}", run_dir.join(LOG_FILE).display());
    Ok((guard, run_dir))
}

/// Platform cache directory for logs (e.g. `~/.cache/iabs/logs` on Linux).
pub fn default_log_directory() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "iabs")
        .context("no home directory to place logs in; set IABS_LOG_DIR")?;
    Ok(dirs.cache_dir().join("logs"))
}

fn run_directory(base: &Path) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    base.join(format!("run_{secs}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_directory_lives_under_base() {
        let base = tempfile::tempdir().unwrap();
        let run = run_directory(base.path());
        assert!(run.starts_with(base.path()));
        assert!(
            run.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("run_"))
        );
    }

    #[test]
    fn setup_creates_the_run_directory() {
        let base = tempfile::tempdir().unwrap();
        let (_guard, run) = setup_logging(Some(base.path())).unwrap();
        assert!(run.is_dir());
    }
}
