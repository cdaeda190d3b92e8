use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CHATLINE_LOG";

/// Installs the global subscriber.
///
/// Logs go to a daily file under `log_dir` so they never interleave with the
/// REPL, or to stderr when `to_stderr` is set. Keep the guard alive until exit.
pub fn init(log_dir: &Path, to_stderr: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if to_stderr {
        subscriber.with_writer(std::io::stderr).init();
        return Ok(None);
    }

    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, "chatline.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    subscriber.with_writer(writer).with_ansi(false).init();
    Ok(Some(guard))
}
