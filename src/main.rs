//! metatune binary entrypoint kept minimal. The runtime lives in `app`.

use std::fmt;
use std::sync::OnceLock;

use clap::Parser;

struct MetatuneTimer;

impl tracing_subscriber::fmt::time::FormatTime for MetatuneTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("%Y-%m-%d-T%H:%M:%S");
        write!(w, "{ts}")
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[tokio::main]
async fn main() {
    let args = metatune::args::Args::parse();

    // Initialize tracing logger writing to the metatune log directory
    {
        let mut log_path = metatune::paths::logs_dir();
        log_path.push("metatune.log");
        let env_filter = || {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.effective_log_level()))
        };
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter())
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .with_timer(MetatuneTimer)
                    .init();
                let _ = LOG_GUARD.set(guard);
                tracing::info!(path = %log_path.display(), "logging initialized");
            }
            Err(e) => {
                // Fallback: log to stderr rather than refusing to start
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter())
                    .with_target(false)
                    .with_ansi(true)
                    .with_timer(MetatuneTimer)
                    .init();
                tracing::warn!(error = %e, "failed to open log file; using stderr");
            }
        }
    }

    tracing::info!(dry_run = args.dry_run, "metatune starting");
    if let Err(err) = metatune::app::run(&args).await {
        tracing::error!(error = ?err, "application error");
        eprintln!("metatune: {err}");
        std::process::exit(1);
    }
    tracing::info!("metatune exited");
}
