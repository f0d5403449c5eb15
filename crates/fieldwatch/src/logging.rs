use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Floor for every target unless `RUST_LOG` says otherwise.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// `--log-level` as the default directive, refined by `directives` (the
/// `RUST_LOG` syntax). Unparsable directives are skipped.
fn filter(level: LogLevel, directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Install the process-wide stderr subscriber. Timer and notifier threads log
/// too, so lines carry the thread name.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter(level, directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_target(false)
        .with_ansi(false);

    let installed = match format {
        LogFormat::Json => subscriber.json().try_init(),
        LogFormat::Text => subscriber.try_init(),
    };
    // A second init (tests) keeps the first subscriber.
    drop(installed);
}
