use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Crates whose events pass the `--log-level` filter.
const LOG_TARGETS: &[&str] = &["crater", "crater_core", "crater_link", "crater_fsw"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Directive string enabling `self` for every crater crate.
    pub fn directives(self) -> String {
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the stderr subscriber. `RUST_LOG`, when set, replaces `--log-level`.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::builder().from_env_lossy()
    } else {
        EnvFilter::builder().parse_lossy(level.directives())
    };

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
