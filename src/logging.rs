use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// `RUST_LOG` takes precedence over the configured level.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(&config.level);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match LogFormat::from_str_config(&config.format) {
        LogFormat::Json => builder.json().with_ansi(false).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    installed.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::from_str_config("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_config("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_config("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str_config("bogus"), LogFormat::Pretty);
    }
}
