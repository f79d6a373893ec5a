//! Tracing subscriber setup shared by the library and the CLI.
//!
//! `RUST_LOG` wins over the configured level when it is set. Output goes to
//! stderr so command output on stdout stays clean.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_ENV: &str = "SHELE_NEWS_LOG_FORMAT";
pub const LOG_LEVEL_ENV: &str = "SHELE_NEWS_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain lines without colour, for piping.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
    /// Multi-line coloured output for development.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "invalid log format '{s}', expected one of: text, json, pretty"
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    /// Forces `debug` when `RUST_LOG` is unset.
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: impl Into<String>, verbose: bool) -> Self {
        Self {
            format,
            level: level.into(),
            verbose,
        }
    }

    /// Reads the format and level from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = lookup(LOG_FORMAT_ENV)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        let level = lookup(LOG_LEVEL_ENV)
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());
        Self::new(format, level, false)
    }

    pub fn filter_directive(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    /// Installs the global subscriber. Returns false when one was already set.
    pub fn init(&self) -> bool {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.filter_directive()));

        let installed = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .flatten_event(true)
                .with_current_span(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .try_init(),
        };
        installed.is_ok()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(LogFormat::Text, "info", false)
    }
}

pub fn init_default() -> bool {
    LoggingConfig::from_env().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        let error = "yaml".parse::<LogFormat>().unwrap_err();
        assert!(error.contains("invalid log format 'yaml'"));
        assert_eq!(LogFormat::Text.to_string(), "text");
    }

    #[test]
    fn lookup_falls_back_to_text_and_info() {
        let config = LoggingConfig::from_lookup(|key| match key {
            LOG_FORMAT_ENV => Some("nonsense".to_string()),
            LOG_LEVEL_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config, LoggingConfig::default());

        let config = LoggingConfig::from_lookup(|key| match key {
            LOG_FORMAT_ENV => Some("json".to_string()),
            LOG_LEVEL_ENV => Some("shele_news=trace".to_string()),
            _ => None,
        });
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter_directive(), "shele_news=trace");
    }

    #[test]
    fn verbose_overrides_level() {
        let config = LoggingConfig::new(LogFormat::Text, "warn", true);
        assert_eq!(config.filter_directive(), "debug");
    }

    #[test]
    fn second_init_reports_existing_subscriber() {
        LoggingConfig::default().init();
        assert!(!LoggingConfig::default().init());
    }
}
