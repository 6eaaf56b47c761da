// src/config.rs

use crate::api::{DEFAULT_ENDPOINT, MAX_BATCH_SIZE};
use crate::error::ConfigError;
use crate::watcher::WatcherConfig;
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ytreact-overview",
    version,
    about = "Shows like and dislike counts next to videos on YouTube listing pages"
)]
pub struct Args {
    /// YouTube Data API key
    #[arg(long, env = "YTRO_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Statistics endpoint (videos.list)
    #[arg(long, env = "YTRO_API_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub api_endpoint: String,

    /// Ids per request, at most 50
    #[arg(long, env = "YTRO_BATCH_SIZE", default_value_t = MAX_BATCH_SIZE)]
    pub batch_size: usize,

    /// Page to open
    #[arg(long, env = "YTRO_START_URL", default_value = "https://www.youtube.com/")]
    pub start_url: String,

    /// Milliseconds between checks for the page's content container
    #[arg(long, default_value_t = 500)]
    pub poll_ms: u64,

    /// Give up waiting for the content container after this many checks (0 = never)
    #[arg(long, default_value_t = 0)]
    pub ready_attempts: usize,

    /// Seconds between status lines
    #[arg(long, default_value_t = 10)]
    pub status_interval_secs: u64,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,
}

/// Validated runtime settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub api_endpoint: String,
    pub start_url: String,
    pub headless: bool,
    pub watcher: WatcherConfig,
}

impl Args {
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(ConfigError::BatchSize {
                got: self.batch_size,
                max: MAX_BATCH_SIZE,
            });
        }
        if self.poll_ms == 0 {
            return Err(ConfigError::PollInterval);
        }

        Ok(Settings {
            api_key: api_key.to_string(),
            api_endpoint: self.api_endpoint.clone(),
            start_url: self.start_url.clone(),
            headless: self.headless,
            watcher: WatcherConfig {
                batch_size: self.batch_size,
                poll_interval: Duration::from_millis(self.poll_ms),
                ready_attempts: (self.ready_attempts > 0).then_some(self.ready_attempts),
                status_interval: Duration::from_secs(self.status_interval_secs.max(1)),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("ytreact-overview").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_match_api_limits() {
        let settings = parse(&["--api-key", "k"]).settings().unwrap();
        assert_eq!(settings.api_endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.watcher.batch_size, 50);
        assert_eq!(settings.watcher.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.watcher.ready_attempts, None);
        assert!(!settings.headless);
    }

    #[test]
    fn rejects_oversized_batches() {
        let err = parse(&["--api-key", "k", "--batch-size", "51"])
            .settings()
            .unwrap_err();
        assert_eq!(err, ConfigError::BatchSize { got: 51, max: 50 });

        let err = parse(&["--api-key", "k", "--batch-size", "0"])
            .settings()
            .unwrap_err();
        assert_eq!(err, ConfigError::BatchSize { got: 0, max: 50 });
    }

    #[test]
    fn rejects_blank_key() {
        let err = parse(&["--api-key", "   "]).settings().unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn bounded_wait_is_optional() {
        let settings = parse(&["--api-key", "k", "--ready-attempts", "20", "--headless"])
            .settings()
            .unwrap();
        assert_eq!(settings.watcher.ready_attempts, Some(20));
        assert!(settings.headless);
    }
}
