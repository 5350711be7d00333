use std::{fmt, path::Path, str::FromStr, time::Duration};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("apiUrl is required")]
    MissingUrl,
    #[error("invalid apiUrl '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("HTTP method '{0}' is not supported (expected GET or POST)")]
    UnsupportedMethod(String),
    #[error("concurrentRequests must be at least 1")]
    NoWorkers,
    #[error("durationSeconds must be at least 1")]
    NoDuration,
    #[error("durationSeconds {0} is too large")]
    DurationTooLong(u64),
}

/// Request verbs the engine knows how to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl FromStr for HttpMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            _ => Err(ConfigError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// Load test description as read from the JSON config file.
///
/// Values are kept raw here; [`LoadTestConfig::validate`] turns them into a
/// [`RunPlan`] the engine can execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default = "default_method")]
    pub http_method: String,
    #[serde(default = "default_concurrency")]
    pub concurrent_requests: usize,
    #[serde(default = "default_duration")]
    pub duration_seconds: u64,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_concurrency() -> usize {
    10
}

fn default_duration() -> u64 {
    10
}

impl LoadTestConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            http_method: default_method(),
            concurrent_requests: default_concurrency(),
            duration_seconds: default_duration(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check every field and produce the plan the engine runs.
    pub fn validate(&self) -> Result<RunPlan, ConfigError> {
        let raw_url = self.api_url.trim();
        if raw_url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        let url = Url::parse(raw_url).map_err(|e| ConfigError::InvalidUrl {
            url: raw_url.to_string(),
            reason: e.to_string(),
        })?;
        let method: HttpMethod = self.http_method.parse()?;
        if self.concurrent_requests == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.duration_seconds == 0 {
            return Err(ConfigError::NoDuration);
        }
        let plan = RunPlan {
            endpoint: raw_url.to_string(),
            url,
            method,
            workers: self.concurrent_requests,
            duration: Duration::from_secs(self.duration_seconds),
        };
        // the engine needs `now + duration` to be representable
        plan.deadline_from(Instant::now())?;

        Ok(plan)
    }
}

/// A validated [`LoadTestConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    /// The URL as configured; recorded verbatim on every observation.
    pub endpoint: String,
    pub url: Url,
    pub method: HttpMethod,
    pub workers: usize,
    pub duration: Duration,
}

impl RunPlan {
    /// The instant a run started at `start` must stop.
    pub fn deadline_from(&self, start: Instant) -> Result<Instant, ConfigError> {
        start
            .checked_add(self.duration)
            .ok_or(ConfigError::DurationTooLong(self.duration.as_secs()))
    }
}
