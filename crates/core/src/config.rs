use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};

pub const DEFAULT_SMOOTHING_WINDOW: usize = 8;
pub const DEFAULT_DETECTION_INTERVAL_SECS: f64 = 2.0;
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Capacity of the recent-observation buffer. Must be positive; a zero-length
/// window would make the recency weighting degenerate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SmoothingWindow(usize);

impl SmoothingWindow {
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroSmoothingWindow);
        }
        Ok(Self(size))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self(DEFAULT_SMOOTHING_WINDOW)
    }
}

/// Minimum wall-clock spacing between actual classifier invocations,
/// decoupled from the frame-read rate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DetectionInterval(f64);

impl DetectionInterval {
    pub fn from_secs(secs: f64) -> Result<Self, ConfigError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ConfigError::NonPositiveInterval(secs));
        }
        Ok(Self(secs))
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.0)
    }
}

impl Default for DetectionInterval {
    fn default() -> Self {
        Self(DEFAULT_DETECTION_INTERVAL_SECS)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectorConfig {
    pub smoothing_window: SmoothingWindow,
    pub detection_interval: DetectionInterval,
}

impl DetectorConfig {
    pub fn new(smoothing_window: usize, detection_interval_secs: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            smoothing_window: SmoothingWindow::new(smoothing_window)?,
            detection_interval: DetectionInterval::from_secs(detection_interval_secs)?,
        })
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKeys {
    pub openai: Option<ApiKey>,
}

/// Full application configuration assembled by the binary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub api_keys: ApiKeys,
    pub journal_db: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("smoothing window must be > 0")]
    ZeroSmoothingWindow,
    #[error("detection interval must be a positive number of seconds, got {0}")]
    NonPositiveInterval(f64),
    #[error("api key must not be empty")]
    EmptyApiKey,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_window_is_rejected() {
        assert_eq!(
            SmoothingWindow::new(0),
            Err(ConfigError::ZeroSmoothingWindow)
        );
        assert_eq!(SmoothingWindow::new(8).map(|w| w.get()), Ok(8));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        assert!(DetectionInterval::from_secs(0.0).is_err());
        assert!(DetectionInterval::from_secs(-1.5).is_err());
        assert!(DetectionInterval::from_secs(f64::NAN).is_err());
        assert!(DetectionInterval::from_secs(f64::INFINITY).is_err());
        let interval = DetectionInterval::from_secs(2.5).expect("valid");
        assert_eq!(interval.as_secs_f64(), 2.5);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = DetectorConfig::default();
        assert_eq!(config.smoothing_window.get(), 8);
        assert_eq!(config.detection_interval.as_secs_f64(), 2.0);
    }

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_OPENAI_API_KEY, "env-key");
        let key = resolve_api_key(Some("cli-key".to_owned()), ENV_OPENAI_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_OPENAI_API_KEY, "env-key");
        let key = resolve_api_key(None, ENV_OPENAI_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "env-key");
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let env = MapEnv::default().with_var(ENV_OPENAI_API_KEY, "  ");
        assert_eq!(
            resolve_api_key(None, ENV_OPENAI_API_KEY, &env),
            Err(ConfigError::EmptyApiKey)
        );
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret").expect("valid");
        assert_eq!(format!("{key:?}"), "ApiKey(**redacted**)");
    }
}
