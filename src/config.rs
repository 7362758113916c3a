use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Static range assumed until the device reports its own bounds.
pub const DEFAULT_MIN_POSITION: f64 = 0.0;
pub const DEFAULT_MAX_POSITION: f64 = 20000.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("{0}")]
    Validation(String),
}

/// Direction the firmware should always finish a move from, so that the
/// final approach takes up gear slack the same way every time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApproachDirection {
    #[serde(rename = "CW")]
    ClockwiseOnly,
    #[serde(rename = "CCW")]
    CounterclockwiseOnly,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl ApproachDirection {
    /// Value sent in the `alwaysApproach` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::ClockwiseOnly => "CW",
            Self::CounterclockwiseOnly => "CCW",
            Self::Unset => "",
        }
    }
}

impl FromStr for ApproachDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CW" => Ok(Self::ClockwiseOnly),
            "CCW" => Ok(Self::CounterclockwiseOnly),
            "" | "NONE" => Ok(Self::Unset),
            other => Err(format!("unknown approach direction '{other}'")),
        }
    }
}

impl fmt::Display for ApproachDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Connection settings for one focuser. Supplied and persisted by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocuserConfig {
    pub endpoint: String,
    #[serde(default)]
    pub backlash_steps: u32,
    #[serde(default)]
    pub always_approach: ApproachDirection,
    #[serde(default)]
    pub power_off_url: Option<String>,
    #[serde(default)]
    pub power_on_url: Option<String>,
    #[serde(default = "default_min_position")]
    pub min_position: f64,
    #[serde(default = "default_max_position")]
    pub max_position: f64,
}

fn default_min_position() -> f64 {
    DEFAULT_MIN_POSITION
}

fn default_max_position() -> f64 {
    DEFAULT_MAX_POSITION
}

fn env_required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or_default<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

impl FocuserConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            backlash_steps: 0,
            always_approach: ApproachDirection::Unset,
            power_off_url: None,
            power_on_url: None,
            min_position: DEFAULT_MIN_POSITION,
            max_position: DEFAULT_MAX_POSITION,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            endpoint: env_required("FOCUSER_ENDPOINT")?,
            backlash_steps: env_or_default("FOCUSER_BACKLASH_STEPS", 0)?,
            always_approach: env_or_default("FOCUSER_ALWAYS_APPROACH", ApproachDirection::Unset)?,
            power_off_url: env_optional("FOCUSER_POWER_OFF_URL"),
            power_on_url: env_optional("FOCUSER_POWER_ON_URL"),
            min_position: env_or_default("FOCUSER_MIN_POSITION", DEFAULT_MIN_POSITION)?,
            max_position: env_or_default("FOCUSER_MAX_POSITION", DEFAULT_MAX_POSITION)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::Validation(
                "FOCUSER_ENDPOINT must not be empty".into(),
            ));
        }
        if !is_http_url(&self.endpoint) {
            return Err(ConfigError::Validation(format!(
                "endpoint '{}' is not an http(s) URL",
                self.endpoint
            )));
        }
        for url in [&self.power_off_url, &self.power_on_url].into_iter().flatten() {
            if !is_http_url(url) {
                return Err(ConfigError::Validation(format!(
                    "power URL '{url}' is not an http(s) URL"
                )));
            }
        }
        if !(self.min_position <= self.max_position) {
            return Err(ConfigError::Validation(format!(
                "min position {} exceeds max position {}",
                self.min_position, self.max_position
            )));
        }
        Ok(())
    }

    /// True when at least one of the power switch URLs is configured.
    pub fn can_power_cycle(&self) -> bool {
        self.power_off_url.is_some() || self.power_on_url.is_some()
    }

    /// Build the move command understood by the firmware:
    /// `<endpoint>?absolutePosition=N&backlashSteps=N&alwaysApproach=CW|CCW|`
    pub fn move_url(&self, target: i64) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}absolutePosition={}&backlashSteps={}&alwaysApproach={}",
            self.endpoint,
            separator,
            target,
            self.backlash_steps,
            self.always_approach.as_param()
        )
    }
}

fn is_http_url(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}
