use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value {value} for parameter '{name}': {reason}")]
    InvalidValue {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// How the force of an ambiguous restraint is apportioned over its pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightingPolicy {
    /// Every pair receives `1/n` of the scalar force.
    #[default]
    Equal,
    /// Every pair is weighted by its analytic contribution to the r⁻⁶ aggregate.
    Conservative,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RestraintConfig {
    #[serde(default)]
    pub weighting: WeightingPolicy,
    #[serde(default)]
    pub mixed: bool,
    pub force_constant: f64,
    /// Relaxation time of the running average; zero disables time averaging.
    #[serde(default)]
    pub tau: f64,
    pub time_step: f64,
}

impl RestraintConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<string>")
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.force_constant.is_finite() || self.force_constant < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "force_constant",
                value: self.force_constant,
                reason: "must be finite and non-negative",
            });
        }
        if !self.tau.is_finite() || self.tau < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "tau",
                value: self.tau,
                reason: "must be finite and non-negative",
            });
        }
        if self.tau > 0.0 && !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "time_step",
                value: self.time_step,
                reason: "must be positive when time averaging is enabled",
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RestraintConfigBuilder {
    weighting: Option<WeightingPolicy>,
    mixed: Option<bool>,
    force_constant: Option<f64>,
    tau: Option<f64>,
    time_step: Option<f64>,
}

impl RestraintConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weighting(mut self, policy: WeightingPolicy) -> Self {
        self.weighting = Some(policy);
        self
    }
    pub fn mixed(mut self, enabled: bool) -> Self {
        self.mixed = Some(enabled);
        self
    }
    pub fn force_constant(mut self, k: f64) -> Self {
        self.force_constant = Some(k);
        self
    }
    pub fn tau(mut self, tau: f64) -> Self {
        self.tau = Some(tau);
        self
    }
    pub fn time_step(mut self, dt: f64) -> Self {
        self.time_step = Some(dt);
        self
    }

    pub fn build(self) -> Result<RestraintConfig, ConfigError> {
        let config = RestraintConfig {
            weighting: self.weighting.unwrap_or_default(),
            mixed: self.mixed.unwrap_or(false),
            force_constant: self
                .force_constant
                .ok_or(ConfigError::MissingParameter("force_constant"))?,
            tau: self.tau.unwrap_or(0.0),
            time_step: self
                .time_step
                .ok_or(ConfigError::MissingParameter("time_step"))?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Read-only parameters shared by every stage, derived once from a [`RestraintConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalParameters {
    pub weighting: WeightingPolicy,
    pub mixed: bool,
    pub force_constant: f64,
    pub tau: f64,
    /// `exp(-dt/tau)`, zero when time averaging is off.
    pub decay_factor: f64,
    /// `1 - decay_factor`.
    pub complement_decay: f64,
}

impl GlobalParameters {
    pub fn from_config(config: &RestraintConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (mixed, decay_factor) = if config.tau == 0.0 {
            (false, 0.0)
        } else {
            (config.mixed, (-(config.time_step / config.tau)).exp())
        };
        Ok(Self {
            weighting: config.weighting,
            mixed,
            force_constant: config.force_constant,
            tau: config.tau,
            decay_factor,
            complement_decay: 1.0 - decay_factor,
        })
    }

    #[inline]
    pub fn time_averaging(&self) -> bool {
        self.tau != 0.0
    }
}
