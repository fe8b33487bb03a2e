//! Strategy parameter overrides.
//!
//! A flat mapping of option name to numeric or boolean value. Strategies read
//! it once, in their config constructors, and clamp what they read there.

use std::collections::BTreeMap;

use crate::domain::error::ProbtraderError;
use crate::ports::config_port::ConfigPort;

pub const PARAMS_SECTION: &str = "params";

/// Largest window any strategy will allocate for a single token.
pub const MAX_PERIOD: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Bool(bool),
}

impl ParamValue {
    /// `true`/`false`/`yes`/`no` become booleans, anything else must parse as `f64`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "true" | "yes" => Some(ParamValue::Bool(true)),
            "false" | "no" => Some(ParamValue::Bool(false)),
            _ => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(ParamValue::Number),
        }
    }

    fn as_number(self) -> f64 {
        match self {
            ParamValue::Number(v) => v,
            ParamValue::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn as_flag(self) -> bool {
        match self {
            ParamValue::Bool(b) => b,
            ParamValue::Number(v) => v > 0.5,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    values: BTreeMap<String, ParamValue>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every parseable key of `section`; unparseable values are skipped.
    pub fn from_config(config: &dyn ConfigPort, section: &str) -> Self {
        let mut params = Self::new();
        for key in config.keys(section) {
            let parsed = config
                .get_string(section, &key)
                .as_deref()
                .and_then(ParamValue::parse);
            match parsed {
                Some(value) => params.insert(&key, value),
                None => tracing::debug!(key = %key, "ignoring unparseable parameter"),
            }
        }
        params
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<ParamValue> {
        self.values.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn number(&self, key: &str, default: f64) -> f64 {
        self.get(key).map_or(default, ParamValue::as_number)
    }

    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key).map_or(default, ParamValue::as_flag)
    }

    /// An integer period: floored, then raised to at least `min`. Values above
    /// [`MAX_PERIOD`] are rejected.
    pub fn period(&self, key: &str, default: usize, min: usize) -> Result<usize, ProbtraderError> {
        let raw = self.number(key, default as f64).floor();
        if raw > MAX_PERIOD as f64 {
            return Err(ProbtraderError::invalid_param(
                key,
                format!("must be <= {MAX_PERIOD}, got {raw}"),
            ));
        }
        if raw.is_nan() || raw < min as f64 {
            return Ok(min);
        }
        Ok(raw as usize)
    }

    /// A non-negative fraction such as a stop distance.
    pub fn fraction(&self, key: &str, default: f64) -> Result<f64, ProbtraderError> {
        let v = self.number(key, default);
        if !(v >= 0.0) {
            return Err(ProbtraderError::invalid_param(key, format!("must be >= 0, got {v}")));
        }
        Ok(v)
    }

    /// A flag that has no built-in default.
    pub fn require_flag(&self, key: &str) -> Result<bool, ProbtraderError> {
        self.get(key)
            .map(ParamValue::as_flag)
            .ok_or_else(|| ProbtraderError::ConfigMissing {
                section: PARAMS_SECTION.to_string(),
                key: key.to_string(),
            })
    }
}
