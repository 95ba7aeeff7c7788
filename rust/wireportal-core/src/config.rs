use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::world::Material;

pub const DEFAULT_CAP_MATERIAL: Material = Material(25); // note block
pub const DEFAULT_WIRE_MATERIAL: Material = Material(35); // wool
pub const DEFAULT_MAX_TRACE_STEPS: u32 = 512; // 32 chunks
pub const DEFAULT_MIN_REACTIVATION_MS: u64 = 6_000;
pub const DEFAULT_MAX_ACTIVATION_DISTANCE: f64 = 3.0;
pub const DEFAULT_COMMIT_DELAY_TICKS: u32 = 75; // ~3.75s at 20 ticks/s
pub const DEFAULT_CONFUSION_TICKS: u32 = 150;
pub const DEFAULT_ACTIVATION_TTL_MS: u64 = 60_000;
pub const DEFAULT_ACTIVATION_CAPACITY: usize = 4096;

/// Portal tunables. Immutable once handed to a `Portal`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub cap_material: Material,
    pub wire_material: Material,
    pub max_trace_steps: u32,
    pub min_reactivation_ms: u64,
    pub max_activation_distance: f64,
    pub commit_delay_ticks: u32,
    pub confusion_ticks: u32,
    pub activation_ttl_ms: u64,
    pub activation_capacity: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            cap_material: DEFAULT_CAP_MATERIAL,
            wire_material: DEFAULT_WIRE_MATERIAL,
            max_trace_steps: DEFAULT_MAX_TRACE_STEPS,
            min_reactivation_ms: DEFAULT_MIN_REACTIVATION_MS,
            max_activation_distance: DEFAULT_MAX_ACTIVATION_DISTANCE,
            commit_delay_ticks: DEFAULT_COMMIT_DELAY_TICKS,
            confusion_ticks: DEFAULT_CONFUSION_TICKS,
            activation_ttl_ms: DEFAULT_ACTIVATION_TTL_MS,
            activation_capacity: DEFAULT_ACTIVATION_CAPACITY,
        }
    }
}

impl PortalConfig {
    /// Overlay environment variables on the defaults. Unset variables keep the default;
    /// set-but-unparseable ones are an error.
    ///
    /// Variables:
    /// - WIREPORTAL_CAP_MATERIAL / WIREPORTAL_WIRE_MATERIAL: material ids
    /// - WIREPORTAL_MAX_TRACE_STEPS
    /// - WIREPORTAL_MIN_REACTIVATION_MS
    /// - WIREPORTAL_MAX_ACTIVATION_DISTANCE
    /// - WIREPORTAL_COMMIT_DELAY_TICKS
    /// - WIREPORTAL_CONFUSION_TICKS
    /// - WIREPORTAL_ACTIVATION_TTL_MS
    /// - WIREPORTAL_ACTIVATION_CAPACITY
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parse_var::<u16, _>(&lookup, "WIREPORTAL_CAP_MATERIAL")? {
            cfg.cap_material = Material(v);
        }
        if let Some(v) = parse_var::<u16, _>(&lookup, "WIREPORTAL_WIRE_MATERIAL")? {
            cfg.wire_material = Material(v);
        }
        if let Some(v) = parse_var(&lookup, "WIREPORTAL_MAX_TRACE_STEPS")? {
            cfg.max_trace_steps = v;
        }
        if let Some(v) = parse_var(&lookup, "WIREPORTAL_MIN_REACTIVATION_MS")? {
            cfg.min_reactivation_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "WIREPORTAL_MAX_ACTIVATION_DISTANCE")? {
            cfg.max_activation_distance = v;
        }
        if let Some(v) = parse_var(&lookup, "WIREPORTAL_COMMIT_DELAY_TICKS")? {
            cfg.commit_delay_ticks = v;
        }
        if let Some(v) = parse_var(&lookup, "WIREPORTAL_CONFUSION_TICKS")? {
            cfg.confusion_ticks = v;
        }
        if let Some(v) = parse_var(&lookup, "WIREPORTAL_ACTIVATION_TTL_MS")? {
            cfg.activation_ttl_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "WIREPORTAL_ACTIVATION_CAPACITY")? {
            cfg.activation_capacity = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse from JSON; missing fields take defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: PortalConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cap_material == self.wire_material {
            return Err(ConfigError::invalid("wire_material", "must differ from cap_material"));
        }
        if self.cap_material == Material::AIR || self.wire_material == Material::AIR {
            return Err(ConfigError::invalid("cap_material", "cap and wire must not be air"));
        }
        if self.max_trace_steps == 0 {
            return Err(ConfigError::invalid("max_trace_steps", "must be positive"));
        }
        if !self.max_activation_distance.is_finite() || self.max_activation_distance <= 0.0 {
            return Err(ConfigError::invalid("max_activation_distance", "must be a positive finite number"));
        }
        if self.commit_delay_ticks == 0 {
            return Err(ConfigError::invalid("commit_delay_ticks", "must be positive"));
        }
        if self.activation_capacity == 0 {
            return Err(ConfigError::invalid("activation_capacity", "must be positive"));
        }
        if self.activation_ttl_ms < self.min_reactivation_ms {
            return Err(ConfigError::invalid(
                "activation_ttl_ms",
                format!("must be at least min_reactivation_ms ({})", self.min_reactivation_ms),
            ));
        }
        Ok(())
    }

    pub fn min_reactivation(&self) -> Duration {
        Duration::from_millis(self.min_reactivation_ms)
    }

    pub fn activation_ttl(&self) -> Duration {
        Duration::from_millis(self.activation_ttl_ms)
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value: raw }),
    }
}
