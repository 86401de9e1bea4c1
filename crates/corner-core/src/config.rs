//! Numeric construction parameters for a `StaticWorld` (§6), optionally
//! loaded from a TOML file.
//!
//! This is additive to — not a replacement for — the programmatic builder:
//! `StaticWorldBuilder` still takes these values directly (per the spec's
//! "collapse to a single builder" instruction). A host that prefers to keep
//! tunables in a config file can load one of these and feed its fields to
//! the builder instead of hard-coding them.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Numeric parameters provided at `StaticWorld` construction time (§6).
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PropagationConfig {
    /// Width of one traffic lane, in metres.
    pub lane_width: f64,

    /// Carrier wavelength λ, in metres.
    pub wavelength: f64,

    /// Transmission power Pt.
    pub transmit_power: f64,

    /// System loss L (signal-processing losses unrelated to propagation).
    pub system_loss: f64,

    /// Receiver sensitivity, in mW.
    pub sensitivity: f64,

    /// Loss-per-reflection ρ ∈ (0, 1].
    pub loss_per_reflection: f64,

    /// Shared bucket / grid cell side length, in metres. Default: 200.
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
}

fn default_grid_size() -> f64 {
    200.0
}

impl PropagationConfig {
    /// Parse a TOML document already read into memory.
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file from disk.
    pub fn from_toml_path(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&text)
    }

    /// `λ² / (4π)²`, precomputed since it recurs throughout the classifier's
    /// closed-form formulas.
    #[inline]
    pub fn lambda_by_4pi_sq(&self) -> f64 {
        let l4pi = self.wavelength / (4.0 * std::f64::consts::PI);
        l4pi * l4pi
    }

    /// Free-space transmission range: `(λ/4π) · √(Pt / (L · sensitivity))`.
    #[inline]
    pub fn free_space_range(&self) -> f64 {
        (self.wavelength / (4.0 * std::f64::consts::PI))
            * (self.transmit_power / (self.system_loss * self.sensitivity)).sqrt()
    }
}
