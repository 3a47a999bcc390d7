// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel configuration system

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file looked up by [`KernelConfig::load`].
pub const CONFIG_FILE: &str = "meshwright.toml";

/// Tolerances shared by curve creation, extrusion and healing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Consecutive profile points closer than this are merged
    pub weld_epsilon: f64,
    /// Profile edges shorter than this are collapsed
    pub min_edge_length: f64,
    /// Weld and collapse tolerance used when healing solids
    pub heal_tolerance: f64,
    /// Extrusions shorter than this are rejected
    pub min_extrusion: f64,
    /// Sample spacing for curves drawn on surfaces
    pub sampling_distance: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-5,
            min_edge_length: 1e-4,
            heal_tolerance: 1e-5,
            min_extrusion: 1e-4,
            sampling_distance: 0.05,
        }
    }
}

impl KernelConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: KernelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        let fields: [(&str, &mut f64); 5] = [
            ("MESHWRIGHT_WELD_EPSILON", &mut self.weld_epsilon),
            ("MESHWRIGHT_MIN_EDGE_LENGTH", &mut self.min_edge_length),
            ("MESHWRIGHT_HEAL_TOLERANCE", &mut self.heal_tolerance),
            ("MESHWRIGHT_MIN_EXTRUSION", &mut self.min_extrusion),
            ("MESHWRIGHT_SAMPLING_DISTANCE", &mut self.sampling_distance),
        ];
        for (name, slot) in fields {
            if let Ok(raw) = std::env::var(name) {
                *slot = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid value for {name}: {raw:?}"))?;
            }
        }
        Ok(())
    }

    /// Reject negative or non-finite tolerances
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("weld_epsilon", self.weld_epsilon),
            ("min_edge_length", self.min_edge_length),
            ("heal_tolerance", self.heal_tolerance),
            ("min_extrusion", self.min_extrusion),
            ("sampling_distance", self.sampling_distance),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("{name} must be a finite non-negative number, got {value}");
            }
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("kernel.toml");
        let config = KernelConfig {
            heal_tolerance: 2e-4,
            ..KernelConfig::default()
        };
        config.save(&path)?;
        let loaded = KernelConfig::from_file(&path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("kernel.toml");
        std::fs::write(&path, "min_extrusion = 0.5\n")?;
        let loaded = KernelConfig::from_file(&path)?;
        assert_eq!(loaded.min_extrusion, 0.5);
        assert_eq!(loaded.weld_epsilon, KernelConfig::default().weld_epsilon);
        Ok(())
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = KernelConfig {
            weld_epsilon: -1.0,
            ..KernelConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
