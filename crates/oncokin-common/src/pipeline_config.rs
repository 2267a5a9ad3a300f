//! Pipeline configuration.
//!
//! All tunables of the dataset pipeline live here so that experiments can
//! be reproduced from a single TOML file. Defaults match the published
//! analysis: 0.03 µM (30 nM) affinity cutoff, at most 5 kinases credited
//! per inhibitor, 10 negatives per positive, and a one-million-attempt
//! ceiling on rejection sampling.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{OncokinError, Result};

/// Settings for the affinity threshold + promiscuity filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterSettings {
    /// Dissociation/inhibition cutoff in micromolar. 0.03 µM = 30 nM.
    pub act_threshold_um: f64,
    /// Maximum number of kinases one inhibitor may be credited with.
    pub promiscuity_limit: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            act_threshold_um: 0.03,
            promiscuity_limit: 5,
        }
    }
}

/// Settings for negative-example rejection sampling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplerSettings {
    /// Negatives drawn per positive example.
    pub negative_factor: usize,
    /// Hard cap on sampling attempts before giving up with an error.
    pub attempt_ceiling: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            negative_factor: 10,
            attempt_ceiling: 1_000_000,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub filter: FilterSettings,
    pub sampler: SamplerSettings,
}

impl PipelineConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(raw)
            .map_err(|e| OncokinError::Config(format!("bad pipeline config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Reject settings that would make the pipeline degenerate.
    pub fn validate(&self) -> Result<()> {
        if !(self.filter.act_threshold_um > 0.0) {
            return Err(OncokinError::Config(format!(
                "act_threshold_um must be positive, got {}",
                self.filter.act_threshold_um
            )));
        }
        if self.filter.promiscuity_limit == 0 {
            return Err(OncokinError::Config(
                "promiscuity_limit must be at least 1".to_string(),
            ));
        }
        if self.sampler.negative_factor == 0 {
            return Err(OncokinError::Config(
                "negative_factor must be at least 1".to_string(),
            ));
        }
        if self.sampler.attempt_ceiling == 0 {
            return Err(OncokinError::Config(
                "attempt_ceiling must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.filter.act_threshold_um, 0.03);
        assert_eq!(cfg.filter.promiscuity_limit, 5);
        assert_eq!(cfg.sampler.negative_factor, 10);
        assert_eq!(cfg.sampler.attempt_ceiling, 1_000_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
            [filter]
            promiscuity_limit = 8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.filter.promiscuity_limit, 8);
        assert_eq!(cfg.filter.act_threshold_um, 0.03);
        assert_eq!(cfg.sampler.negative_factor, 10);
    }

    #[test]
    fn test_rejects_zero_limit() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [filter]
            promiscuity_limit = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, OncokinError::Config(_)));
    }

    #[test]
    fn test_rejects_nonpositive_threshold() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [filter]
            act_threshold_um = 0.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, OncokinError::Config(_)));
    }
}
