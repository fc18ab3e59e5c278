// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{QrmagicError, Result};

/// When the search stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Stop at the first strategy that decodes anything.
    #[default]
    Fast,
    /// Run the whole plan and union every payload found.
    Exhaustive,
}

/// Settings that shape the search plan and the worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: SearchMode,
    /// Worker count; `None` means one per available CPU.
    pub concurrency: Option<usize>,
    /// Scale factors in the order they are tried, each in (0, 1].
    pub scale_plan: Vec<f32>,
    /// Sharpen amounts tried at every scale; 1.0 means "no sharpening".
    pub sharpen_amounts: Vec<f32>,
    /// Also try a histogram-stretched view at every scale.
    pub include_contrast: bool,
    pub include_rotation: bool,
    pub rotation_degrees: Vec<f32>,
    /// Also try overlapping crops of the full-resolution image.
    pub include_tiles: bool,
    pub tile_divisions: u32,
    /// Skip down-scaling strategies whose shorter side would fall below this.
    ///
    /// Skipped strategies leave no attempt record, so with a non-zero floor
    /// the plan position of an attempt is its `strategy_index`, not its
    /// position in the attempt list.
    pub min_side_px: u32,
    /// Cancel not-yet-started jobs after the first load failure.
    pub fail_fast: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Fast,
            concurrency: None,
            scale_plan: vec![0.1, 0.2, 0.5, 1.0],
            sharpen_amounts: vec![1.0, 1.5, 0.5, 0.1],
            include_contrast: true,
            include_rotation: false,
            rotation_degrees: (1..=8).map(|step| step as f32 * 10.0).collect(),
            include_tiles: false,
            tile_divisions: 6,
            min_side_px: 0,
            fail_fast: false,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Resolved worker count.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Reject configurations that would make every search a silent no-op.
    pub fn validate(&self) -> Result<()> {
        if self.scale_plan.is_empty() {
            return Err(QrmagicError::Configuration("scale_plan is empty".into()));
        }
        if let Some(bad) = self
            .scale_plan
            .iter()
            .find(|f| !f.is_finite() || **f <= 0.0 || **f > 1.0)
        {
            return Err(QrmagicError::Configuration(format!(
                "scale factor {bad} is outside (0, 1]"
            )));
        }
        if self.sharpen_amounts.is_empty() {
            return Err(QrmagicError::Configuration(
                "sharpen_amounts is empty (use [1.0] for no sharpening)".into(),
            ));
        }
        if let Some(bad) = self
            .sharpen_amounts
            .iter()
            .find(|a| !a.is_finite() || **a <= 0.0)
        {
            return Err(QrmagicError::Configuration(format!(
                "sharpen amount {bad} must be a positive number"
            )));
        }
        if self.concurrency == Some(0) {
            return Err(QrmagicError::Configuration(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.include_rotation {
            if self.rotation_degrees.is_empty() {
                return Err(QrmagicError::Configuration(
                    "include_rotation is set but rotation_degrees is empty".into(),
                ));
            }
            if let Some(bad) = self.rotation_degrees.iter().find(|d| !d.is_finite()) {
                return Err(QrmagicError::Configuration(format!(
                    "rotation angle {bad} is not finite"
                )));
            }
        }
        if self.include_tiles && self.tile_divisions < 2 {
            return Err(QrmagicError::Configuration(format!(
                "tile_divisions must be at least 2, got {}",
                self.tile_divisions
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.mode, SearchMode::Fast);
        assert_eq!(config.rotation_degrees.first(), Some(&10.0));
        assert_eq!(config.rotation_degrees.last(), Some(&80.0));
        assert!(config.effective_concurrency() >= 1);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"mode": "exhaustive", "concurrency": 2}"#).unwrap();
        assert_eq!(config.mode, SearchMode::Exhaustive);
        assert_eq!(config.effective_concurrency(), 2);
        assert_eq!(config.scale_plan, EngineConfig::default().scale_plan);
    }

    #[test]
    fn empty_scale_plan_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{"scale_plan": []}"#).unwrap_err();
        assert!(matches!(err, QrmagicError::Configuration(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for json in [
            r#"{"scale_plan": [0.5, 1.5]}"#,
            r#"{"scale_plan": [0.0]}"#,
            r#"{"sharpen_amounts": []}"#,
            r#"{"sharpen_amounts": [-1.0]}"#,
            r#"{"concurrency": 0}"#,
            r#"{"include_rotation": true, "rotation_degrees": []}"#,
            r#"{"include_tiles": true, "tile_divisions": 1}"#,
        ] {
            let err = EngineConfig::from_json_str(json).unwrap_err();
            assert!(
                matches!(err, QrmagicError::Configuration(_)),
                "expected configuration error for {json}, got {err}"
            );
        }
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = EngineConfig::from_json_str("{mode:").unwrap_err();
        assert!(matches!(err, QrmagicError::Serialization(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"include_rotation": true, "fail_fast": true}}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert!(config.include_rotation);
        assert!(config.fail_fast);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, QrmagicError::Io(_)));
    }
}
