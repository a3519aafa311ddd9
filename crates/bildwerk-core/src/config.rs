// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BildwerkError, Result};

/// File name looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "bildwerk.json";

/// Server and pipeline settings.
///
/// Every field has a default, so a config file only needs to list the values
/// it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Directory holding uploaded originals and processed outputs.
    pub upload_dir: PathBuf,
    /// Accepted file extensions (lowercase, without the dot).
    pub allowed_extensions: Vec<String>,
    /// Largest request body accepted, in bytes (default 16 MiB).
    pub max_request_bytes: usize,
    /// Fixed constants for the two transforms.
    pub processing: ProcessingParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            upload_dir: PathBuf::from("static/uploads"),
            allowed_extensions: ["png", "jpg", "jpeg", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_request_bytes: 16 * 1024 * 1024,
            processing: ProcessingParams::default(),
        }
    }
}

impl AppConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.allowed_extensions.is_empty() {
            return Err(BildwerkError::Config(
                "allowed_extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = self
            .allowed_extensions
            .iter()
            .find(|ext| {
                ext.is_empty() || ext.contains('.') || ext.chars().any(|c| c.is_ascii_uppercase())
            })
        {
            return Err(BildwerkError::Config(format!(
                "extension {ext:?} must be lowercase and given without a dot"
            )));
        }
        if self.max_request_bytes == 0 {
            return Err(BildwerkError::Config(
                "max_request_bytes must be greater than zero".into(),
            ));
        }
        self.processing.watershed.validate()
    }
}

/// Constants for both transforms, grouped so they can travel together into
/// the processor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessingParams {
    pub threshold: ThresholdParams,
    pub watershed: WatershedParams,
}

/// Fixed global threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThresholdParams {
    /// Pixels strictly above this level become white, the rest black.
    pub level: u8,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self { level: 127 }
    }
}

/// Marker-based watershed segmentation constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatershedParams {
    /// Radius of the square structuring element (1 gives a 3x3 kernel).
    pub kernel_radius: u8,
    /// Erosion/dilation passes in the noise-removing opening.
    pub opening_iterations: u8,
    /// Dilation passes used to grow the sure-background region.
    pub background_dilation_iterations: u8,
    /// Fraction of the maximum distance above which a pixel is sure foreground.
    pub foreground_fraction: f32,
    /// RGB colour painted on watershed ridge pixels.
    pub boundary_color: [u8; 3],
}

impl Default for WatershedParams {
    fn default() -> Self {
        Self {
            kernel_radius: 1,
            opening_iterations: 2,
            background_dilation_iterations: 3,
            foreground_fraction: 0.7,
            boundary_color: [0, 0, 255],
        }
    }
}

impl WatershedParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.foreground_fraction > 0.0 && self.foreground_fraction < 1.0) {
            return Err(BildwerkError::Config(format!(
                "foreground_fraction must lie in (0, 1), got {}",
                self.foreground_fraction
            )));
        }
        if self.kernel_radius == 0 {
            return Err(BildwerkError::Config(
                "kernel_radius must be at least 1".into(),
            ));
        }
        // The morphology helpers take the combined radius as a u8.
        let opening = u16::from(self.kernel_radius) * u16::from(self.opening_iterations);
        let dilation =
            u16::from(self.kernel_radius) * u16::from(self.background_dilation_iterations);
        if opening > u16::from(u8::MAX) || dilation > u16::from(u8::MAX) {
            return Err(BildwerkError::Config(
                "kernel_radius times iterations must not exceed 255".into(),
            ));
        }
        Ok(())
    }

    /// Chebyshev radius equivalent to `opening_iterations` passes of the kernel.
    pub fn opening_radius(&self) -> u8 {
        self.kernel_radius.saturating_mul(self.opening_iterations)
    }

    /// Chebyshev radius equivalent to `background_dilation_iterations` passes.
    pub fn background_radius(&self) -> u8 {
        self.kernel_radius
            .saturating_mul(self.background_dilation_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = AppConfig::default();
        assert_eq!(config.max_request_bytes, 16 * 1024 * 1024);
        assert_eq!(config.allowed_extensions, vec!["png", "jpg", "jpeg", "gif"]);
        assert_eq!(config.processing.threshold.level, 127);

        let ws = &config.processing.watershed;
        assert_eq!(ws.kernel_radius, 1);
        assert_eq!(ws.opening_radius(), 2);
        assert_eq!(ws.background_radius(), 3);
        assert!((ws.foreground_fraction - 0.7).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "upload_dir": "/srv/bildwerk", "processing": { "threshold": { "level": 100 } } }"#)
            .expect("write config");

        let config = AppConfig::load(&path).expect("load");
        assert_eq!(config.upload_dir, PathBuf::from("/srv/bildwerk"));
        assert_eq!(config.processing.threshold.level, 100);
        assert_eq!(config.processing.watershed, WatershedParams::default());
        assert_eq!(config.max_request_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn serialized_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let mut config = AppConfig::default();
        config.allowed_extensions = vec!["png".into()];
        let json = serde_json::to_string_pretty(&config).expect("serialize");
        std::fs::write(&path, json).expect("write config");

        let loaded = AppConfig::load(&path).expect("load");
        assert_eq!(loaded.allowed_extensions, vec!["png"]);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load_or_default(dir.path().join("absent.json")).expect("defaults");
        assert_eq!(config.upload_dir, PathBuf::from("static/uploads"));
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let mut config = AppConfig::default();
        config.allowed_extensions.clear();
        assert!(matches!(config.validate(), Err(BildwerkError::Config(_))));

        let mut config = AppConfig::default();
        config.allowed_extensions = vec![".png".into()];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.processing.watershed.foreground_fraction = 1.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.processing.watershed.kernel_radius = 100;
        assert!(config.validate().is_err());
    }
}
