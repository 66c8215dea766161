//! Session configuration
//!
//! All fields have defaults, so an empty JSON object is a valid config.

use crate::engine::RenderOptions;
use crate::error::PdfEditError;
use crate::thumbnail::ThumbnailGeometry;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Extension of the backup kept while a save overwrites an existing file
    pub backup_extension: String,
    pub thumbnail: ThumbnailConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backup_extension: "bak".to_string(),
            thumbnail: ThumbnailConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Smallest edge of the box a thumbnail is fitted into
    pub min_edge: u32,
    /// Page size multiplier applied before fitting
    pub oversample: f32,
    pub dpi: u32,
    pub annotations: bool,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            min_edge: 16,
            oversample: 2.0,
            dpi: 96,
            annotations: true,
        }
    }
}

impl ThumbnailConfig {
    pub fn geometry(&self) -> ThumbnailGeometry {
        ThumbnailGeometry {
            min_edge: self.min_edge,
            oversample: self.oversample,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            dpi_x: self.dpi,
            dpi_y: self.dpi,
            annotations: self.annotations,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, PdfEditError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PdfEditError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, PdfEditError> {
        let json = std::fs::read_to_string(path).map_err(|source| PdfEditError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), PdfEditError> {
        let ext = self.backup_extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\']) {
            return Err(PdfEditError::Config(format!(
                "Invalid backup extension: {:?}",
                self.backup_extension
            )));
        }
        if ext.eq_ignore_ascii_case("pdf") {
            return Err(PdfEditError::Config(
                "Backup extension must differ from the document extension".into(),
            ));
        }
        if !(self.thumbnail.oversample.is_finite() && self.thumbnail.oversample > 0.0) {
            return Err(PdfEditError::Config(format!(
                "Thumbnail oversample must be positive, got {}",
                self.thumbnail.oversample
            )));
        }
        if self.thumbnail.dpi == 0 {
            return Err(PdfEditError::Config("Thumbnail dpi must be positive".into()));
        }
        Ok(())
    }

    /// Backup extension without a leading dot
    pub fn backup_extension(&self) -> &str {
        self.backup_extension.trim_start_matches('.')
    }
}
