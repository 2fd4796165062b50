//! Pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TtnError;

/// Configuration for the whole pipeline. Every section has defaults so
/// a partial config file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub raster: RasterConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Document loading and rasterization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Hard page cap; longer documents are rejected.
    pub max_pages: usize,
    /// Target rendering resolution for scanned pages.
    pub render_dpi: u32,
    /// Use a PDF text layer instead of OCR when it is long enough.
    pub prefer_embedded_text: bool,
    /// Minimum text-layer length for the embedded-text path.
    pub min_text_length: usize,
}

impl Default for RasterConfig {
    fn default() -> Self {
        RasterConfig {
            max_pages: 5,
            render_dpi: 200,
            prefer_embedded_text: true,
            min_text_length: 50,
        }
    }
}

/// Image enhancement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Pages whose short side is below this are upscaled before OCR.
    pub min_dimension: u32,
    pub enable_deskew: bool,
    /// Largest rotation the deskew search considers, in degrees.
    pub max_skew_degrees: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        PreprocessConfig {
            min_dimension: 1000,
            enable_deskew: true,
            max_skew_degrees: 5.0,
        }
    }
}

/// Recognition engine settings. The engine is resolved once, when the
/// pipeline is built, never per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Languages passed to the engine.
    pub languages: String,
    /// Page segmentation mode.
    pub psm: u8,
    /// Explicit engine binary; falls back to a PATH lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_path: Option<PathBuf>,
    /// Force the demo recognizer even when the engine is available.
    pub force_demo: bool,
    /// Fixed confidence reported by the demo recognizer.
    pub demo_confidence: f32,
    /// Confidence assigned to an embedded PDF text layer.
    pub embedded_text_confidence: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        RecognitionConfig {
            languages: "rus+eng".to_string(),
            psm: 6,
            engine_path: None,
            force_demo: false,
            demo_confidence: 50.0,
            embedded_text_confidence: 95.0,
        }
    }
}

/// Field extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Run the OCR confusable-correction pass before matching.
    pub enable_corrections: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            enable_corrections: true,
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Upper bound on documents processed concurrently.
    pub max_in_flight: usize,
    /// Wall-clock budget per document, in seconds.
    pub document_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            max_in_flight: 16,
            document_timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, TtnError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), TtnError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.raster.max_pages, 5);
        assert_eq!(config.raster.render_dpi, 200);
        assert_eq!(config.recognition.languages, "rus+eng");
        assert_eq!(config.recognition.demo_confidence, 50.0);
        assert_eq!(config.batch.max_in_flight, 16);
        assert_eq!(config.batch.document_timeout_secs, 120);
    }

    #[test]
    fn test_partial_config_uses_section_defaults() {
        let json = r#"{"raster": {"max_pages": 3, "render_dpi": 300, "prefer_embedded_text": false, "min_text_length": 10}}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.raster.max_pages, 3);
        assert_eq!(config.preprocess.min_dimension, 1000);
        assert_eq!(config.recognition.psm, 6);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.raster.max_pages, config.raster.max_pages);
        assert_eq!(back.recognition.languages, config.recognition.languages);
    }
}
