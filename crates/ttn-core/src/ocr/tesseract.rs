//! Tesseract subprocess backend.
//!
//! The engine is an external binary invoked once per page. TSV output
//! is requested so per-word confidences are available for the
//! document-level score.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::GrayImage;
use tracing::{debug, trace};

use super::recognizer::{Recognize, RecognitionResult};
use super::Result;
use crate::error::OcrError;
use crate::models::config::RecognitionConfig;

pub struct TesseractRecognizer {
    binary: PathBuf,
    languages: String,
    psm: u8,
}

impl TesseractRecognizer {
    /// Resolve the engine binary. Returns None when no usable binary
    /// exists; the caller then falls back to demo mode.
    pub fn resolve(config: &RecognitionConfig) -> Option<Self> {
        let binary = match &config.engine_path {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => {
                debug!("configured engine path {} does not exist", path.display());
                return None;
            }
            None => which::which("tesseract").ok()?,
        };

        Some(TesseractRecognizer {
            binary,
            languages: config.languages.clone(),
            psm: config.psm,
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run_tsv(&self, image_path: &Path) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.languages])
            .args(["--psm", &self.psm.to_string()])
            .arg("tsv")
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    OcrError::EngineUnavailable(self.binary.display().to_string())
                }
                _ => OcrError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "engine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Recognize for TesseractRecognizer {
    fn recognize(&self, page_index: usize, image: &GrayImage) -> Result<RecognitionResult> {
        let dir = tempfile::Builder::new().prefix("ttn-ocr").tempdir()?;
        let image_path = dir.path().join("page.png");
        image
            .save(&image_path)
            .map_err(|e| OcrError::Preprocessing(e.to_string()))?;

        let tsv = self.run_tsv(&image_path)?;
        let (text, mean_confidence) = parse_tsv(&tsv);
        trace!(
            "page {}: {} chars at mean confidence {:.1}",
            page_index,
            text.len(),
            mean_confidence
        );

        Ok(RecognitionResult {
            page_index,
            text,
            mean_confidence,
        })
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

/// Rebuild line-structured text from engine TSV output and compute the
/// mean confidence over recognized words.
fn parse_tsv(tsv: &str) -> (String, f32) {
    let mut text = String::new();
    let mut confidences: Vec<f32> = Vec::new();
    let mut current_line: Option<(u32, u32, u32)> = None;

    for row in tsv.lines().skip(1) {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 12 {
            continue;
        }
        // Word rows are level 5.
        if columns[0] != "5" {
            continue;
        }

        let word = columns[11].trim();
        if word.is_empty() {
            continue;
        }

        let block: u32 = columns[2].parse().unwrap_or(0);
        let paragraph: u32 = columns[3].parse().unwrap_or(0);
        let line: u32 = columns[4].parse().unwrap_or(0);
        let key = (block, paragraph, line);

        match current_line {
            Some(prev) if prev == key => text.push(' '),
            Some(_) => text.push('\n'),
            None => {}
        }
        current_line = Some(key);
        text.push_str(word);

        if let Ok(conf) = columns[10].parse::<f32>() {
            if conf > 0.0 {
                confidences.push(conf);
            }
        }
    }

    let mean = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f32>() / confidences.len() as f32
    };
    (text, mean)
}
