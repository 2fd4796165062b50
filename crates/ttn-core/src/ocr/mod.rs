//! Text recognition: preprocessing, the recognizer seam and the
//! external-engine backend.

pub mod preprocess;
mod recognizer;
mod tesseract;

pub use preprocess::{ImagePreprocessor, Preprocessed};
pub use recognizer::{DemoRecognizer, Recognize, RecognitionResult, select_recognizer};
pub(crate) use recognizer::DEMO_PAGE_TEXT;
pub use tesseract::TesseractRecognizer;

use crate::error::OcrError;

/// Result type for recognition operations.
pub type Result<T> = std::result::Result<T, OcrError>;
