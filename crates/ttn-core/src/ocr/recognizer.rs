//! The recognizer seam and the demo fallback.

use image::GrayImage;
use tracing::{info, warn};

use super::Result;
use super::tesseract::TesseractRecognizer;
use crate::models::config::RecognitionConfig;

/// Text recognized from one page.
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    /// Zero-based page index within the document.
    pub page_index: usize,
    pub text: String,
    /// Mean word confidence on a 0-100 scale.
    pub mean_confidence: f32,
}

/// A page-level text recognizer.
///
/// Implementations must be deterministic for a given page image so
/// that reprocessing a document yields the same result.
pub trait Recognize: Send + Sync {
    fn recognize(&self, page_index: usize, image: &GrayImage) -> Result<RecognitionResult>;

    /// True when this recognizer produces placeholder output rather
    /// than reading the page.
    fn is_degraded(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// Pick a recognizer once, at pipeline construction. Engine
/// availability is a capability decided here, never re-probed per
/// document.
pub fn select_recognizer(config: &RecognitionConfig) -> Box<dyn Recognize> {
    if config.force_demo {
        info!("demo recognizer forced by configuration");
        return Box::new(DemoRecognizer::new(config.demo_confidence));
    }

    match TesseractRecognizer::resolve(config) {
        Some(engine) => {
            info!("recognition engine available: {}", engine.binary().display());
            Box::new(engine)
        }
        None => {
            warn!("recognition engine not found, falling back to demo mode");
            Box::new(DemoRecognizer::new(config.demo_confidence))
        }
    }
}

/// Fixed synthetic ТТН used when no OCR engine is installed. Every
/// page yields the same text at a fixed low confidence; results built
/// from it are flagged degraded.
pub struct DemoRecognizer {
    confidence: f32,
}

pub(crate) const DEMO_PAGE_TEXT: &str = "\
ТОВАРНО-ТРАНСПОРТНАЯ НАКЛАДНАЯ № ТТН-2024-001234
Дата: 15.09.2024

Отправитель: ООО \"СтройМатериалы Плюс\"
ИНН: 7712345678
Адрес: г. Москва, ул. Строительная, д. 25

Получатель: ООО \"МосГорСтрой\"
ИНН: 7798765432
Адрес: г. Москва, ул. Промышленная, д. 15

Транспортное средство: А123ВВ777
Водитель: Иванов Петр Сергеевич

Груз: Цемент портландский М400, мешки 50кг
Вес: 1500.00 кг
Количество мест: 30
";

impl DemoRecognizer {
    pub fn new(confidence: f32) -> Self {
        DemoRecognizer { confidence }
    }
}

impl Recognize for DemoRecognizer {
    fn recognize(&self, page_index: usize, _image: &GrayImage) -> Result<RecognitionResult> {
        Ok(RecognitionResult {
            page_index,
            text: DEMO_PAGE_TEXT.to_string(),
            mean_confidence: self.confidence,
        })
    }

    fn is_degraded(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_recognizer_is_deterministic() {
        let recognizer = DemoRecognizer::new(50.0);
        let image = GrayImage::new(8, 8);
        let a = recognizer.recognize(0, &image).unwrap();
        let b = recognizer.recognize(0, &image).unwrap();
        assert_eq!(a.text, b.text);
        assert_eq!(a.mean_confidence, 50.0);
        assert!(recognizer.is_degraded());
    }

    #[test]
    fn test_demo_text_carries_key_fields() {
        assert!(DEMO_PAGE_TEXT.contains("№ ТТН-2024-001234"));
        assert!(DEMO_PAGE_TEXT.contains("ИНН: 7712345678"));
        assert!(DEMO_PAGE_TEXT.contains("А123ВВ777"));
    }

    #[test]
    fn test_force_demo_selects_demo() {
        let config = RecognitionConfig {
            force_demo: true,
            ..RecognitionConfig::default()
        };
        let recognizer = select_recognizer(&config);
        assert_eq!(recognizer.name(), "demo");
        assert!(recognizer.is_degraded());
    }
}
