//! Page rasterization: turn an uploaded document into page images (or
//! per-page text when a PDF already carries a text layer).

mod pdf;

pub use pdf::PdfDocument;

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, info};

use crate::error::DocumentError;
use crate::models::config::RasterConfig;

/// Result type for rasterization operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Declared or sniffed kind of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// Sniff the kind from magic bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"%PDF-") {
            return Some(DocumentKind::Pdf);
        }
        image::guess_format(data).ok().map(|_| DocumentKind::Image)
    }
}

/// One rasterized page, zero-indexed in document order.
pub struct RasterPage {
    pub index: usize,
    pub image: DynamicImage,
}

/// What rasterization produced for a document.
pub enum PageSet {
    /// Page images for the recognizer.
    Raster(Vec<RasterPage>),
    /// Per-page text taken straight from the PDF text layer.
    EmbeddedText(Vec<String>),
}

impl PageSet {
    pub fn page_count(&self) -> usize {
        match self {
            PageSet::Raster(pages) => pages.len(),
            PageSet::EmbeddedText(pages) => pages.len(),
        }
    }
}

/// Turns uploads into page sets, enforcing the supported envelope.
pub struct PageRasterizer {
    config: RasterConfig,
}

impl PageRasterizer {
    pub fn new(config: RasterConfig) -> Self {
        PageRasterizer { config }
    }

    /// Rasterize an upload. The page cap is checked before any page is
    /// decoded, so an oversized document fails fast.
    pub fn rasterize(&self, data: &[u8], kind: Option<DocumentKind>) -> Result<PageSet> {
        let kind = match kind.or_else(|| DocumentKind::sniff(data)) {
            Some(k) => k,
            None => {
                return Err(DocumentError::Unsupported(
                    "unrecognized file format".to_string(),
                ));
            }
        };

        match kind {
            DocumentKind::Image => self.rasterize_image(data),
            DocumentKind::Pdf => self.rasterize_pdf(data),
        }
    }

    fn rasterize_image(&self, data: &[u8]) -> Result<PageSet> {
        let image =
            image::load_from_memory(data).map_err(|e| DocumentError::Decode(e.to_string()))?;
        debug!("decoded image page: {}x{}", image.width(), image.height());
        Ok(PageSet::Raster(vec![RasterPage { index: 0, image }]))
    }

    fn rasterize_pdf(&self, data: &[u8]) -> Result<PageSet> {
        let doc = PdfDocument::load(data)?;

        let page_count = doc.page_count();
        if page_count > self.config.max_pages {
            return Err(DocumentError::Unsupported(format!(
                "document has {} pages, limit is {}",
                page_count, self.config.max_pages
            )));
        }

        if self.config.prefer_embedded_text {
            let text = doc.text_layer();
            if text.trim().len() >= self.config.min_text_length {
                info!(
                    "using embedded text layer ({} chars, {} pages)",
                    text.len(),
                    page_count
                );
                return Ok(PageSet::EmbeddedText(doc.page_texts()));
            }
        }

        let mut pages = Vec::with_capacity(page_count);
        for page_num in 1..=page_count as u32 {
            let image = doc.page_image(page_num)?;
            let image =
                scale_to_render_dpi(image, doc.page_size(page_num), self.config.render_dpi);
            pages.push(RasterPage {
                index: (page_num - 1) as usize,
                image,
            });
        }
        debug!("rasterized {} scanned pages at {} dpi target", pages.len(), self.config.render_dpi);
        Ok(PageSet::Raster(pages))
    }
}

/// Downscale a scan toward the render-DPI target implied by the page's
/// physical size. Pages already below the target are left alone; the
/// preprocessor upscales small pages separately.
fn scale_to_render_dpi(
    image: DynamicImage,
    page_size: Option<(f32, f32)>,
    render_dpi: u32,
) -> DynamicImage {
    let Some((width_pts, _)) = page_size else {
        return image;
    };
    if width_pts <= 0.0 || render_dpi == 0 {
        return image;
    }

    let target_width = (width_pts / 72.0 * render_dpi as f32).round() as u32;
    // A 10% margin avoids resampling scans that are already close.
    if target_width == 0 || image.width() <= target_width + target_width / 10 {
        return image;
    }

    let scale = target_width as f32 / image.width() as f32;
    let target_height = ((image.height() as f32) * scale).round().max(1.0) as u32;
    debug!(
        "downscaling scan {}x{} -> {}x{}",
        image.width(),
        image.height(),
        target_width,
        target_height
    );
    image.resize_exact(target_width, target_height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([200u8]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_sniff_pdf() {
        assert_eq!(DocumentKind::sniff(b"%PDF-1.7 junk"), Some(DocumentKind::Pdf));
    }

    #[test]
    fn test_sniff_png() {
        let bytes = png_bytes(4, 4);
        assert_eq!(DocumentKind::sniff(&bytes), Some(DocumentKind::Image));
    }

    #[test]
    fn test_sniff_garbage() {
        assert_eq!(DocumentKind::sniff(b"\x00\x01\x02\x03"), None);
    }

    #[test]
    fn test_rasterize_single_image() {
        let rasterizer = PageRasterizer::new(RasterConfig::default());
        let set = rasterizer.rasterize(&png_bytes(8, 8), None).unwrap();
        assert_eq!(set.page_count(), 1);
        match set {
            PageSet::Raster(pages) => assert_eq!(pages[0].index, 0),
            PageSet::EmbeddedText(_) => panic!("expected raster pages"),
        }
    }

    #[test]
    fn test_oversized_scan_downscaled_to_dpi_target() {
        // A 1x1 inch page at 200 dpi wants a 200 px wide image.
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 400, Luma([128])));
        let scaled = scale_to_render_dpi(img, Some((72.0, 72.0)), 200);
        assert_eq!(scaled.width(), 200);
        assert_eq!(scaled.height(), 200);
    }

    #[test]
    fn test_small_scan_left_for_the_preprocessor() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(150, 150, Luma([128])));
        let scaled = scale_to_render_dpi(img, Some((72.0, 72.0)), 200);
        assert_eq!(scaled.width(), 150);
    }

    #[test]
    fn test_unknown_page_size_keeps_native_resolution() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 400, Luma([128])));
        let scaled = scale_to_render_dpi(img, None, 200);
        assert_eq!(scaled.width(), 400);
    }

    #[test]
    fn test_rasterize_unknown_format_is_unsupported() {
        let rasterizer = PageRasterizer::new(RasterConfig::default());
        let result = rasterizer.rasterize(b"\x00\x01\x02\x03", None);
        assert!(matches!(result, Err(DocumentError::Unsupported(_))));
    }

    #[test]
    fn test_rasterize_truncated_image_is_decode_error() {
        let rasterizer = PageRasterizer::new(RasterConfig::default());
        let mut bytes = png_bytes(8, 8);
        bytes.truncate(20);
        let result = rasterizer.rasterize(&bytes, Some(DocumentKind::Image));
        assert!(matches!(result, Err(DocumentError::Decode(_))));
    }
}
