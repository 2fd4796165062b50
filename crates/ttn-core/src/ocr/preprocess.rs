//! Image preprocessing for OCR.
//!
//! Photographed ТТН pages arrive underexposed, slightly rotated and
//! often at phone-camera resolution. Every enhancement step here is
//! best-effort: if anything fails the page falls back to its plain
//! grayscale form, which the recognizer can always consume.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma, imageops};
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::config::PreprocessConfig;

/// A preprocessed page with its provenance.
pub enum Preprocessed {
    /// The full enhancement chain ran.
    Enhanced(GrayImage),
    /// Enhancement failed; plain grayscale conversion only.
    FallbackGray(GrayImage),
}

impl Preprocessed {
    pub fn image(&self) -> &GrayImage {
        match self {
            Preprocessed::Enhanced(img) => img,
            Preprocessed::FallbackGray(img) => img,
        }
    }

    pub fn is_enhanced(&self) -> bool {
        matches!(self, Preprocessed::Enhanced(_))
    }
}

/// Image preprocessor for OCR input.
pub struct ImagePreprocessor {
    min_dimension: u32,
    enable_deskew: bool,
    max_skew_degrees: f32,
}

impl ImagePreprocessor {
    pub fn new(config: &PreprocessConfig) -> Self {
        ImagePreprocessor {
            min_dimension: config.min_dimension,
            enable_deskew: config.enable_deskew,
            max_skew_degrees: config.max_skew_degrees,
        }
    }

    pub fn with_deskew(mut self, enable: bool) -> Self {
        self.enable_deskew = enable;
        self
    }

    /// Prepare a page for recognition. Never fails: enhancement errors
    /// degrade to the grayscale original.
    pub fn process(&self, image: &DynamicImage) -> Preprocessed {
        let gray = image.to_luma8();
        match self.enhance(&gray) {
            Ok(enhanced) => Preprocessed::Enhanced(enhanced),
            Err(e) => {
                warn!("preprocessing failed, falling back to grayscale: {}", e);
                Preprocessed::FallbackGray(gray)
            }
        }
    }

    fn enhance(&self, gray: &GrayImage) -> Result<GrayImage, OcrError> {
        let upscaled = self.upscale_if_small(gray);
        let stretched = stretch_contrast(&upscaled)?;
        let denoised = median_denoise(&stretched);
        if self.enable_deskew {
            Ok(self.deskew(&denoised))
        } else {
            Ok(denoised)
        }
    }

    /// Upscale pages whose short side is below the OCR-friendly floor.
    fn upscale_if_small(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        let short_side = width.min(height);
        if short_side == 0 || short_side >= self.min_dimension {
            return gray.clone();
        }

        let scale = self.min_dimension as f32 / short_side as f32;
        let new_width = (width as f32 * scale).round() as u32;
        let new_height = (height as f32 * scale).round() as u32;
        debug!("upscaling page {}x{} -> {}x{}", width, height, new_width, new_height);
        imageops::resize(gray, new_width, new_height, FilterType::Lanczos3)
    }

    /// Correct small page rotation by searching for the angle whose
    /// horizontal ink projection has the sharpest row profile.
    fn deskew(&self, gray: &GrayImage) -> GrayImage {
        let angle = match estimate_skew(gray, self.max_skew_degrees) {
            Some(a) if a.abs() >= 0.5 => a,
            _ => return gray.clone(),
        };
        debug!("deskewing page by {:.1} degrees", -angle);
        rotate_about_center(gray, -angle)
    }
}

/// Linear contrast stretch between the 1st and 99th intensity
/// percentiles.
fn stretch_contrast(gray: &GrayImage) -> Result<GrayImage, OcrError> {
    let (width, height) = gray.dimensions();
    let total = (width as u64) * (height as u64);
    if total == 0 {
        return Err(OcrError::Preprocessing("empty image".to_string()));
    }

    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let low_target = total / 100;
    let high_target = total - total / 100;
    let mut low = 0u8;
    let mut high = 255u8;
    let mut cumulative = 0u64;
    for (value, &count) in histogram.iter().enumerate() {
        let next = cumulative + count;
        if cumulative <= low_target && next > low_target {
            low = value as u8;
        }
        if cumulative < high_target && next >= high_target {
            high = value as u8;
        }
        cumulative = next;
    }

    if high <= low {
        // Flat page (blank scan); nothing to stretch.
        return Ok(gray.clone());
    }

    let range = (high - low) as f32;
    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let clamped = pixel[0].clamp(low, high);
        let stretched = ((clamped - low) as f32 / range * 255.0).round() as u8;
        out.put_pixel(x, y, Luma([stretched]));
    }
    Ok(out)
}

/// 3x3 median filter; removes salt-and-pepper scanner noise without
/// softening stroke edges the way a box blur does.
fn median_denoise(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return gray.clone();
    }

    let mut out = gray.clone();
    let mut window = [0u8; 9];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut i = 0;
            for dy in 0..3 {
                for dx in 0..3 {
                    window[i] = gray.get_pixel(x + dx - 1, y + dy - 1)[0];
                    i += 1;
                }
            }
            window.sort_unstable();
            out.put_pixel(x, y, Luma([window[4]]));
        }
    }
    out
}

/// Estimate page skew in degrees over [-max, max] using a sheared
/// row-projection search on a downscaled binarized copy.
fn estimate_skew(gray: &GrayImage, max_degrees: f32) -> Option<f32> {
    const SAMPLE_WIDTH: u32 = 400;
    const STEP: f32 = 0.5;

    let (width, height) = gray.dimensions();
    if width < 32 || height < 32 || max_degrees <= 0.0 {
        return None;
    }

    let sample = if width > SAMPLE_WIDTH {
        let scale = SAMPLE_WIDTH as f32 / width as f32;
        imageops::resize(
            gray,
            SAMPLE_WIDTH,
            ((height as f32) * scale).max(1.0) as u32,
            FilterType::Triangle,
        )
    } else {
        gray.clone()
    };
    let (sw, sh) = sample.dimensions();

    let mut best_angle = 0.0f32;
    let mut best_score = f64::MIN;
    let steps = (2.0 * max_degrees / STEP).round() as i32;
    for step in 0..=steps {
        let angle = -max_degrees + step as f32 * STEP;
        let shear = (angle.to_radians()).tan();

        let mut rows = vec![0u32; sh as usize];
        for y in 0..sh {
            for x in 0..sw {
                if sample.get_pixel(x, y)[0] < 128 {
                    let shifted = y as f32 + shear * x as f32;
                    let row = shifted.round();
                    if row >= 0.0 && (row as u32) < sh {
                        rows[row as usize] += 1;
                    }
                }
            }
        }

        let mean = rows.iter().map(|&c| c as f64).sum::<f64>() / sh as f64;
        let score = rows
            .iter()
            .map(|&c| {
                let d = c as f64 - mean;
                d * d
            })
            .sum::<f64>();
        if score > best_score {
            best_score = score;
            best_angle = angle;
        }
    }
    Some(best_angle)
}

/// Nearest-neighbor rotation about the image center onto a white
/// canvas of the same size.
fn rotate_about_center(gray: &GrayImage, degrees: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    let mut out = GrayImage::from_pixel(width, height, Luma([255u8]));
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let src_x = (cos * dx + sin * dy + cx).round();
            let src_y = (-sin * dx + cos * dy + cy).round();
            if src_x >= 0.0 && src_y >= 0.0 && (src_x as u32) < width && (src_y as u32) < height {
                out.put_pixel(x, y, *gray.get_pixel(src_x as u32, src_y as u32));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocessor() -> ImagePreprocessor {
        ImagePreprocessor::new(&PreprocessConfig {
            min_dimension: 100,
            enable_deskew: false,
            max_skew_degrees: 5.0,
        })
    }

    #[test]
    fn test_small_page_is_upscaled() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 80, Luma([120])));
        let processed = preprocessor().process(&img);
        assert!(processed.is_enhanced());
        let (w, h) = processed.image().dimensions();
        assert!(w.min(h) >= 100);
    }

    #[test]
    fn test_large_page_keeps_dimensions() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 150, Luma([120])));
        let processed = preprocessor().process(&img);
        assert_eq!(processed.image().dimensions(), (200, 150));
    }

    #[test]
    fn test_contrast_stretch_expands_range() {
        let mut img = GrayImage::from_pixel(64, 64, Luma([100]));
        for x in 0..64 {
            for y in 0..32 {
                img.put_pixel(x, y, Luma([150]));
            }
        }
        let stretched = stretch_contrast(&img).unwrap();
        let min = stretched.pixels().map(|p| p[0]).min().unwrap();
        let max = stretched.pixels().map(|p| p[0]).max().unwrap();
        assert!(min < 10);
        assert!(max > 245);
    }

    #[test]
    fn test_flat_page_passes_through() {
        let img = GrayImage::from_pixel(32, 32, Luma([200]));
        let stretched = stretch_contrast(&img).unwrap();
        assert_eq!(stretched.get_pixel(5, 5)[0], 200);
    }

    #[test]
    fn test_median_removes_isolated_speck() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([255]));
        img.put_pixel(4, 4, Luma([0]));
        let denoised = median_denoise(&img);
        assert_eq!(denoised.get_pixel(4, 4)[0], 255);
    }

    #[test]
    fn test_estimate_skew_near_zero_for_straight_lines() {
        let mut img = GrayImage::from_pixel(200, 200, Luma([255]));
        for line in 0..5 {
            let y = 30 + line * 30;
            for x in 10..190 {
                img.put_pixel(x, y, Luma([0]));
                img.put_pixel(x, y + 1, Luma([0]));
            }
        }
        let angle = estimate_skew(&img, 5.0).unwrap();
        assert!(angle.abs() < 1.0, "estimated {} degrees", angle);
    }

    #[test]
    fn test_fallback_on_empty_image() {
        let pre = ImagePreprocessor::new(&PreprocessConfig::default());
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let processed = pre.process(&img);
        assert!(!processed.is_enhanced());
    }
}
