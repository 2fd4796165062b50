//! PDF access built on lopdf and pdf-extract.
//!
//! Uploaded ТТН PDFs are almost always scans: one photographed page per
//! PDF page, stored as an image XObject. Some carry a real text layer
//! instead; both shapes are handled here.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use crate::error::DocumentError;

/// A loaded PDF document.
pub struct PdfDocument {
    document: Document,
    /// Bytes handed to pdf-extract; re-saved after decryption.
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Load a PDF from memory. Encrypted documents are tried with the
    /// empty password first and rejected only if that fails.
    pub fn load(data: &[u8]) -> Result<Self, DocumentError> {
        let mut doc =
            Document::load_mem(data).map_err(|e| DocumentError::Decode(e.to_string()))?;

        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(DocumentError::Encrypted);
            }
            debug!("decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| DocumentError::Decode(e.to_string()))?;
            decrypted
        } else {
            data.to_vec()
        };

        if doc.get_pages().is_empty() {
            return Err(DocumentError::NoPages);
        }

        Ok(PdfDocument {
            document: doc,
            raw_data,
        })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Full embedded text layer, empty string when there is none.
    pub fn text_layer(&self) -> String {
        pdf_extract::extract_text_from_mem(&self.raw_data).unwrap_or_default()
    }

    /// Split the text layer into per-page chunks. pdf-extract gives a
    /// flat string, so pages are approximated by even line ranges.
    pub fn page_texts(&self) -> Vec<String> {
        let full_text = self.text_layer();
        let lines: Vec<&str> = full_text.lines().collect();
        let page_count = self.page_count();
        if page_count == 0 || lines.is_empty() {
            return vec![full_text; page_count.max(1)];
        }

        let lines_per_page = (lines.len() / page_count).max(1);
        (0..page_count)
            .map(|idx| {
                let start = (idx * lines_per_page).min(lines.len());
                let end = if idx == page_count - 1 {
                    lines.len()
                } else {
                    ((idx + 1) * lines_per_page).min(lines.len())
                };
                lines[start..end].join("\n")
            })
            .collect()
    }

    /// Page size in points from the MediaBox (1-indexed), following
    /// Parent inheritance.
    pub fn page_size(&self, page: u32) -> Option<(f32, f32)> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page)?;
        self.media_box(page_id)
    }

    fn media_box(&self, node_id: ObjectId) -> Option<(f32, f32)> {
        let node = self.document.get_object(node_id).ok()?;
        let Object::Dictionary(dict) = node else {
            return None;
        };

        if let Ok(obj) = dict.get(b"MediaBox") {
            if let Ok((_, Object::Array(values))) = self.document.dereference(obj) {
                let nums: Vec<f32> = values.iter().filter_map(as_number).collect();
                if nums.len() == 4 {
                    return Some(((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs()));
                }
            }
        }

        if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
            return self.media_box(*parent_id);
        }
        None
    }

    /// The scan image of a page (1-indexed).
    pub fn page_image(&self, page: u32) -> Result<DynamicImage, DocumentError> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page).ok_or(DocumentError::InvalidPage(page))?;

        let mut images = self.page_xobject_images(page_id);
        if let Some(img) = images.drain(..).max_by_key(|i| i.width() * i.height()) {
            return Ok(img);
        }

        // Some producers put the scan stream outside the page resource
        // tree; fall back to a whole-document scan in page order.
        debug!("no XObject image on page {}, scanning all objects", page);
        let all = self.all_stream_images();
        let idx = (page - 1) as usize;
        all.into_iter()
            .nth(idx)
            .ok_or_else(|| DocumentError::Decode(format!("no raster content on page {}", page)))
    }

    fn page_xobject_images(&self, page_id: ObjectId) -> Vec<DynamicImage> {
        let mut images = Vec::new();
        let Some(resources) = self.page_resources(page_id) else {
            return images;
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return images;
        };
        if let Ok((_, Object::Dictionary(xobj_dict))) = self.document.dereference(xobjects) {
            for (_name, obj_ref) in xobj_dict.iter() {
                if let Ok((_, obj)) = self.document.dereference(obj_ref) {
                    if let Some(img) = self.image_from_object(obj) {
                        images.push(img);
                    }
                }
            }
        }
        images
    }

    fn all_stream_images(&self) -> Vec<DynamicImage> {
        let mut images = Vec::new();
        for (_id, object) in self.document.objects.iter() {
            if let Some(img) = self.image_from_object(object) {
                images.push(img);
            }
        }
        images
    }

    /// Resources dictionary for a page, following Parent inheritance.
    fn page_resources(&self, node_id: ObjectId) -> Option<lopdf::Dictionary> {
        let node = self.document.get_object(node_id).ok()?;
        let Object::Dictionary(dict) = node else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = self.document.dereference(resources) {
                return Some(res_dict.clone());
            }
        }

        if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
            return self.page_resources(*parent_id);
        }
        None
    }

    fn image_from_object(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        let subtype = dict.get(b"Subtype").ok()?;
        if subtype.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!("image stream {}x{}", width, height);

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    // JPEG scans keep their original compressed bytes.
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("unsupported image filter, skipping stream");
                    return None;
                }
                _ => {}
            }
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self
                    .document
                    .get_object(*r)
                    .ok()
                    .and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8) as u8;

        image_from_raw(&data, width, height, color_space, bits)
    }
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode an uncompressed image stream (8-bit RGB or grayscale).
fn image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixel_count = (width as usize) * (height as usize);
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixel_count * 3 => {
            for chunk in data[..pixel_count * 3].chunks_exact(3) {
                rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
            }
        }
        b"DeviceGray" | b"G" if data.len() >= pixel_count => {
            for &gray in &data[..pixel_count] {
                rgba.extend_from_slice(&[gray, gray, gray, 255]);
            }
        }
        _ => {
            trace!(
                "undecodable raw image: colorspace={:?}, data_len={}",
                String::from_utf8_lossy(color_space),
                data.len()
            );
            return None;
        }
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}
