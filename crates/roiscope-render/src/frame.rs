//! Background frame decoding and placement.

use std::sync::Arc;

use kurbo::{Rect, Size};
use peniko::{Blob, ImageAlphaType, ImageData, ImageFormat};
use roiscope_core::editor::LatestFrame;

use crate::renderer::{FrameImage, RendererError, RenderResult};

/// Decode an encoded frame (JPEG/PNG) into RGBA8.
pub fn decode_frame(seq: u64, bytes: &[u8]) -> RenderResult<FrameImage> {
    let decoded = ::image::load_from_memory(bytes).map_err(|e| RendererError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(FrameImage {
        seq,
        image: ImageData {
            data: Blob::new(Arc::new(rgba.into_vec())),
            format: ImageFormat::Rgba8,
            width,
            height,
            alpha_type: ImageAlphaType::Alpha,
        },
    })
}

/// Destination rect covering `surface` with `image`, centered.
///
/// The image keeps its aspect ratio; the overflowing axis extends past the
/// surface and is cropped by it.
pub fn cover_rect(image: Size, surface: Size) -> Rect {
    if image.width <= 0.0 || image.height <= 0.0 {
        return surface.to_rect();
    }
    let scale = (surface.width / image.width).max(surface.height / image.height);
    let width = image.width * scale;
    let height = image.height * scale;
    let x = (surface.width - width) / 2.0;
    let y = (surface.height - height) / 2.0;
    Rect::new(x, y, x + width, y + height)
}

/// Keeps the most recently decoded frame so each payload is decoded once.
#[derive(Debug, Default)]
pub struct FrameCache {
    current: Option<FrameImage>,
    /// Last sequence number that failed to decode, so it is not retried.
    failed: Option<u64>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sync with the latest frame and return what to draw.
    ///
    /// A payload that fails to decode keeps the previous background. No
    /// frame at all clears the cache.
    pub fn update(&mut self, frame: Option<&LatestFrame>) -> Option<&FrameImage> {
        let Some(frame) = frame else {
            self.current = None;
            self.failed = None;
            return None;
        };

        let cached = self.current.as_ref().map(|c| c.seq);
        if cached != Some(frame.seq) && self.failed != Some(frame.seq) {
            match decode_frame(frame.seq, &frame.bytes) {
                Ok(image) => {
                    log::debug!("Decoded frame {} ({}x{})", frame.seq, image.image.width, image.image.height);
                    self.current = Some(image);
                }
                Err(e) => {
                    log::warn!("Dropping frame {}: {}", frame.seq, e);
                    self.failed = Some(frame.seq);
                }
            }
        }
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&FrameImage> {
        self.current.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use std::rc::Rc;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        ::image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ::image::ImageFormat::Png)
            .unwrap();
        buf
    }

    pub(crate) fn latest(seq: u64, bytes: Vec<u8>) -> LatestFrame {
        LatestFrame {
            seq,
            bytes: Rc::from(bytes),
            timestamp: None,
        }
    }

    #[test]
    fn test_decode_png() {
        let frame = decode_frame(1, &png_bytes(4, 2)).unwrap();
        assert_eq!(frame.image.width, 4);
        assert_eq!(frame.image.height, 2);
        assert_eq!(frame.image.data.data().len(), 4 * 2 * 4);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_frame(1, b"not an image"), Err(RendererError::Decode(_))));
    }

    #[test]
    fn test_cover_wide_image() {
        // 16:9 image on a 4:3 surface overflows horizontally
        let rect = cover_rect(Size::new(1600.0, 900.0), Size::new(800.0, 600.0));
        assert!((rect.height() - 600.0).abs() < 1e-9);
        assert!((rect.width() - 1066.666_666).abs() < 1e-3);
        assert!((rect.x0 + rect.x1 - 800.0).abs() < 1e-9);
        assert_eq!(rect.y0, 0.0);
    }

    #[test]
    fn test_cover_same_aspect_fills_exactly() {
        let rect = cover_rect(Size::new(1920.0, 1080.0), Size::new(800.0, 450.0));
        assert!((rect.x0).abs() < 1e-9);
        assert!((rect.y0).abs() < 1e-9);
        assert!((rect.x1 - 800.0).abs() < 1e-9);
        assert!((rect.y1 - 450.0).abs() < 1e-9);
    }

    #[test]
    fn test_cache_decodes_once_and_keeps_last_good() {
        let mut cache = FrameCache::new();
        let good = latest(1, png_bytes(2, 2));
        assert_eq!(cache.update(Some(&good)).map(|f| f.seq), Some(1));
        assert_eq!(cache.update(Some(&good)).map(|f| f.seq), Some(1));

        let bad = latest(2, b"corrupt".to_vec());
        assert_eq!(cache.update(Some(&bad)).map(|f| f.seq), Some(1));

        assert!(cache.update(None).is_none());
        assert!(cache.current().is_none());
    }
}
