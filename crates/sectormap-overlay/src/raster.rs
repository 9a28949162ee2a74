//! Headless raster backend
//!
//! Composites the scene into a tiny-skia `Pixmap`:
//! - Sprites drawn in z order with bilinear filtering
//! - Anchor, rotation and scale applied as one transform per sprite
//! - Sprites fully outside the output are culled
//! - The last frame can be written out as PNG

use sectormap_core::OverlayError;
use std::path::Path;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::backend::RenderBackend;
use crate::projection::FrameTransform;
use crate::scene::Scene;

/// tiny-skia compositor for the overlay.
#[derive(Debug)]
pub struct RasterBackend {
    pixmap: Pixmap,
    frames: u64,
    drawn: usize,
}

impl RasterBackend {
    /// Creates a transparent backend of the given size.
    pub fn new(width: u32, height: u32) -> Result<Self, OverlayError> {
        Ok(Self {
            pixmap: allocate(width, height)?,
            frames: 0,
            drawn: 0,
        })
    }

    /// The last rendered frame.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sprites drawn in the last frame, after culling.
    pub fn drawn_sprites(&self) -> usize {
        self.drawn
    }

    /// Encodes the last frame as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, OverlayError> {
        self.pixmap.encode_png().map_err(|e| OverlayError::Backend {
            message: format!("PNG encoding failed: {}", e),
        })
    }

    /// Writes the last frame to a PNG file.
    pub fn save_png(&self, path: &Path) -> Result<(), OverlayError> {
        self.pixmap.save_png(path).map_err(|e| OverlayError::Backend {
            message: format!("{}: {}", path.display(), e),
        })
    }
}

fn allocate(width: u32, height: u32) -> Result<Pixmap, OverlayError> {
    Pixmap::new(width, height).ok_or_else(|| OverlayError::Backend {
        message: format!("cannot allocate {}x{} frame", width, height),
    })
}

impl RenderBackend for RasterBackend {
    fn name(&self) -> &str {
        "raster"
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), OverlayError> {
        if self.pixmap.width() != width || self.pixmap.height() != height {
            self.pixmap = allocate(width, height)?;
        }
        Ok(())
    }

    fn render(&mut self, scene: &Scene, frame: &FrameTransform) -> Result<(), OverlayError> {
        self.pixmap.fill(Color::TRANSPARENT);
        let width = self.pixmap.width() as f64;
        let height = self.pixmap.height() as f64;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };

        let mut drawn = 0;
        for sprite in scene.draw_order() {
            let texture = &sprite.texture;
            let scale = sprite.scale as f64 * frame.scale;
            let center = frame.apply(sprite.position);

            // Anchor-independent bound: the whole image fits in this radius.
            let extent = texture.width().max(texture.height()) as f64 * scale;
            if center.x + extent < 0.0
                || center.y + extent < 0.0
                || center.x - extent > width
                || center.y - extent > height
            {
                continue;
            }

            let (ax, ay) = texture.anchor();
            let transform = Transform::from_translate(center.x as f32, center.y as f32)
                .pre_rotate(sprite.rotation as f32)
                .pre_scale(scale as f32, scale as f32)
                .pre_translate(-ax, -ay);
            self.pixmap
                .draw_pixmap(0, 0, texture.pixmap().as_ref(), &paint, transform, None);
            drawn += 1;
        }

        self.drawn = drawn;
        self.frames += 1;
        Ok(())
    }
}
