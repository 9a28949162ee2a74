//! Render backend abstraction.
//!
//! The pipeline owns the scene; a backend only draws it. Backends are
//! resized whenever the render context is (re)initialized.

use sectormap_core::OverlayError;

use crate::projection::FrameTransform;
use crate::scene::Scene;

/// Something that can draw a scene for a frame.
pub trait RenderBackend: Send {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Sets the output size in pixels.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), OverlayError>;

    /// Draws `scene` with `frame` mapping layer points to output pixels.
    fn render(&mut self, scene: &Scene, frame: &FrameTransform) -> Result<(), OverlayError>;
}

impl<B: RenderBackend + ?Sized> RenderBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), OverlayError> {
        (**self).resize(width, height)
    }

    fn render(&mut self, scene: &Scene, frame: &FrameTransform) -> Result<(), OverlayError> {
        (**self).render(scene, frame)
    }
}

/// Backend that draws nothing and counts frames.
#[derive(Debug, Default, Clone)]
pub struct NullBackend {
    frames: u64,
    last_sprite_count: usize,
    size: (u32, u32),
}

impl NullBackend {
    /// Creates a backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sprites in the last rendered scene.
    pub fn last_sprite_count(&self) -> usize {
        self.last_sprite_count
    }

    /// Current output size.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl RenderBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), OverlayError> {
        self.size = (width, height);
        Ok(())
    }

    fn render(&mut self, scene: &Scene, _frame: &FrameTransform) -> Result<(), OverlayError> {
        self.frames += 1;
        self.last_sprite_count = scene.len();
        Ok(())
    }
}
