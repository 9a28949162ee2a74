//! Sprite scene graph.

use sectormap_core::PixelPoint;

use crate::texture::Texture;

/// What a sprite depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    /// Sector wedge
    Sector,
    /// Base-station dot
    BaseStation,
    /// Search result pin
    SearchPin,
}

/// A positioned, rotated and scaled texture.
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Kind of marker
    pub kind: SpriteKind,
    /// Shared texture
    pub texture: Texture,
    /// Position in layer space
    pub position: PixelPoint,
    /// Clockwise rotation in degrees
    pub rotation: f64,
    /// Uniform scale
    pub scale: f32,
    /// Draw tier; higher is drawn later
    pub z_index: i32,
    /// Cell name of the sector, for wedges
    pub label: Option<String>,
}

impl Sprite {
    /// Creates an unrotated sprite.
    pub fn new(kind: SpriteKind, texture: Texture, position: PixelPoint, z_index: i32) -> Self {
        Self {
            kind,
            texture,
            position,
            rotation: 0.0,
            scale: 1.0,
            z_index,
            label: None,
        }
    }

    /// Sets the rotation.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Sets the scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Flat list of sprites owned by the overlay pipeline.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    sprites: Vec<Sprite>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sprite.
    pub fn add(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    /// Removes every sprite.
    pub fn clear(&mut self) {
        self.sprites.clear();
    }

    /// Number of sprites.
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// True when the scene has no sprites.
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Sprites in insertion order.
    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    /// Sprites of one kind.
    pub fn of_kind(&self, kind: SpriteKind) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter().filter(move |s| s.kind == kind)
    }

    /// Sprites in draw order: ascending z, insertion order within a tier.
    pub fn draw_order(&self) -> Vec<&Sprite> {
        let mut ordered: Vec<&Sprite> = self.sprites.iter().collect();
        ordered.sort_by_key(|s| s.z_index);
        ordered
    }

    /// Applies `scale` to every search pin.
    pub fn set_pin_scale(&mut self, scale: f32) {
        for sprite in self
            .sprites
            .iter_mut()
            .filter(|s| s.kind == SpriteKind::SearchPin)
        {
            sprite.scale = scale;
        }
    }
}
