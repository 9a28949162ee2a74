//! Texture cache
//!
//! Rasterizes every marker variant once per render context with tiny-skia.
//! Sprites share the cached textures through `Arc`; rescaling is a sprite
//! transform and never touches a texture again.

use sectormap_core::{OverlayError, Sector};
use sectormap_settings::OverlaySettings;
use std::f64::consts::PI;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{Color, FillRule, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::variants::{
    VariantKey, BASE_STATION_COLOR, BASE_STATION_RADIUS, OUTLINE_WIDTH, VARIANT_COUNT,
    WEDGE_ARC_DEG,
};

/// Total number of cached textures: wedges plus base station and search pin.
pub const TEXTURE_COUNT: usize = VARIANT_COUNT + 2;

const PIN_WIDTH: u32 = 32;
const PIN_HEIGHT: u32 = 48;
const PIN_COLOR: u32 = 0xE53935;

/// A rasterized marker image with the pixel its sprite position refers to.
#[derive(Debug)]
pub struct TextureImage {
    name: String,
    pixmap: Pixmap,
    anchor: (f32, f32),
}

impl TextureImage {
    /// Human readable name, e.g. `GSM/selected/none`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raster data.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Anchor pixel inside the image.
    pub fn anchor(&self) -> (f32, f32) {
        self.anchor
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }
}

/// Shared handle to a cached texture.
pub type Texture = Arc<TextureImage>;

/// The 20 textures of one render context.
#[derive(Debug, Clone)]
pub struct TextureCache {
    wedges: Vec<Texture>,
    base_station: Texture,
    search_pin: Texture,
}

impl TextureCache {
    /// Rasterizes every variant.
    ///
    /// Fails if a texture cannot be allocated or the configured search-pin
    /// icon cannot be loaded.
    pub fn build(settings: &OverlaySettings) -> Result<Self, OverlayError> {
        let mut wedges = Vec::with_capacity(VARIANT_COUNT);
        for key in VariantKey::all() {
            wedges.push(Arc::new(wedge_texture(key)?));
        }

        let base_station = Arc::new(base_station_texture()?);
        let search_pin = Arc::new(match &settings.search_pin_icon {
            Some(path) => load_icon(path)?,
            None => generated_pin_texture()?,
        });

        tracing::debug!("Built {} overlay textures", TEXTURE_COUNT);
        Ok(Self {
            wedges,
            base_station,
            search_pin,
        })
    }

    /// Wedge texture of a variant.
    pub fn wedge(&self, key: VariantKey) -> &Texture {
        &self.wedges[key.index()]
    }

    /// Wedge texture for a sector.
    pub fn texture_for(&self, sector: &Sector, selected: bool) -> &Texture {
        self.wedge(VariantKey::for_sector(sector, selected))
    }

    /// Base-station dot.
    pub fn base_station(&self) -> &Texture {
        &self.base_station
    }

    /// Search pin.
    pub fn search_pin(&self) -> &Texture {
        &self.search_pin
    }

    /// Number of cached textures.
    pub fn len(&self) -> usize {
        self.wedges.len() + 2
    }

    /// Always false once built.
    pub fn is_empty(&self) -> bool {
        self.wedges.is_empty()
    }
}

fn rgb(hex: u32) -> Color {
    Color::from_rgba8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255)
}

fn solid(hex: u32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(rgb(hex));
    paint.anti_alias = true;
    paint
}

fn allocate(width: u32, height: u32, name: &str) -> Result<Pixmap, OverlayError> {
    Pixmap::new(width, height).ok_or_else(|| OverlayError::TextureGeneration {
        variant: name.to_string(),
        reason: format!("cannot allocate {}x{} pixmap", width, height),
    })
}

fn wedge_texture(key: VariantKey) -> Result<TextureImage, OverlayError> {
    let name = key.to_string();
    let style = key.style();
    let half = style.radius + OUTLINE_WIDTH;
    let size = (half * 2.0).ceil() as u32;
    let mut pixmap = allocate(size, size, &name)?;
    let c = size as f32 / 2.0;

    let (start, end) = WEDGE_ARC_DEG;
    let mut pb = PathBuilder::new();
    pb.move_to(c, c);
    let mut deg = start;
    while deg <= end {
        let rad = deg * PI / 180.0;
        pb.line_to(
            c + style.radius * rad.cos() as f32,
            c + style.radius * rad.sin() as f32,
        );
        deg += 1.0;
    }
    pb.close();
    let path = pb.finish().ok_or_else(|| OverlayError::TextureGeneration {
        variant: name.clone(),
        reason: "empty wedge path".to_string(),
    })?;

    pixmap.fill_path(
        &path,
        &solid(style.fill),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
    let stroke = Stroke {
        width: OUTLINE_WIDTH,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(
        &path,
        &solid(style.outline),
        &stroke,
        Transform::identity(),
        None,
    );

    Ok(TextureImage {
        name,
        pixmap,
        anchor: (c, c),
    })
}

fn base_station_texture() -> Result<TextureImage, OverlayError> {
    let name = "base-station";
    let size = (BASE_STATION_RADIUS * 2.0).ceil() as u32 + 2;
    let mut pixmap = allocate(size, size, name)?;
    let c = size as f32 / 2.0;

    let path = PathBuilder::from_circle(c, c, BASE_STATION_RADIUS).ok_or_else(|| {
        OverlayError::TextureGeneration {
            variant: name.to_string(),
            reason: "invalid circle".to_string(),
        }
    })?;
    pixmap.fill_path(
        &path,
        &solid(BASE_STATION_COLOR),
        FillRule::Winding,
        Transform::identity(),
        None,
    );

    Ok(TextureImage {
        name: name.to_string(),
        pixmap,
        anchor: (c, c),
    })
}

/// Teardrop marker anchored at its center, like a loaded icon.
fn generated_pin_texture() -> Result<TextureImage, OverlayError> {
    let name = "search-pin";
    let mut pixmap = allocate(PIN_WIDTH, PIN_HEIGHT, name)?;
    let cx = PIN_WIDTH as f32 / 2.0;
    let head_radius = cx - 2.0;
    let tip_y = PIN_HEIGHT as f32 - 2.0;

    let mut pb = PathBuilder::new();
    pb.push_circle(cx, cx, head_radius);
    pb.move_to(cx - head_radius * 0.85, cx + head_radius * 0.5);
    pb.line_to(cx, tip_y);
    pb.line_to(cx + head_radius * 0.85, cx + head_radius * 0.5);
    pb.close();
    let body = pb.finish().ok_or_else(|| OverlayError::TextureGeneration {
        variant: name.to_string(),
        reason: "empty pin path".to_string(),
    })?;
    pixmap.fill_path(
        &body,
        &solid(PIN_COLOR),
        FillRule::Winding,
        Transform::identity(),
        None,
    );

    if let Some(dot) = PathBuilder::from_circle(cx, cx, head_radius * 0.4) {
        pixmap.fill_path(
            &dot,
            &solid(0xFFFFFF),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    Ok(TextureImage {
        name: name.to_string(),
        anchor: centered_anchor(&pixmap),
        pixmap,
    })
}

/// PNG icon anchored at its center.
fn load_icon(path: &Path) -> Result<TextureImage, OverlayError> {
    let pixmap = Pixmap::load_png(path).map_err(|e| OverlayError::AssetLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(TextureImage {
        name: format!("search-pin:{}", path.display()),
        anchor: centered_anchor(&pixmap),
        pixmap,
    })
}

fn centered_anchor(pixmap: &Pixmap) -> (f32, f32) {
    (pixmap.width() as f32 / 2.0, pixmap.height() as f32 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectormap_core::{BlockMode, BlockedServices, LatLng, Technology};

    fn cache() -> TextureCache {
        TextureCache::build(&OverlaySettings::default()).unwrap()
    }

    #[test]
    fn test_builds_all_textures() {
        let cache = cache();
        assert_eq!(cache.len(), TEXTURE_COUNT);
        assert_eq!(cache.len(), 20);
    }

    #[test]
    fn test_texture_for_is_idempotent() {
        let cache = cache();
        let sector = Sector::new("L1", LatLng::new(43.2, 76.9), 90.0, Technology::Lte);
        let first = cache.texture_for(&sector, false);
        let second = cache.texture_for(&sector, false);
        assert!(Arc::ptr_eq(first, second));

        let selected = cache.texture_for(&sector, true);
        assert!(!Arc::ptr_eq(first, selected));
    }

    #[test]
    fn test_selected_conditional_uses_selected_variant() {
        let cache = cache();
        let sector = Sector::new("G7", LatLng::new(43.2, 76.9), 10.0, Technology::Gsm)
            .with_blocked(BlockedServices {
                unconditional: None,
                conditional: Some(vec![]),
            });
        let texture = cache.texture_for(&sector, true);
        assert_eq!(texture.name(), "GSM/selected/CN");

        let blocked = cache.wedge(VariantKey::new(Technology::Gsm, false, BlockMode::Conditional));
        assert!(!Arc::ptr_eq(texture, blocked));
    }

    #[test]
    fn test_wedge_is_anchored_at_center_and_filled() {
        let cache = cache();
        let texture = cache.wedge(VariantKey::new(Technology::Gsm, false, BlockMode::NoBlock));
        let (ax, ay) = texture.anchor();
        assert_eq!(ax, texture.width() as f32 / 2.0);
        assert_eq!(ay, texture.height() as f32 / 2.0);

        // A point inside the arc at 30 degrees, half the radius out.
        let rad = 30f32.to_radians();
        let x = (ax + 60.0 * rad.cos()) as u32;
        let y = (ay + 60.0 * rad.sin()) as u32;
        let pixel = texture.pixmap().pixel(x, y).unwrap();
        assert_eq!(pixel.alpha(), 255);
        assert_eq!(
            (pixel.red(), pixel.green(), pixel.blue()),
            (0x3F, 0xA3, 0x4D)
        );

        // The opposite side stays transparent.
        let opposite = texture.pixmap().pixel((ax - 60.0) as u32, ay as u32).unwrap();
        assert_eq!(opposite.alpha(), 0);
    }

    #[test]
    fn test_generated_pin_is_anchored_at_center() {
        let cache = cache();
        let pin = cache.search_pin();
        assert_eq!(pin.anchor(), (PIN_WIDTH as f32 / 2.0, PIN_HEIGHT as f32 / 2.0));
    }

    #[test]
    fn test_missing_pin_icon_is_fatal() {
        let settings = OverlaySettings {
            search_pin_icon: Some("/nonexistent/marker.png".into()),
            ..OverlaySettings::default()
        };
        let err = TextureCache::build(&settings).unwrap_err();
        assert!(matches!(err, OverlayError::AssetLoad { .. }));
    }
}
