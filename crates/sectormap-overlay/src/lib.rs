//! # SectorMap Overlay
//!
//! Sprite overlay drawn above the basemap: the cache of marker textures,
//! the scene pipeline that turns sector sets into sprites, the per-frame
//! pin rescale loop and a headless tiny-skia backend.

pub mod backend;
pub mod pipeline;
pub mod projection;
pub mod raster;
pub mod rescale;
pub mod scene;
pub mod texture;
pub mod variants;

pub use backend::{NullBackend, RenderBackend};
pub use pipeline::{unique_points, OverlayPipeline, RedrawStats, SceneInput};
pub use projection::{pin_scale, FrameTransform, LayerProjector};
pub use raster::RasterBackend;
pub use rescale::{RescaleLoop, RescaleParams};
pub use scene::{Scene, Sprite, SpriteKind};
pub use texture::{Texture, TextureCache, TextureImage, TEXTURE_COUNT};
pub use variants::{
    VariantKey, VariantStyle, AZIMUTH_OFFSET_DEG, BASE_STATION_Z, SEARCH_PIN_Z, VARIANT_COUNT,
};
