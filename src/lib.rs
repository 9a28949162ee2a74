//! # SectorMap
//!
//! Radio sector map overlay: tens of thousands of directional sector
//! wedges drawn as sprites over a pannable, zoomable basemap.
//!
//! ## Architecture
//!
//! SectorMap is organized as a workspace with multiple crates:
//!
//! 1. **sectormap-core** - Geometry, sector model, store feeds, action bus
//! 2. **sectormap-settings** - Configuration and viewport persistence
//! 3. **sectormap-overlay** - Texture cache, sprite scene, render pipeline
//! 4. **sectormap-map** - Viewport sync, draw tool, popups, sectors component
//! 5. **sectormap** - Main binary that integrates all crates
//!
//! ## Features
//!
//! - **Sprite overlay**: 20 cached textures, z-ordered wedges, deduplicated search pins
//! - **Viewport sync**: persisted view, zoom-gated bounds queries
//! - **Area drawing**: circle/polygon/rectangle selections dispatched as layer actions
//! - **Hover popups**: debounced sector info with noise suppression
//! - **Headless rendering**: tiny-skia frames written as PNG

pub mod render;

pub use sectormap_core::{
    store_channel, ActionBus, AreaGeometry, Error, LatLng, LatLngBounds, MapAction, Result, Sector,
    SectorInfo, SectorList, StoreFeeds, StorePublisher, Technology, Viewport,
};
pub use sectormap_map::{
    Basemap, ComponentHandle, DrawEvent, HeadlessMap, MapCommand, MapEvent, SectorsComponent,
};
pub use sectormap_overlay::{NullBackend, OverlayPipeline, RasterBackend, RenderBackend};
pub use sectormap_settings::{MapConfig, ViewportPersistence};

/// Initialize logging with tracing
///
/// Sets up structured logging with:
/// - INFO level by default
/// - RUST_LOG environment variable support
/// - Output on stderr so stdout stays usable
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.as_str()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(())
}
