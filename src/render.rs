//! Offline frame rendering
//!
//! Loads a sector snapshot from JSON, builds the overlay scene for one
//! viewport and writes the composited frame as PNG.

use anyhow::Context;
use sectormap_core::{LatLng, LatLngBounds, Sector, Viewport};
use sectormap_overlay::{OverlayPipeline, RasterBackend, RedrawStats, SceneInput};
use sectormap_settings::MapConfig;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Sector snapshot file: a bare array of sectors, or the three sets.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SectorFile {
    /// Sectors only
    Plain(Vec<Sector>),
    /// Sectors, selection and search results
    Sets {
        /// All sectors
        #[serde(default)]
        sectors: Vec<Sector>,
        /// Selected sectors
        #[serde(default)]
        selected: Vec<Sector>,
        /// Search results
        #[serde(default)]
        searched: Vec<Sector>,
    },
}

impl SectorFile {
    /// Reads a snapshot from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Scene input for the pipeline.
    pub fn into_scene_input(self) -> SceneInput {
        let (sectors, selected, searched) = match self {
            SectorFile::Plain(sectors) => (sectors, Vec::new(), Vec::new()),
            SectorFile::Sets {
                sectors,
                selected,
                searched,
            } => (sectors, selected, searched),
        };
        SceneInput::new(Arc::from(sectors), Arc::from(selected), Arc::from(searched))
    }
}

/// View to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewChoice {
    /// Explicit center and zoom
    Fixed {
        /// Map center
        center: LatLng,
        /// Zoom level
        zoom: f64,
    },
    /// Fit every sector in the input
    FitSectors,
}

/// Viewport for `input`. Fitting an empty input falls back to the
/// configured default view.
pub fn resolve_viewport(
    config: &MapConfig,
    input: &SceneInput,
    view: ViewChoice,
    width: u32,
    height: u32,
) -> Viewport {
    let (width, height) = (f64::from(width), f64::from(height));
    match view {
        ViewChoice::Fixed { center, zoom } => Viewport::new(center, zoom, width, height),
        ViewChoice::FitSectors => {
            let default = config.default_view;
            let mut viewport = Viewport::new(default.center, default.zoom, width, height);
            let points = input
                .sectors
                .iter()
                .chain(input.selected.iter())
                .chain(input.searched.iter())
                .map(Sector::position)
                .filter(LatLng::is_finite);
            if let Some(bounds) = LatLngBounds::from_points(points) {
                viewport.fit_bounds(&bounds, config.interaction.fit_max_zoom);
            }
            viewport
        }
    }
}

/// Result of a render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSummary {
    /// Scene counts
    pub stats: RedrawStats,
    /// Sprites drawn after culling
    pub drawn: usize,
    /// Viewport rendered
    pub viewport: Viewport,
}

/// Renders `input` for `viewport` into a PNG at `output`.
///
/// Must run inside a tokio runtime: the overlay starts its rescale task.
pub fn render_png(
    config: &MapConfig,
    input: SceneInput,
    viewport: Viewport,
    output: &Path,
) -> anyhow::Result<RenderSummary> {
    let backend = RasterBackend::new(viewport.width() as u32, viewport.height() as u32)?;
    let mut pipeline = OverlayPipeline::new(config.overlay.clone(), backend);
    pipeline
        .initialize(&viewport)
        .context("initializing overlay")?;

    let result = pipeline.redraw(input).map_err(anyhow::Error::from);
    let summary = result.and_then(|stats| {
        pipeline
            .backend()
            .save_png(output)
            .with_context(|| format!("writing {}", output.display()))?;
        Ok(RenderSummary {
            stats,
            drawn: pipeline.backend().drawn_sprites(),
            viewport,
        })
    });
    pipeline.shutdown();

    let summary = summary?;
    tracing::info!(
        "Rendered {} sprites ({} sectors, {} selected, {} pins) to {}",
        summary.drawn,
        summary.stats.sectors,
        summary.stats.selected,
        summary.stats.pins,
        output.display()
    );
    Ok(summary)
}
