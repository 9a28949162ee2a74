//! Overlay render pipeline.
//!
//! Owns the render context (textures and layer projector), the sprite scene
//! and the pin rescale loop. Every change of the sector, selection or search
//! sets rebuilds the scene in one pass; viewport changes only move the frame
//! transform and feed the rescale loop.

use sectormap_core::{thread_safe, LatLng, OverlayError, Sector, SectorList, ThreadSafe, Viewport};
use sectormap_settings::OverlaySettings;
use std::collections::HashSet;
use tokio::sync::watch;

use crate::backend::RenderBackend;
use crate::projection::{pin_scale, LayerProjector};
use crate::rescale::{RescaleLoop, RescaleParams};
use crate::scene::{Scene, Sprite, SpriteKind};
use crate::texture::TextureCache;
use crate::variants::{VariantKey, AZIMUTH_OFFSET_DEG, BASE_STATION_Z, SEARCH_PIN_Z};

/// The three sector sets a scene is built from.
#[derive(Debug, Clone)]
pub struct SceneInput {
    /// All sectors in the area
    pub sectors: SectorList,
    /// Selected sectors
    pub selected: SectorList,
    /// Search results
    pub searched: SectorList,
}

impl SceneInput {
    /// Bundles the three sets.
    pub fn new(sectors: SectorList, selected: SectorList, searched: SectorList) -> Self {
        Self {
            sectors,
            selected,
            searched,
        }
    }
}

/// Counts from one rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedrawStats {
    /// Unselected wedges placed, including search results
    pub sectors: usize,
    /// Selected wedges placed
    pub selected: usize,
    /// Search pins placed after deduplication
    pub pins: usize,
    /// Markers skipped because of bad data
    pub skipped: usize,
}

struct RenderContext {
    textures: TextureCache,
    projector: LayerProjector,
}

/// Builds and renders the sprite scene.
pub struct OverlayPipeline<B: RenderBackend> {
    settings: OverlaySettings,
    context: Option<RenderContext>,
    scene: ThreadSafe<Scene>,
    zoom: watch::Sender<f64>,
    rescale: RescaleLoop,
    backend: B,
    viewport: Option<Viewport>,
    last_input: Option<SceneInput>,
}

impl<B: RenderBackend> OverlayPipeline<B> {
    /// Creates an uninitialized pipeline drawing through `backend`.
    pub fn new(settings: OverlaySettings, backend: B) -> Self {
        let (zoom, _) = watch::channel(settings.projection_zoom);
        Self {
            settings,
            context: None,
            scene: thread_safe(Scene::new()),
            zoom,
            rescale: RescaleLoop::new(),
            backend,
            viewport: None,
            last_input: None,
        }
    }

    /// Creates or rebuilds the render context for `viewport`.
    ///
    /// Stops the rescale loop first, rasterizes every texture, re-anchors
    /// the layer projection and restarts the loop. A scene that was already
    /// drawn is rebuilt against the new context. Must be called from within
    /// a tokio runtime.
    pub fn initialize(&mut self, viewport: &Viewport) -> Result<(), OverlayError> {
        self.rescale.cancel();

        let textures = TextureCache::build(&self.settings).map_err(|e| {
            tracing::error!("Overlay textures failed: {}", e);
            e
        })?;
        let projector = LayerProjector::new(self.settings.projection_zoom, viewport);
        self.backend
            .resize(viewport.width().round() as u32, viewport.height().round() as u32)?;

        let rebuild = self.context.is_some();
        self.context = Some(RenderContext {
            textures,
            projector,
        });
        self.viewport = Some(*viewport);
        self.zoom.send_replace(viewport.zoom());

        self.rescale.start(
            self.scene.clone(),
            self.zoom.subscribe(),
            RescaleParams {
                projection_zoom: self.settings.projection_zoom,
                max_pin_scale: self.settings.max_pin_scale,
                frame_interval: self.settings.frame_interval(),
            },
        );
        tracing::info!(
            "Overlay context {} on '{}' backend ({}x{})",
            if rebuild { "rebuilt" } else { "initialized" },
            self.backend.name(),
            viewport.width(),
            viewport.height()
        );

        match self.last_input.clone() {
            Some(input) => self.redraw(input).map(|_| ()),
            None => self.render(),
        }
    }

    /// True once a render context exists.
    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    /// Clears the scene and rebuilds it from `input`, then renders.
    pub fn redraw(&mut self, input: SceneInput) -> Result<RedrawStats, OverlayError> {
        let context = self.context.as_ref().ok_or(OverlayError::NotInitialized)?;
        let pin_scale = self.current_pin_scale();
        let mut stats = RedrawStats::default();

        {
            let mut scene = self.scene.lock();
            scene.clear();

            for sector in input.sectors.iter().chain(input.searched.iter()) {
                match place_sector(context, &self.settings, sector, false) {
                    Ok(sprites) => {
                        sprites.into_iter().for_each(|s| scene.add(s));
                        stats.sectors += 1;
                    }
                    Err(e) => {
                        tracing::warn!("{}", e);
                        stats.skipped += 1;
                    }
                }
            }

            for sector in input.selected.iter() {
                match place_sector(context, &self.settings, sector, true) {
                    Ok(sprites) => {
                        sprites.into_iter().for_each(|s| scene.add(s));
                        stats.selected += 1;
                    }
                    Err(e) => {
                        tracing::warn!("{}", e);
                        stats.skipped += 1;
                    }
                }
            }

            for point in unique_points(&input.searched) {
                let position = context.projector.latlng_to_layer_point(point);
                scene.add(
                    Sprite::new(
                        SpriteKind::SearchPin,
                        context.textures.search_pin().clone(),
                        position,
                        SEARCH_PIN_Z,
                    )
                    .with_scale(pin_scale),
                );
                stats.pins += 1;
            }
        }

        tracing::debug!(
            "Scene rebuilt: {} sectors, {} selected, {} pins, {} skipped",
            stats.sectors,
            stats.selected,
            stats.pins,
            stats.skipped
        );
        self.last_input = Some(input);
        self.render()?;
        Ok(stats)
    }

    /// Records a viewport change and renders the frame for it.
    pub fn set_viewport(&mut self, viewport: &Viewport) -> Result<(), OverlayError> {
        self.viewport = Some(*viewport);
        self.zoom.send_replace(viewport.zoom());
        if self.context.is_some() {
            self.render()?;
        }
        Ok(())
    }

    /// Renders the current scene for the last known viewport.
    pub fn render(&mut self) -> Result<(), OverlayError> {
        let context = self.context.as_ref().ok_or(OverlayError::NotInitialized)?;
        let viewport = self.viewport.ok_or(OverlayError::NotInitialized)?;
        let frame = context.projector.frame(&viewport);
        let scene = self.scene.lock();
        self.backend.render(&scene, &frame)
    }

    /// Stops the rescale loop and drops the render context.
    pub fn shutdown(&mut self) {
        self.rescale.cancel();
        self.context = None;
        self.scene.lock().clear();
        tracing::debug!("Overlay pipeline shut down");
    }

    /// Shared scene.
    pub fn scene(&self) -> ThreadSafe<Scene> {
        self.scene.clone()
    }

    /// Rescale loop handle.
    pub fn rescale_loop(&self) -> &RescaleLoop {
        &self.rescale
    }

    /// Render backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn current_pin_scale(&self) -> f32 {
        pin_scale(
            *self.zoom.borrow(),
            self.settings.projection_zoom,
            self.settings.max_pin_scale,
        )
    }
}

impl<B: RenderBackend> std::fmt::Debug for OverlayPipeline<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayPipeline")
            .field("initialized", &self.is_initialized())
            .field("backend", &self.backend.name())
            .field("sprites", &self.scene.lock().len())
            .finish()
    }
}

/// Wedge and base-station sprites of one sector.
fn place_sector(
    context: &RenderContext,
    settings: &OverlaySettings,
    sector: &Sector,
    selected: bool,
) -> Result<[Sprite; 2], OverlayError> {
    let position = sector.position();
    if !position.is_finite() || position.lat.abs() > 90.0 {
        return Err(OverlayError::Marker {
            cell_name: sector.cell_name.clone(),
            reason: format!("invalid position {}", position),
        });
    }
    if !sector.azimut.is_finite() {
        return Err(OverlayError::Marker {
            cell_name: sector.cell_name.clone(),
            reason: format!("invalid azimuth {}", sector.azimut),
        });
    }

    let point = context.projector.latlng_to_layer_point(position);
    let key = VariantKey::for_sector(sector, selected);
    let wedge = Sprite::new(
        SpriteKind::Sector,
        context.textures.wedge(key).clone(),
        point,
        key.z_index(),
    )
    .with_rotation(sector.azimut - AZIMUTH_OFFSET_DEG)
    .with_scale(settings.sector_scale)
    .with_label(sector.cell_name.clone());
    let base_station = Sprite::new(
        SpriteKind::BaseStation,
        context.textures.base_station().clone(),
        point,
        BASE_STATION_Z,
    )
    .with_scale(settings.sector_scale);

    Ok([wedge, base_station])
}

/// Distinct finite search positions in first-seen order.
pub fn unique_points(sectors: &[Sector]) -> Vec<LatLng> {
    // +0.0 folds -0.0 into 0.0 so bit equality matches `==`.
    let key = |p: &LatLng| ((p.lat + 0.0).to_bits(), (p.lng + 0.0).to_bits());
    let mut seen = HashSet::new();
    sectors
        .iter()
        .map(Sector::position)
        .filter(LatLng::is_finite)
        .filter(|p| seen.insert(key(p)))
        .collect()
}

impl From<(SectorList, SectorList, SectorList)> for SceneInput {
    fn from((sectors, selected, searched): (SectorList, SectorList, SectorList)) -> Self {
        Self::new(sectors, selected, searched)
    }
}
