//! Viewport Sync Controller
//!
//! Keeps the basemap viewport, the persisted view and the bounds queries in
//! step. Restores the last view at startup, persists it when a move
//! settles and decides when the visible area is re-queried.

use sectormap_core::{MapAction, Technology, Viewport};
use sectormap_settings::{RestoredView, ViewportPersistence};

use crate::basemap::Basemap;

/// Whether a bounds query should be sent.
///
/// Sectors are only loaded when zoomed in far enough and at least one
/// technology is active.
pub fn should_query(zoom: f64, technologies: &[Technology], min_query_zoom: f64) -> bool {
    zoom >= min_query_zoom && !technologies.is_empty()
}

/// Bounds query for the visible area.
pub fn bounds_query(viewport: &Viewport, technologies: &[Technology]) -> MapAction {
    MapAction::LoadSectorsByBounds {
        technologies: technologies.to_vec(),
        polygon: viewport.bounding_polygon(),
    }
}

/// Persists and queries the map viewport.
#[derive(Clone)]
pub struct ViewportSync {
    persistence: ViewportPersistence,
    min_query_zoom: f64,
}

impl ViewportSync {
    /// Creates a controller over `persistence`.
    pub fn new(persistence: ViewportPersistence, min_query_zoom: f64) -> Self {
        Self {
            persistence,
            min_query_zoom,
        }
    }

    /// Lowest zoom at which the visible area is queried.
    pub fn min_query_zoom(&self) -> f64 {
        self.min_query_zoom
    }

    /// Applies the persisted (or default) view to `map` without reporting
    /// a settled move.
    pub fn restore(&self, map: &mut dyn Basemap) -> RestoredView {
        let view = self.persistence.restore();
        map.init_view(view.center, view.zoom);
        tracing::info!(
            "Map view restored to {} @ z{} ({})",
            view.center,
            view.zoom,
            if view.from_storage { "persisted" } else { "default" }
        );
        view
    }

    /// Query issued once the map is ready.
    pub fn initial_query(
        &self,
        viewport: &Viewport,
        technologies: &[Technology],
    ) -> Option<MapAction> {
        self.query(viewport, technologies)
    }

    /// Pan or zoom settled: persist the view, then maybe re-query.
    pub fn on_move_settled(
        &self,
        viewport: &Viewport,
        technologies: &[Technology],
    ) -> Option<MapAction> {
        if let Err(e) = self.persistence.save(viewport.center(), viewport.zoom()) {
            tracing::warn!("Failed to persist map view: {}", e);
        }
        self.query(viewport, technologies)
    }

    /// Zoom settled.
    pub fn on_zoom_settled(
        &self,
        viewport: &Viewport,
        technologies: &[Technology],
    ) -> Option<MapAction> {
        self.query(viewport, technologies)
    }

    /// The active technology set changed.
    pub fn on_technologies_changed(
        &self,
        viewport: &Viewport,
        technologies: &[Technology],
    ) -> Option<MapAction> {
        self.query(viewport, technologies)
    }

    fn query(&self, viewport: &Viewport, technologies: &[Technology]) -> Option<MapAction> {
        should_query(viewport.zoom(), technologies, self.min_query_zoom)
            .then(|| bounds_query(viewport, technologies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::HeadlessMap;
    use sectormap_core::LatLng;
    use sectormap_settings::{KeyValueStorage, MemoryStorage, ViewSettings, ZOOM_KEY};
    use std::sync::Arc;

    fn sync_with(storage: Arc<MemoryStorage>) -> ViewportSync {
        ViewportSync::new(
            ViewportPersistence::new(storage, ViewSettings::default()),
            12.0,
        )
    }

    fn viewport(zoom: f64) -> Viewport {
        Viewport::new(LatLng::new(43.25, 76.95), zoom, 800.0, 600.0)
    }

    #[test]
    fn test_should_query_threshold() {
        let techs = [Technology::Gsm];
        assert!(should_query(12.0, &techs, 12.0));
        assert!(!should_query(11.99, &techs, 12.0));
        assert!(!should_query(15.0, &[], 12.0));
    }

    #[test]
    fn test_restore_uses_default_view() {
        let sync = sync_with(Arc::new(MemoryStorage::new()));
        let mut map = HeadlessMap::new(viewport(3.0));
        let view = sync.restore(&mut map);

        assert!(!view.from_storage);
        assert_eq!(map.viewport().zoom(), 5.0);
        assert_eq!(map.viewport().center(), LatLng::new(48.0, 68.0));
    }

    #[test]
    fn test_move_settled_persists_then_queries() {
        let storage = Arc::new(MemoryStorage::new());
        let sync = sync_with(storage.clone());

        let action = sync.on_move_settled(&viewport(13.0), &[Technology::Lte]);
        match action {
            Some(MapAction::LoadSectorsByBounds {
                technologies,
                polygon,
            }) => {
                assert_eq!(technologies, vec![Technology::Lte]);
                assert_eq!(polygon.len(), 5);
                assert_eq!(polygon.first(), polygon.last());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(storage.get(ZOOM_KEY).unwrap().as_deref(), Some("13.0"));

        let mut map = HeadlessMap::new(viewport(3.0));
        let view = sync.restore(&mut map);
        assert!(view.from_storage);
        assert_eq!(view.zoom, 13.0);
    }

    #[test]
    fn test_low_zoom_persists_without_query() {
        let storage = Arc::new(MemoryStorage::new());
        let sync = sync_with(storage.clone());
        assert!(sync
            .on_move_settled(&viewport(8.0), &[Technology::Gsm])
            .is_none());
        assert!(storage.get(ZOOM_KEY).unwrap().is_some());
        assert!(sync.on_zoom_settled(&viewport(8.0), &[Technology::Gsm]).is_none());
    }

    #[test]
    fn test_technology_change_requeries() {
        let sync = sync_with(Arc::new(MemoryStorage::new()));
        assert!(sync
            .on_technologies_changed(&viewport(14.0), &[Technology::Gsm, Technology::Umts])
            .is_some());
        assert!(sync.on_technologies_changed(&viewport(14.0), &[]).is_none());
        assert!(sync.initial_query(&viewport(14.0), &[]).is_none());
    }
}
