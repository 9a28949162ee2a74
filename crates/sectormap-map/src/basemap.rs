//! Basemap binding.
//!
//! [`Basemap`] is the command surface the sectors component drives: view
//! changes, tile source, drawn area layers and the info popup. Tile
//! rendering itself belongs to the binding. [`HeadlessMap`] is an in-memory
//! binding for tests and offline rendering.

use sectormap_core::{
    thread_safe, AreaGeometry, LatLng, LatLngBounds, LayerId, ThreadSafe, Viewport,
};
use std::collections::BTreeMap;
use tokio::sync::mpsc::UnboundedSender;

use crate::events::MapEvent;
use crate::popup::PopupContent;

/// Commands the sectors component issues to the map.
pub trait Basemap: Send {
    /// Current viewport.
    fn viewport(&self) -> Viewport;

    /// Sets the initial view without reporting a settled move.
    fn init_view(&mut self, center: LatLng, zoom: f64);

    /// Moves the view; the binding reports the settled move.
    fn set_view(&mut self, center: LatLng, zoom: f64);

    /// Shows `bounds` at the largest zoom up to `max_zoom`.
    fn fit_bounds(&mut self, bounds: &LatLngBounds, max_zoom: f64);

    /// Resizes the map container.
    fn set_size(&mut self, width: f64, height: f64);

    /// Switches the tile source.
    fn set_tile_url(&mut self, url: &str);

    /// Shows a drawn area under `id`.
    fn add_area_layer(&mut self, id: LayerId, geometry: &AreaGeometry);

    /// Removes a drawn area. Returns false if no such layer exists.
    fn remove_area_layer(&mut self, id: LayerId) -> bool;

    /// Opens the info popup at `anchor`.
    fn open_popup(&mut self, anchor: LatLng, content: &PopupContent);

    /// Removes the info popup if one is open.
    fn close_popup(&mut self);
}

/// An open popup on the headless map.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPopup {
    /// World anchor
    pub anchor: LatLng,
    /// Content
    pub content: PopupContent,
}

#[derive(Debug)]
struct HeadlessState {
    viewport: Viewport,
    tile_url: String,
    layers: BTreeMap<LayerId, AreaGeometry>,
    popup: Option<OpenPopup>,
    popups_opened: usize,
}

/// In-memory basemap.
///
/// Clones share state, so a test can keep a handle while the component owns
/// another. With an event sender attached, programmatic and simulated view
/// changes report `ZoomEnd`/`MoveEnd` like an interactive map.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    state: ThreadSafe<HeadlessState>,
    events: Option<UnboundedSender<MapEvent>>,
}

impl HeadlessMap {
    /// Creates a map showing `viewport`.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: thread_safe(HeadlessState {
                viewport,
                tile_url: String::new(),
                layers: BTreeMap::new(),
                popup: None,
                popups_opened: 0,
            }),
            events: None,
        }
    }

    /// Reports settled moves to `events`.
    pub fn with_events(mut self, events: UnboundedSender<MapEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Simulates a user pan/zoom.
    pub fn pan_to(&self, center: LatLng, zoom: f64) {
        self.move_view(|vp| vp.set_view(center, zoom));
    }

    /// Current tile URL template.
    pub fn tile_url(&self) -> String {
        self.state.lock().tile_url.clone()
    }

    /// Ids of the drawn layers.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.state.lock().layers.keys().copied().collect()
    }

    /// Geometry of a drawn layer.
    pub fn layer(&self, id: LayerId) -> Option<AreaGeometry> {
        self.state.lock().layers.get(&id).cloned()
    }

    /// The open popup.
    pub fn popup(&self) -> Option<OpenPopup> {
        self.state.lock().popup.clone()
    }

    /// Number of popups opened so far.
    pub fn popups_opened(&self) -> usize {
        self.state.lock().popups_opened
    }

    fn move_view(&self, apply: impl FnOnce(&mut Viewport)) {
        let (before, after) = {
            let mut state = self.state.lock();
            let before = state.viewport.zoom();
            apply(&mut state.viewport);
            (before, state.viewport.zoom())
        };

        if let Some(events) = &self.events {
            if before != after {
                let _ = events.send(MapEvent::ZoomEnd);
            }
            let _ = events.send(MapEvent::MoveEnd);
        }
    }
}

impl Basemap for HeadlessMap {
    fn viewport(&self) -> Viewport {
        self.state.lock().viewport
    }

    fn init_view(&mut self, center: LatLng, zoom: f64) {
        self.state.lock().viewport.set_view(center, zoom);
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.move_view(|vp| vp.set_view(center, zoom));
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, max_zoom: f64) {
        self.move_view(|vp| vp.fit_bounds(bounds, max_zoom));
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.state.lock().viewport.set_size(width, height);
    }

    fn set_tile_url(&mut self, url: &str) {
        self.state.lock().tile_url = url.to_string();
    }

    fn add_area_layer(&mut self, id: LayerId, geometry: &AreaGeometry) {
        self.state.lock().layers.insert(id, geometry.clone());
    }

    fn remove_area_layer(&mut self, id: LayerId) -> bool {
        self.state.lock().layers.remove(&id).is_some()
    }

    fn open_popup(&mut self, anchor: LatLng, content: &PopupContent) {
        let mut state = self.state.lock();
        state.popup = Some(OpenPopup {
            anchor,
            content: content.clone(),
        });
        state.popups_opened += 1;
    }

    fn close_popup(&mut self) {
        self.state.lock().popup = None;
    }
}
