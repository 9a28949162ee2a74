//! Events delivered by the basemap binding.

use sectormap_core::{AreaGeometry, LatLng, LayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which drawing interaction a start/stop event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawInteraction {
    /// Creating a new shape
    Draw,
    /// Editing existing shapes
    Edit,
    /// Deleting shapes
    Delete,
}

impl fmt::Display for DrawInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawInteraction::Draw => write!(f, "draw"),
            DrawInteraction::Edit => write!(f, "edit"),
            DrawInteraction::Delete => write!(f, "delete"),
        }
    }
}

/// Drawing-toolkit lifecycle, already converted to typed geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    /// An interaction began.
    Started(DrawInteraction),
    /// An interaction ended.
    Stopped(DrawInteraction),
    /// A new shape was completed. `id` is the toolkit's own layer id, which
    /// later edit and delete events refer to.
    Created {
        /// Toolkit layer id, if the toolkit reported one
        id: Option<LayerId>,
        /// Drawn shape
        geometry: AreaGeometry,
    },
    /// Existing shapes were changed.
    Edited(Vec<(LayerId, AreaGeometry)>),
    /// Shapes were removed.
    Deleted(Vec<LayerId>),
}

/// Everything the basemap reports to the sectors component.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Pan or zoom finished; the basemap holds the new viewport.
    MoveEnd,
    /// Zoom animation finished.
    ZoomEnd,
    /// Map clicked.
    Click(LatLng),
    /// Pointer moved over the map.
    PointerMove(LatLng),
    /// Drawing-toolkit event.
    Draw(DrawEvent),
    /// The map container changed size; the overlay context is rebuilt.
    Resized {
        /// New width in pixels
        width: f64,
        /// New height in pixels
        height: f64,
    },
}

impl MapEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::MoveEnd => "moveend",
            MapEvent::ZoomEnd => "zoomend",
            MapEvent::Click(_) => "click",
            MapEvent::PointerMove(_) => "mousemove",
            MapEvent::Draw(DrawEvent::Started(_)) => "draw:start",
            MapEvent::Draw(DrawEvent::Stopped(_)) => "draw:stop",
            MapEvent::Draw(DrawEvent::Created { .. }) => "draw:created",
            MapEvent::Draw(DrawEvent::Edited(_)) => "draw:edited",
            MapEvent::Draw(DrawEvent::Deleted(_)) => "draw:deleted",
            MapEvent::Resized { .. } => "resize",
        }
    }
}

impl From<DrawEvent> for MapEvent {
    fn from(event: DrawEvent) -> Self {
        MapEvent::Draw(event)
    }
}
