//! Action type definitions for the action bus.
//!
//! Actions are the dispatches the map sends to the application store. They
//! are fire-and-forget: the map never consumes a return value.

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;
use crate::model::{LayerId, Technology};

/// Root enum for every action the map dispatches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapAction {
    /// Load sectors inside the visible bounding polygon.
    LoadSectorsByBounds {
        /// Active technology filter.
        technologies: Vec<Technology>,
        /// Closed bounding polygon of the viewport.
        polygon: Vec<LatLng>,
    },
    /// Load sectors at a clicked point.
    LoadSectorsByPoint {
        /// Clicked coordinate.
        point: LatLng,
        /// Active technology filter.
        technologies: Vec<Technology>,
    },
    /// Add a circular selection area.
    AddCircleLayer {
        /// Layer identity.
        id: LayerId,
        /// Radius in meters.
        radius: f64,
        /// Circle center.
        center: LatLng,
        /// Active technology filter.
        technologies: Vec<Technology>,
    },
    /// Add a polygon selection area.
    AddPolygonLayer {
        /// Layer identity.
        id: LayerId,
        /// Closed coordinate ring.
        ring: Vec<LatLng>,
        /// Active technology filter.
        technologies: Vec<Technology>,
    },
    /// Add a rectangle selection area.
    AddRectangleLayer {
        /// Layer identity.
        id: LayerId,
        /// Closed coordinate ring.
        ring: Vec<LatLng>,
        /// Active technology filter.
        technologies: Vec<Technology>,
    },
    /// Remove selection areas.
    RemoveLayers {
        /// Layer identities to remove.
        ids: Vec<LayerId>,
    },
    /// Drop every selected sector.
    RemoveAllSelected,
    /// Ask for details of the sector under the pointer.
    RequestSectorInfo {
        /// Hover coordinate.
        point: LatLng,
    },
}

impl MapAction {
    /// Get the category of this action
    pub fn category(&self) -> ActionCategory {
        match self {
            MapAction::LoadSectorsByBounds { .. } | MapAction::LoadSectorsByPoint { .. } => {
                ActionCategory::Sectors
            }
            MapAction::AddCircleLayer { .. }
            | MapAction::AddPolygonLayer { .. }
            | MapAction::AddRectangleLayer { .. }
            | MapAction::RemoveLayers { .. } => ActionCategory::Layers,
            MapAction::RemoveAllSelected => ActionCategory::Selection,
            MapAction::RequestSectorInfo { .. } => ActionCategory::Info,
        }
    }

    /// Get a short description of this action for logging
    pub fn description(&self) -> String {
        match self {
            MapAction::LoadSectorsByBounds {
                technologies,
                polygon,
            } => format!(
                "Load sectors by bounds ({} techs, {} points)",
                technologies.len(),
                polygon.len()
            ),
            MapAction::LoadSectorsByPoint { point, .. } => {
                format!("Load sectors at {}", point)
            }
            MapAction::AddCircleLayer { id, radius, .. } => {
                format!("Add circle layer {} (r={:.1} m)", id, radius)
            }
            MapAction::AddPolygonLayer { id, ring, .. } => {
                format!("Add polygon layer {} ({} points)", id, ring.len())
            }
            MapAction::AddRectangleLayer { id, .. } => format!("Add rectangle layer {}", id),
            MapAction::RemoveLayers { ids } => format!("Remove layers {:?}", ids),
            MapAction::RemoveAllSelected => "Remove all selected".to_string(),
            MapAction::RequestSectorInfo { point } => format!("Sector info at {}", point),
        }
    }
}

/// Action category for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionCategory {
    /// Sector queries.
    Sectors,
    /// Drawn area layers.
    Layers,
    /// Selection state.
    Selection,
    /// Hover information.
    Info,
}

impl ActionCategory {
    /// Every category, in route-table order.
    pub const ALL: [ActionCategory; 4] = [
        ActionCategory::Sectors,
        ActionCategory::Layers,
        ActionCategory::Selection,
        ActionCategory::Info,
    ];

    /// Slot in the route table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionCategory::Sectors => write!(f, "Sectors"),
            ActionCategory::Layers => write!(f, "Layers"),
            ActionCategory::Selection => write!(f, "Selection"),
            ActionCategory::Info => write!(f, "Info"),
        }
    }
}
