//! Commands the host application sends to a running sectors component.

use sectormap_core::{AreaGeometry, LatLng, LatLngBounds, LayerId, SectorList};

/// Imperative requests from outside the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    /// Restore saved areas: each is shown, dispatched as an add-layer
    /// action and the map fits all of them.
    DrawAreas(Vec<AreaGeometry>),
    /// Remove drawn areas from the map.
    RemoveAreas(Vec<LayerId>),
    /// Center on one sector at focus zoom.
    FitSector(LatLng),
    /// Fit the bounds of the given sectors.
    FitSearchedSectors(SectorList),
    /// Fit arbitrary bounds.
    FitBounds(LatLngBounds),
}

impl MapCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            MapCommand::DrawAreas(_) => "draw-areas",
            MapCommand::RemoveAreas(_) => "remove-areas",
            MapCommand::FitSector(_) => "fit-sector",
            MapCommand::FitSearchedSectors(_) => "fit-searched",
            MapCommand::FitBounds(_) => "fit-bounds",
        }
    }
}
