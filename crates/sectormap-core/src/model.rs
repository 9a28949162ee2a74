//! Domain model: sectors, technologies, block state and drawn areas.
//!
//! Sectors arrive from the store as immutable snapshots and are shared as
//! `Arc<[Sector]>`; nothing downstream mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::GeometryError;
use crate::geo::{close_ring, LatLng, LatLngBounds, EARTH_RADIUS_M};

/// Stable identity of a drawn area layer.
pub type LayerId = u64;

/// Immutable shared list of sectors as published by the store.
pub type SectorList = Arc<[Sector]>;

/// Radio technology generation of a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Technology {
    /// Second generation (2G)
    Gsm,
    /// Third generation (3G)
    Umts,
    /// Fourth generation (4G)
    Lte,
}

impl Technology {
    /// Every technology, in generation order.
    pub const ALL: [Technology; 3] = [Technology::Gsm, Technology::Umts, Technology::Lte];

    /// Position in [`Technology::ALL`], usable as a table index.
    pub const fn index(self) -> usize {
        match self {
            Technology::Gsm => 0,
            Technology::Umts => 1,
            Technology::Lte => 2,
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Technology::Gsm => write!(f, "GSM"),
            Technology::Umts => write!(f, "UMTS"),
            Technology::Lte => write!(f, "LTE"),
        }
    }
}

impl FromStr for Technology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GSM" | "2G" => Ok(Technology::Gsm),
            "UMTS" | "3G" => Ok(Technology::Umts),
            "LTE" | "4G" => Ok(Technology::Lte),
            _ => Err(format!("Unknown technology: {}", s)),
        }
    }
}

/// Rendering-relevant block state of a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockMode {
    /// Not blocked.
    #[serde(rename = "NO_BLOCK")]
    NoBlock,
    /// Conditionally blocked.
    #[serde(rename = "CN")]
    Conditional,
    /// Unconditionally blocked.
    #[serde(rename = "UC")]
    Unconditional,
}

impl BlockMode {
    /// Every block mode.
    pub const ALL: [BlockMode; 3] = [
        BlockMode::NoBlock,
        BlockMode::Conditional,
        BlockMode::Unconditional,
    ];

    /// Position in [`BlockMode::ALL`], usable as a table index.
    pub const fn index(self) -> usize {
        match self {
            BlockMode::NoBlock => 0,
            BlockMode::Conditional => 1,
            BlockMode::Unconditional => 2,
        }
    }
}

/// Services blocked on a sector.
///
/// The two flags are independent and may co-occur. A flag is set when its
/// list is present, even if the list is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockedServices {
    /// Unconditionally blocked services.
    #[serde(rename = "UC", default, skip_serializing_if = "Option::is_none")]
    pub unconditional: Option<Vec<String>>,
    /// Conditionally blocked services.
    #[serde(rename = "CN", default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Vec<String>>,
}

impl BlockedServices {
    /// Block mode used for rendering: unconditional wins over conditional.
    pub fn mode(&self) -> BlockMode {
        if self.unconditional.is_some() {
            BlockMode::Unconditional
        } else if self.conditional.is_some() {
            BlockMode::Conditional
        } else {
            BlockMode::NoBlock
        }
    }
}

/// Reference to a task attached to a sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    /// Task identifier.
    pub id: u64,
}

/// A directional radio coverage wedge emitted from one base station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    /// Cell name, the sector identity.
    pub cell_name: String,
    /// Latitude of the base station.
    pub latitude: f64,
    /// Longitude of the base station.
    pub longitude: f64,
    /// Azimuth in degrees from north.
    pub azimut: f64,
    /// Radio technology.
    pub technology: Technology,
    /// Blocked services.
    #[serde(default)]
    pub blocked: BlockedServices,
    /// Name of the owning base station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_station_name: Option<String>,
    /// Block type reported by the backend for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_type: Option<BlockMode>,
    /// Tasks attached to this sector.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskRef>,
}

impl Sector {
    /// Creates an unblocked sector with no extra details.
    pub fn new(
        cell_name: impl Into<String>,
        position: LatLng,
        azimut: f64,
        technology: Technology,
    ) -> Self {
        Self {
            cell_name: cell_name.into(),
            latitude: position.lat,
            longitude: position.lng,
            azimut,
            technology,
            blocked: BlockedServices::default(),
            base_station_name: None,
            blocked_type: None,
            tasks: Vec::new(),
        }
    }

    /// Sets the blocked services.
    pub fn with_blocked(mut self, blocked: BlockedServices) -> Self {
        self.blocked = blocked;
        self
    }

    /// Base station position.
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Rendering block mode.
    pub fn block_mode(&self) -> BlockMode {
        self.blocked.mode()
    }
}

/// Details of the sector under the pointer, answered by the store for a
/// hover request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorInfo {
    /// The sector found near the hover point.
    pub sector: Sector,
    /// The hover point the request was made for.
    pub latlng: LatLng,
}

/// Geometry kind of a drawn area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    /// Center and radius.
    Circle,
    /// Free polygon ring.
    Polygon,
    /// Axis-aligned rectangle ring.
    Rectangle,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKind::Circle => write!(f, "circle"),
            GeometryKind::Polygon => write!(f, "polygon"),
            GeometryKind::Rectangle => write!(f, "rectangle"),
        }
    }
}

/// Typed geometry of a user-drawn area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AreaGeometry {
    /// A circle with its radius in meters.
    Circle {
        /// Center coordinate.
        center: LatLng,
        /// Radius in meters.
        radius: f64,
    },
    /// A polygon ring.
    Polygon {
        /// Ordered coordinates.
        ring: Vec<LatLng>,
    },
    /// A rectangle ring.
    Rectangle {
        /// Ordered coordinates.
        ring: Vec<LatLng>,
    },
}

impl AreaGeometry {
    /// Geometry kind.
    pub fn kind(&self) -> GeometryKind {
        match self {
            AreaGeometry::Circle { .. } => GeometryKind::Circle,
            AreaGeometry::Polygon { .. } => GeometryKind::Polygon,
            AreaGeometry::Rectangle { .. } => GeometryKind::Rectangle,
        }
    }

    /// Validates the geometry and closes rings.
    pub fn normalized(&self) -> Result<AreaGeometry, GeometryError> {
        match self {
            AreaGeometry::Circle { center, radius } => {
                if !radius.is_finite() || *radius < 0.0 {
                    return Err(GeometryError::InvalidRadius { radius: *radius });
                }
                Ok(AreaGeometry::Circle {
                    center: center.validated()?,
                    radius: *radius,
                })
            }
            AreaGeometry::Polygon { ring } => Ok(AreaGeometry::Polygon {
                ring: area_ring(ring)?,
            }),
            AreaGeometry::Rectangle { ring } => Ok(AreaGeometry::Rectangle {
                ring: area_ring(ring)?,
            }),
        }
    }

    /// Geographic bounds of the area.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        match self {
            AreaGeometry::Circle { center, radius } => {
                let lat_radius = (radius / EARTH_RADIUS_M).to_degrees();
                let cos_lat = center.lat.to_radians().cos();
                let lng_radius = if cos_lat.abs() > f64::EPSILON {
                    lat_radius / cos_lat
                } else {
                    180.0
                };
                Some(LatLngBounds::new(
                    LatLng::new(center.lat - lat_radius, center.lng - lng_radius),
                    LatLng::new(center.lat + lat_radius, center.lng + lng_radius),
                ))
            }
            AreaGeometry::Polygon { ring } | AreaGeometry::Rectangle { ring } => {
                LatLngBounds::from_points(ring.iter().copied())
            }
        }
    }
}

/// Closed ring with at least three distinct points.
fn area_ring(ring: &[LatLng]) -> Result<Vec<LatLng>, GeometryError> {
    let closed = close_ring(ring)?;
    let mut distinct: Vec<LatLng> = Vec::with_capacity(closed.len());
    for point in &closed {
        if !distinct.contains(point) {
            distinct.push(*point);
        }
    }
    if distinct.len() < 3 {
        return Err(GeometryError::DegenerateRing {
            points: distinct.len(),
        });
    }
    Ok(closed)
}
