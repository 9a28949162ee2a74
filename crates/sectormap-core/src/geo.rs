//! Geographic coordinates and viewport geometry.
//!
//! Handles conversion between geographic coordinates (lat/lng) and pixel
//! coordinates at a given zoom using the spherical Web Mercator projection
//! (EPSG:3857) with 256 px tiles, the same scheme the basemap tiles use.
//! Also derives viewport bounds, the closed bounding polygon sent with
//! bounds queries, and ground distances.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::GeometryError;

/// Mean Earth radius in meters, used for ground distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Equatorial radius used by the spherical Mercator projection.
const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the square Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Size of one tile in pixels at integer zoom levels.
pub const TILE_SIZE: f64 = 256.0;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Creates a new coordinate.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns true when both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Returns this coordinate, or an error if it is not finite.
    pub fn validated(self) -> Result<Self, GeometryError> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(GeometryError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

/// A point in pixel space (x to the right, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl PixelPoint {
    /// Creates a new pixel point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise subtraction.
    pub fn sub(&self, other: &PixelPoint) -> PixelPoint {
        PixelPoint::new(self.x - other.x, self.y - other.y)
    }

    /// Component-wise addition.
    pub fn add(&self, other: &PixelPoint) -> PixelPoint {
        PixelPoint::new(self.x + other.x, self.y + other.y)
    }

    /// Multiplies both components by `factor`.
    pub fn scaled(&self, factor: f64) -> PixelPoint {
        PixelPoint::new(self.x * factor, self.y * factor)
    }
}

/// Pixel size of the whole world at `zoom`.
pub fn zoom_scale(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Projects a coordinate to absolute world pixels at `zoom`.
pub fn project(latlng: LatLng, zoom: f64) -> PixelPoint {
    let lat = latlng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x_m = MERCATOR_RADIUS_M * latlng.lng.to_radians();
    let y_m = MERCATOR_RADIUS_M * (PI / 4.0 + lat / 2.0).tan().ln();

    let k = 0.5 / (PI * MERCATOR_RADIUS_M);
    let scale = zoom_scale(zoom);
    PixelPoint::new(scale * (k * x_m + 0.5), scale * (-k * y_m + 0.5))
}

/// Inverse of [`project`].
pub fn unproject(point: PixelPoint, zoom: f64) -> LatLng {
    let k = 0.5 / (PI * MERCATOR_RADIUS_M);
    let scale = zoom_scale(zoom);
    let x_m = (point.x / scale - 0.5) / k;
    let y_m = (point.y / scale - 0.5) / -k;

    let lng = (x_m / MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (y_m / MERCATOR_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
    LatLng::new(lat, lng)
}

/// Closes a coordinate ring: the first point is appended unless it is
/// already the last one.
pub fn close_ring(ring: &[LatLng]) -> Result<Vec<LatLng>, GeometryError> {
    let first = *ring.first().ok_or(GeometryError::EmptyRing)?;
    for point in ring {
        point.validated()?;
    }

    let mut closed = ring.to_vec();
    if closed.last() != Some(&first) || closed.len() == 1 {
        closed.push(first);
    }
    Ok(closed)
}

/// Returns true when `ring[0] == ring[last]` and the ring has at least two points.
pub fn is_closed(ring: &[LatLng]) -> bool {
    ring.len() >= 2 && ring.first() == ring.last()
}

/// An axis-aligned geographic rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    /// South-west corner.
    pub south_west: LatLng,
    /// North-east corner.
    pub north_east: LatLng,
}

impl LatLngBounds {
    /// Creates bounds from two corners in any order.
    pub fn new(a: LatLng, b: LatLng) -> Self {
        Self {
            south_west: LatLng::new(a.lat.min(b.lat), a.lng.min(b.lng)),
            north_east: LatLng::new(a.lat.max(b.lat), a.lng.max(b.lng)),
        }
    }

    /// Smallest bounds containing every point, or `None` for no points.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Grows the bounds to include `point`.
    pub fn extend(&mut self, point: LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Union of two bounds.
    pub fn union(&self, other: &LatLngBounds) -> LatLngBounds {
        let mut out = *self;
        out.extend(other.south_west);
        out.extend(other.north_east);
        out
    }

    /// North-west corner.
    pub fn north_west(&self) -> LatLng {
        LatLng::new(self.north_east.lat, self.south_west.lng)
    }

    /// South-east corner.
    pub fn south_east(&self) -> LatLng {
        LatLng::new(self.south_west.lat, self.north_east.lng)
    }

    /// Geographic midpoint.
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Returns true if `point` lies inside or on the edge.
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Closed ring SW, SE, NE, NW, SW.
    pub fn to_polygon(&self) -> Vec<LatLng> {
        let sw = self.south_west;
        vec![sw, self.south_east(), self.north_east, self.north_west(), sw]
    }
}

/// The visible map region: zoom, center and container size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    center: LatLng,
    zoom: f64,
    width: f64,
    height: f64,
}

impl Viewport {
    /// Creates a viewport for a container of `width` × `height` pixels.
    pub fn new(center: LatLng, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    /// Gets the center coordinate.
    pub fn center(&self) -> LatLng {
        self.center
    }

    /// Gets the current zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Gets the container width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Gets the container height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Moves the view.
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.center = center;
        self.zoom = zoom;
    }

    /// Sets the container dimensions (typically called on resize).
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// World pixel of the container's top-left corner.
    pub fn pixel_origin(&self) -> PixelPoint {
        let center = project(self.center, self.zoom);
        center.sub(&PixelPoint::new(self.width / 2.0, self.height / 2.0))
    }

    /// Converts a coordinate to container pixels (0,0 at top-left).
    pub fn latlng_to_container_point(&self, latlng: LatLng) -> PixelPoint {
        project(latlng, self.zoom).sub(&self.pixel_origin())
    }

    /// Converts container pixels back to a coordinate.
    pub fn container_point_to_latlng(&self, point: PixelPoint) -> LatLng {
        unproject(point.add(&self.pixel_origin()), self.zoom)
    }

    /// Geographic bounds of the visible container.
    pub fn bounds(&self) -> LatLngBounds {
        let north_west = self.container_point_to_latlng(PixelPoint::new(0.0, 0.0));
        let south_east = self.container_point_to_latlng(PixelPoint::new(self.width, self.height));
        LatLngBounds::new(north_west, south_east)
    }

    /// Four-corner bounding polygon, closed (first point repeated as last).
    pub fn bounding_polygon(&self) -> Vec<LatLng> {
        self.bounds().to_polygon()
    }

    /// Map scale relative to `reference_zoom`.
    pub fn scale_relative_to(&self, reference_zoom: f64) -> f64 {
        2f64.powf(self.zoom - reference_zoom)
    }

    /// Integer zoom at which `bounds` fits the container, capped at `max_zoom`.
    pub fn bounds_zoom(&self, bounds: &LatLngBounds, max_zoom: f64) -> f64 {
        let sw = project(bounds.south_west, 0.0);
        let ne = project(bounds.north_east, 0.0);
        let dx = (ne.x - sw.x).abs();
        let dy = (sw.y - ne.y).abs();

        if dx <= f64::EPSILON && dy <= f64::EPSILON {
            return max_zoom;
        }

        let scale_x = if dx > f64::EPSILON { self.width / dx } else { f64::INFINITY };
        let scale_y = if dy > f64::EPSILON { self.height / dy } else { f64::INFINITY };
        let zoom = scale_x.min(scale_y).log2().floor();
        zoom.clamp(0.0, max_zoom)
    }

    /// Centers the view on `bounds` at the largest zoom that fits, capped at `max_zoom`.
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, max_zoom: f64) {
        let zoom = self.bounds_zoom(bounds, max_zoom);
        let sw = project(bounds.south_west, zoom);
        let ne = project(bounds.north_east, zoom);
        let mid = PixelPoint::new((sw.x + ne.x) / 2.0, (sw.y + ne.y) / 2.0);
        self.center = unproject(mid, zoom);
        self.zoom = zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_origin() {
        let p = project(LatLng::new(0.0, 0.0), 0.0);
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_unproject() {
        let original = LatLng::new(43.238, 76.945);
        let back = unproject(project(original, 12.0), 12.0);
        assert!((back.lat - original.lat).abs() < 1e-9);
        assert!((back.lng - original.lng).abs() < 1e-9);
    }

    #[test]
    fn test_distance_small_offset() {
        let a = LatLng::new(50.0, 60.0);
        let b = LatLng::new(50.00001, 60.00001);
        let d = a.distance_to(&b);
        assert!(d > 1.0 && d < 1.5, "distance was {}", d);
    }

    #[test]
    fn test_close_ring_appends_first() {
        let ring = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 1.0),
        ];
        let closed = close_ring(&ring).unwrap();
        assert_eq!(closed.len(), 4);
        assert!(is_closed(&closed));
    }

    #[test]
    fn test_close_ring_keeps_closed_ring() {
        let ring = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(0.0, 0.0),
        ];
        assert_eq!(close_ring(&ring).unwrap(), ring);
    }

    #[test]
    fn test_close_ring_rejects_empty_and_nan() {
        assert_eq!(close_ring(&[]), Err(GeometryError::EmptyRing));
        assert!(close_ring(&[LatLng::new(f64::NAN, 0.0)]).is_err());
    }

    #[test]
    fn test_bounding_polygon_closed() {
        let vp = Viewport::new(LatLng::new(43.2, 76.9), 13.0, 1024.0, 768.0);
        let poly = vp.bounding_polygon();
        assert_eq!(poly.len(), 5);
        assert_eq!(poly[0], poly[4]);
        assert!(vp.bounds().contains(&vp.center()));
    }

    #[test]
    fn test_container_point_of_center() {
        let vp = Viewport::new(LatLng::new(10.0, 20.0), 8.0, 800.0, 600.0);
        let p = vp.latlng_to_container_point(vp.center());
        assert!((p.x - 400.0).abs() < 1e-6);
        assert!((p.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_bounds_respects_max_zoom() {
        let mut vp = Viewport::new(LatLng::new(0.0, 0.0), 3.0, 800.0, 600.0);
        let point = LatLng::new(43.0, 76.0);
        vp.fit_bounds(&LatLngBounds::new(point, point), 16.0);
        assert_eq!(vp.zoom(), 16.0);
        assert!((vp.center().lat - 43.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_bounds_contains_bounds() {
        let mut vp = Viewport::new(LatLng::new(0.0, 0.0), 3.0, 800.0, 600.0);
        let bounds = LatLngBounds::new(LatLng::new(43.0, 76.0), LatLng::new(43.5, 77.0));
        vp.fit_bounds(&bounds, 18.0);
        let visible = vp.bounds();
        assert!(visible.contains(&bounds.south_west));
        assert!(visible.contains(&bounds.north_east));
    }
}
