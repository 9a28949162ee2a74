//! Layer projection.
//!
//! Sprite positions are projected once, at a fixed projection zoom, relative
//! to the map's pixel origin when the render context was created. Viewport
//! changes after that only change the frame transform, so a pan or zoom
//! never re-projects the scene.

use sectormap_core::geo::project;
use sectormap_core::{LatLng, PixelPoint, Viewport};

/// Projects coordinates into layer space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerProjector {
    projection_zoom: f64,
    origin: PixelPoint,
}

impl LayerProjector {
    /// Anchors layer space at the viewport's current top-left corner.
    pub fn new(projection_zoom: f64, viewport: &Viewport) -> Self {
        let scale = 2f64.powf(projection_zoom - viewport.zoom());
        Self {
            projection_zoom,
            origin: viewport.pixel_origin().scaled(scale),
        }
    }

    /// Zoom the layer is projected at.
    pub fn projection_zoom(&self) -> f64 {
        self.projection_zoom
    }

    /// Layer point of a coordinate.
    pub fn latlng_to_layer_point(&self, latlng: LatLng) -> PixelPoint {
        project(latlng, self.projection_zoom).sub(&self.origin)
    }

    /// Map scale of `viewport` relative to the projection zoom.
    pub fn scale(&self, viewport: &Viewport) -> f64 {
        viewport.scale_relative_to(self.projection_zoom)
    }

    /// Transform from layer points to container pixels for `viewport`.
    pub fn frame(&self, viewport: &Viewport) -> FrameTransform {
        let scale = self.scale(viewport);
        FrameTransform {
            scale,
            offset: self.origin.scaled(scale).sub(&viewport.pixel_origin()),
        }
    }
}

/// Uniform scale plus offset taking layer points to container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    /// Layer-to-screen scale
    pub scale: f64,
    /// Container position of the layer origin
    pub offset: PixelPoint,
}

impl FrameTransform {
    /// Container pixel of a layer point.
    pub fn apply(&self, point: PixelPoint) -> PixelPoint {
        point.scaled(self.scale).add(&self.offset)
    }
}

/// Scale of search pins at `zoom`: the inverse map scale, capped at `max_scale`.
pub fn pin_scale(zoom: f64, projection_zoom: f64, max_scale: f64) -> f32 {
    (1.0 / 2f64.powf(zoom - projection_zoom)).min(max_scale) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: PixelPoint, b: PixelPoint) {
        assert!((a.x - b.x).abs() < 1e-6, "{:?} != {:?}", a, b);
        assert!((a.y - b.y).abs() < 1e-6, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_frame_matches_container_projection() {
        let initial = Viewport::new(LatLng::new(43.25, 76.95), 12.0, 800.0, 600.0);
        let projector = LayerProjector::new(9.0, &initial);
        let target = LatLng::new(43.26, 76.93);
        let layer = projector.latlng_to_layer_point(target);

        for (center, zoom) in [
            (LatLng::new(43.25, 76.95), 12.0),
            (LatLng::new(43.3, 77.0), 14.0),
            (LatLng::new(43.0, 76.5), 9.0),
        ] {
            let viewport = Viewport::new(center, zoom, 800.0, 600.0);
            let frame = projector.frame(&viewport);
            assert_close(frame.apply(layer), viewport.latlng_to_container_point(target));
        }
    }

    #[test]
    fn test_layer_origin_is_initial_top_left() {
        let viewport = Viewport::new(LatLng::new(48.0, 68.0), 5.0, 1024.0, 768.0);
        let projector = LayerProjector::new(9.0, &viewport);
        let top_left = viewport.container_point_to_latlng(PixelPoint::new(0.0, 0.0));
        assert_close(
            projector.latlng_to_layer_point(top_left),
            PixelPoint::new(0.0, 0.0),
        );
    }

    #[test]
    fn test_pin_scale_is_capped() {
        assert_eq!(pin_scale(9.0, 9.0, 1.0 / 32.0), 1.0 / 32.0);
        assert_eq!(pin_scale(14.0, 9.0, 1.0 / 32.0), 1.0 / 32.0);
        assert_eq!(pin_scale(16.0, 9.0, 1.0 / 32.0), 1.0 / 128.0);
    }
}
