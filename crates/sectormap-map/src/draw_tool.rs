//! Draw-Tool State Machine
//!
//! Tracks whether a draw, edit or delete interaction is in progress and turns
//! completed shapes into layer actions for the store.
//!
//! A stop does not return to [`DrawMode::Idle`] immediately: the map
//! reports a click right after a shape is finished, and that click must still
//! be treated as part of the drawing. The stop arms a short deadline instead;
//! the owner calls [`DrawTool::poll`] when it passes.

use sectormap_core::{AreaGeometry, GeometryError, LayerId, MapAction, Technology};
use std::time::Duration;
use tokio::time::Instant;

use crate::events::DrawInteraction;

/// Whether a drawing interaction is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    /// No interaction
    #[default]
    Idle,
    /// A draw, edit or delete interaction is active
    Drawing,
}

/// Hands out layer ids for drawn and restored areas.
#[derive(Debug, Clone)]
pub struct LayerIdAllocator {
    next: LayerId,
}

impl Default for LayerIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl LayerIdAllocator {
    /// Creates an allocator starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh id.
    pub fn next_id(&mut self) -> LayerId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Records an id assigned elsewhere so it is never handed out again.
    pub fn observe(&mut self, id: LayerId) {
        if id >= self.next {
            self.next = id + 1;
        }
    }
}

/// Add-layer action for a normalized geometry.
pub fn add_layer_action(
    id: LayerId,
    geometry: &AreaGeometry,
    technologies: &[Technology],
) -> MapAction {
    let technologies = technologies.to_vec();
    match geometry {
        AreaGeometry::Circle { center, radius } => MapAction::AddCircleLayer {
            id,
            radius: *radius,
            center: *center,
            technologies,
        },
        AreaGeometry::Polygon { ring } => MapAction::AddPolygonLayer {
            id,
            ring: ring.clone(),
            technologies,
        },
        AreaGeometry::Rectangle { ring } => MapAction::AddRectangleLayer {
            id,
            ring: ring.clone(),
            technologies,
        },
    }
}

/// Draw mode plus the stop debounce.
#[derive(Debug)]
pub struct DrawTool {
    mode: DrawMode,
    debounce: Duration,
    idle_at: Option<Instant>,
    ids: LayerIdAllocator,
}

impl DrawTool {
    /// Creates an idle tool with the given stop debounce.
    pub fn new(debounce: Duration) -> Self {
        Self {
            mode: DrawMode::Idle,
            debounce,
            idle_at: None,
            ids: LayerIdAllocator::new(),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// True while an interaction is active or its stop is still debouncing.
    pub fn is_drawing(&self) -> bool {
        self.mode == DrawMode::Drawing
    }

    /// When the pending stop takes effect.
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.idle_at
    }

    /// An interaction began. Cancels a pending stop.
    pub fn start(&mut self, interaction: DrawInteraction) {
        tracing::debug!("Draw {} started", interaction);
        self.mode = DrawMode::Drawing;
        self.idle_at = None;
    }

    /// An interaction ended. A later stop restarts the window.
    pub fn stop(&mut self, interaction: DrawInteraction, now: Instant) {
        tracing::debug!("Draw {} stopped", interaction);
        self.idle_at = Some(now + self.debounce);
    }

    /// Applies a pending stop whose deadline has passed. Returns true when
    /// the mode changed to idle.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.idle_at {
            Some(deadline) if deadline <= now => {
                self.idle_at = None;
                let changed = self.mode != DrawMode::Idle;
                self.mode = DrawMode::Idle;
                changed
            }
            _ => false,
        }
    }

    /// A fresh layer id.
    pub fn allocate_id(&mut self) -> LayerId {
        self.ids.next_id()
    }

    /// A shape was completed. Returns its id, the normalized geometry and
    /// the add action.
    ///
    /// The toolkit's layer id is kept when it has one, so later edits and
    /// deletes name the same layer; otherwise a fresh id is allocated.
    pub fn created(
        &mut self,
        toolkit_id: Option<LayerId>,
        geometry: &AreaGeometry,
        technologies: &[Technology],
    ) -> Result<(LayerId, AreaGeometry, MapAction), GeometryError> {
        let geometry = geometry.normalized()?;
        let id = match toolkit_id {
            Some(id) => {
                self.ids.observe(id);
                id
            }
            None => self.ids.next_id(),
        };
        let action = add_layer_action(id, &geometry, technologies);
        tracing::debug!("Created {} layer {}", geometry.kind(), id);
        Ok((id, geometry, action))
    }

    /// Shapes were edited.
    ///
    /// Every geometry is validated before anything is returned, so a bad
    /// layer yields an error and no actions. On success the first action
    /// removes all edited ids and one add per layer follows, ids preserved.
    pub fn edited(
        &mut self,
        layers: &[(LayerId, AreaGeometry)],
        technologies: &[Technology],
    ) -> Result<(Vec<(LayerId, AreaGeometry)>, Vec<MapAction>), GeometryError> {
        let normalized = layers
            .iter()
            .map(|(id, geometry)| geometry.normalized().map(|g| (*id, g)))
            .collect::<Result<Vec<_>, _>>()?;
        if normalized.is_empty() {
            return Ok((normalized, Vec::new()));
        }

        let mut actions = Vec::with_capacity(normalized.len() + 1);
        actions.push(MapAction::RemoveLayers {
            ids: normalized.iter().map(|(id, _)| *id).collect(),
        });
        for (id, geometry) in &normalized {
            self.ids.observe(*id);
            actions.push(add_layer_action(*id, geometry, technologies));
        }
        Ok((normalized, actions))
    }

    /// Shapes were deleted.
    pub fn deleted(&self, ids: &[LayerId]) -> Option<MapAction> {
        (!ids.is_empty()).then(|| MapAction::RemoveLayers { ids: ids.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectormap_core::LatLng;

    const DEBOUNCE: Duration = Duration::from_millis(10);

    #[test]
    fn test_stop_debounce_returns_to_idle() {
        let t0 = Instant::now();
        let mut tool = DrawTool::new(DEBOUNCE);
        tool.start(DrawInteraction::Draw);
        tool.stop(DrawInteraction::Draw, t0);

        assert!(tool.is_drawing());
        assert!(!tool.poll(t0 + Duration::from_millis(9)));
        assert!(tool.poll(t0 + DEBOUNCE));
        assert_eq!(tool.mode(), DrawMode::Idle);
        assert!(tool.idle_deadline().is_none());
    }

    #[test]
    fn test_second_stop_restarts_window() {
        let t0 = Instant::now();
        let mut tool = DrawTool::new(DEBOUNCE);
        tool.start(DrawInteraction::Edit);
        tool.stop(DrawInteraction::Edit, t0);
        tool.stop(DrawInteraction::Edit, t0 + Duration::from_millis(8));

        assert!(!tool.poll(t0 + Duration::from_millis(12)));
        assert!(tool.poll(t0 + Duration::from_millis(18)));
    }

    #[test]
    fn test_start_cancels_pending_stop() {
        let t0 = Instant::now();
        let mut tool = DrawTool::new(DEBOUNCE);
        tool.start(DrawInteraction::Draw);
        tool.stop(DrawInteraction::Draw, t0);
        tool.start(DrawInteraction::Delete);

        assert!(!tool.poll(t0 + Duration::from_secs(1)));
        assert!(tool.is_drawing());
    }

    #[test]
    fn test_created_polygon_closes_ring() {
        let mut tool = DrawTool::new(DEBOUNCE);
        let polygon = AreaGeometry::Polygon {
            ring: vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(1.0, 0.0),
                LatLng::new(1.0, 1.0),
            ],
        };
        let (id, geometry, action) = tool.created(None, &polygon, &[Technology::Gsm]).unwrap();
        assert_eq!(id, 1);
        match action {
            MapAction::AddPolygonLayer { ring, .. } => {
                assert_eq!(ring.len(), 4);
                assert_eq!(ring.first(), ring.last());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(geometry.kind(), sectormap_core::GeometryKind::Polygon);
    }

    #[test]
    fn test_edited_is_all_or_nothing() {
        let mut tool = DrawTool::new(DEBOUNCE);
        let layers = vec![
            (
                5,
                AreaGeometry::Circle {
                    center: LatLng::new(1.0, 1.0),
                    radius: 10.0,
                },
            ),
            (
                7,
                AreaGeometry::Circle {
                    center: LatLng::new(1.0, 1.0),
                    radius: f64::NAN,
                },
            ),
        ];
        assert!(tool.edited(&layers, &[Technology::Gsm]).is_err());
    }

    #[test]
    fn test_edited_ids_are_not_reused() {
        let mut tool = DrawTool::new(DEBOUNCE);
        let circle = AreaGeometry::Circle {
            center: LatLng::new(1.0, 1.0),
            radius: 10.0,
        };
        tool.edited(&[(9, circle.clone())], &[]).unwrap();
        let (id, _, _) = tool.created(None, &circle, &[]).unwrap();
        assert_eq!(id, 10);
    }

    #[test]
    fn test_created_keeps_toolkit_id() {
        let mut tool = DrawTool::new(DEBOUNCE);
        let circle = AreaGeometry::Circle {
            center: LatLng::new(1.0, 1.0),
            radius: 10.0,
        };
        let (id, _, action) = tool.created(Some(41), &circle, &[]).unwrap();
        assert_eq!(id, 41);
        assert!(matches!(action, MapAction::AddCircleLayer { id: 41, .. }));

        // Restored areas never take an id the toolkit already used.
        assert_eq!(tool.allocate_id(), 42);
    }

    #[test]
    fn test_deleted_empty_is_noop() {
        let tool = DrawTool::new(DEBOUNCE);
        assert!(tool.deleted(&[]).is_none());
        assert_eq!(
            tool.deleted(&[2, 4]),
            Some(MapAction::RemoveLayers { ids: vec![2, 4] })
        );
    }
}
