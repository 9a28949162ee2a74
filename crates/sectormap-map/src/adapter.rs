//! Drawing-toolkit payload adapter.
//!
//! Converts the JSON the browser drawing toolkit emits (Leaflet.draw event
//! objects with their private layer fields) into typed [`DrawEvent`]s. No
//! other module looks at toolkit payloads.
//!
//! Recognized fields:
//! - `type`: `draw:drawstart`, `draw:editstop`, `draw:created`, ...
//! - `layerType`: `circle`, `polygon` or `rectangle` on created events
//! - created layers: `_leaflet_id`, the id edits and deletes refer to
//! - circle layers: `_mRadius` and `_latlng`
//! - polygon and rectangle layers: `_latlngs`, nested one level per ring
//! - edited/deleted events: `layers._layers`, keyed by layer id

use sectormap_core::{AreaGeometry, GeometryError, LatLng, LayerId};
use serde_json::Value;

use crate::events::{DrawEvent, DrawInteraction};

/// Parses a toolkit event serialized as JSON text.
pub fn parse_draw_event_str(json: &str) -> Result<DrawEvent, GeometryError> {
    let payload: Value = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;
    parse_draw_event(&payload)
}

/// Parses a toolkit event object.
pub fn parse_draw_event(payload: &Value) -> Result<DrawEvent, GeometryError> {
    let event_type = payload
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing event type"))?;

    match event_type {
        "draw:drawstart" => Ok(DrawEvent::Started(DrawInteraction::Draw)),
        "draw:editstart" => Ok(DrawEvent::Started(DrawInteraction::Edit)),
        "draw:deletestart" => Ok(DrawEvent::Started(DrawInteraction::Delete)),
        "draw:drawstop" => Ok(DrawEvent::Stopped(DrawInteraction::Draw)),
        "draw:editstop" => Ok(DrawEvent::Stopped(DrawInteraction::Edit)),
        "draw:deletestop" => Ok(DrawEvent::Stopped(DrawInteraction::Delete)),
        "draw:created" => {
            let layer = payload
                .get("layer")
                .ok_or_else(|| malformed("created event without layer"))?;
            let layer_type = payload.get("layerType").and_then(Value::as_str);
            Ok(DrawEvent::Created {
                id: layer.get("_leaflet_id").and_then(Value::as_u64),
                geometry: layer_geometry(layer, layer_type)?,
            })
        }
        "draw:edited" => {
            let mut layers = Vec::new();
            for (id, layer) in event_layers(payload)? {
                let layer_type = layer.get("layerType").and_then(Value::as_str);
                layers.push((id, layer_geometry(layer, layer_type)?));
            }
            Ok(DrawEvent::Edited(layers))
        }
        "draw:deleted" => Ok(DrawEvent::Deleted(
            event_layers(payload)?.into_iter().map(|(id, _)| id).collect(),
        )),
        other => Err(GeometryError::UnsupportedLayerType {
            layer_type: other.to_string(),
        }),
    }
}

/// Typed geometry of one toolkit layer.
///
/// Without a `layer_type` the kind is inferred: a layer with a radius is a
/// circle, any other ring layer a polygon.
pub fn layer_geometry(
    layer: &Value,
    layer_type: Option<&str>,
) -> Result<AreaGeometry, GeometryError> {
    let kind = match layer_type {
        Some(kind) => kind,
        None if layer.get("_mRadius").is_some() => "circle",
        None => "polygon",
    };

    match kind {
        "circle" => {
            let radius = layer
                .get("_mRadius")
                .and_then(Value::as_f64)
                .ok_or_else(|| malformed("circle without _mRadius"))?;
            let center = latlng(
                layer
                    .get("_latlng")
                    .ok_or_else(|| malformed("circle without _latlng"))?,
            )?;
            Ok(AreaGeometry::Circle { center, radius })
        }
        "polygon" => Ok(AreaGeometry::Polygon {
            ring: outer_ring(layer)?,
        }),
        "rectangle" => Ok(AreaGeometry::Rectangle {
            ring: outer_ring(layer)?,
        }),
        other => Err(GeometryError::UnsupportedLayerType {
            layer_type: other.to_string(),
        }),
    }
}

fn event_layers(payload: &Value) -> Result<Vec<(LayerId, &Value)>, GeometryError> {
    let layers = payload
        .get("layers")
        .and_then(|l| l.get("_layers"))
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("missing layers._layers"))?;

    let mut parsed = Vec::with_capacity(layers.len());
    for (key, layer) in layers {
        let id: LayerId = key
            .parse()
            .map_err(|_| malformed(format!("layer id '{}' is not numeric", key)))?;
        parsed.push((id, layer));
    }
    parsed.sort_by_key(|(id, _)| *id);
    Ok(parsed)
}

/// First ring of `_latlngs`, which is `[[p, ...]]` for polygons or `[p, ...]`.
fn outer_ring(layer: &Value) -> Result<Vec<LatLng>, GeometryError> {
    let latlngs = layer
        .get("_latlngs")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("ring layer without _latlngs"))?;

    let ring = match latlngs.first() {
        Some(Value::Array(inner)) => inner,
        _ => latlngs,
    };
    if ring.is_empty() {
        return Err(GeometryError::EmptyRing);
    }
    ring.iter().map(latlng).collect()
}

fn latlng(value: &Value) -> Result<LatLng, GeometryError> {
    let lat = value.get("lat").and_then(Value::as_f64);
    let lng = value.get("lng").and_then(Value::as_f64);
    match (lat, lng) {
        (Some(lat), Some(lng)) => LatLng::new(lat, lng).validated(),
        _ => Err(malformed(format!("not a lat/lng object: {}", value))),
    }
}

fn malformed(reason: impl Into<String>) -> GeometryError {
    GeometryError::MalformedLayer {
        reason: reason.into(),
    }
}
