use sectormap_core::{
    BlockedServices, LatLng, OverlayError, Sector, SectorList, Technology, Viewport,
};
use sectormap_overlay::{
    NullBackend, OverlayPipeline, SceneInput, SpriteKind, BASE_STATION_Z, SEARCH_PIN_Z,
};
use sectormap_settings::OverlaySettings;
use std::sync::Arc;
use std::time::Duration;

fn list(sectors: Vec<Sector>) -> SectorList {
    Arc::from(sectors)
}

fn viewport() -> Viewport {
    Viewport::new(LatLng::new(43.25, 76.95), 13.0, 800.0, 600.0)
}

fn sector(name: &str, lat: f64, lng: f64, technology: Technology) -> Sector {
    Sector::new(name, LatLng::new(lat, lng), 45.0, technology)
}

async fn pipeline() -> OverlayPipeline<NullBackend> {
    let mut pipeline = OverlayPipeline::new(OverlaySettings::default(), NullBackend::new());
    pipeline.initialize(&viewport()).unwrap();
    pipeline
}

#[tokio::test]
async fn test_redraw_requires_context() {
    let mut pipeline = OverlayPipeline::new(OverlaySettings::default(), NullBackend::new());
    let input = SceneInput::new(list(vec![]), list(vec![]), list(vec![]));
    assert!(matches!(
        pipeline.redraw(input),
        Err(OverlayError::NotInitialized)
    ));
}

#[tokio::test]
async fn test_draw_order_at_one_point() {
    let mut pipeline = pipeline().await;
    let gsm = sector("G1", 43.25, 76.95, Technology::Gsm);
    let input = SceneInput::new(list(vec![gsm.clone()]), list(vec![gsm]), list(vec![]));
    pipeline.redraw(input).unwrap();

    let scene = pipeline.scene();
    let scene = scene.lock();
    let wedges: Vec<i32> = scene.of_kind(SpriteKind::Sector).map(|s| s.z_index).collect();
    assert_eq!(wedges, vec![1, 2]);
    assert!(scene
        .of_kind(SpriteKind::BaseStation)
        .all(|s| s.z_index == BASE_STATION_Z));

    let order: Vec<i32> = scene.draw_order().iter().map(|s| s.z_index).collect();
    assert_eq!(order, vec![1, 2, BASE_STATION_Z, BASE_STATION_Z]);
}

#[tokio::test]
async fn test_selected_blocked_sector_uses_selected_texture() {
    let mut pipeline = pipeline().await;
    let blocked = sector("U3", 43.2, 76.9, Technology::Umts).with_blocked(BlockedServices {
        unconditional: None,
        conditional: Some(vec!["sms".into()]),
    });
    let input = SceneInput::new(list(vec![]), list(vec![blocked]), list(vec![]));
    let stats = pipeline.redraw(input).unwrap();
    assert_eq!(stats.selected, 1);

    let scene = pipeline.scene();
    let scene = scene.lock();
    let wedge = scene.of_kind(SpriteKind::Sector).next().unwrap();
    assert_eq!(wedge.texture.name(), "UMTS/selected/CN");
    assert_eq!(wedge.z_index, 4);
    assert_eq!(wedge.rotation, 45.0 - 125.0);
    assert_eq!(wedge.label.as_deref(), Some("U3"));
}

#[tokio::test]
async fn test_search_pins_are_deduplicated() {
    let mut pipeline = pipeline().await;
    let searched = list(vec![
        sector("A", 1.0, 2.0, Technology::Lte),
        sector("B", 1.0, 2.0, Technology::Gsm),
        sector("C", 3.0, 4.0, Technology::Lte),
    ]);
    let stats = pipeline
        .redraw(SceneInput::new(list(vec![]), list(vec![]), searched))
        .unwrap();

    assert_eq!(stats.pins, 2);
    assert_eq!(stats.sectors, 3);
    let scene = pipeline.scene();
    let scene = scene.lock();
    let pins: Vec<_> = scene.of_kind(SpriteKind::SearchPin).collect();
    assert_eq!(pins.len(), 2);
    assert!(pins.iter().all(|p| p.z_index == SEARCH_PIN_Z));
    assert!(pins.iter().all(|p| p.scale == 1.0 / 32.0));
}

#[tokio::test]
async fn test_bad_markers_are_skipped() {
    let mut pipeline = pipeline().await;
    let mut bad_azimuth = sector("X", 43.2, 76.9, Technology::Gsm);
    bad_azimuth.azimut = f64::NAN;
    let bad_position = sector("Y", f64::INFINITY, 76.9, Technology::Lte);
    let good = sector("Z", 43.2, 76.9, Technology::Lte);

    let stats = pipeline
        .redraw(SceneInput::new(
            list(vec![bad_azimuth, good]),
            list(vec![bad_position]),
            list(vec![]),
        ))
        .unwrap();
    assert_eq!(stats.sectors, 1);
    assert_eq!(stats.selected, 0);
    assert_eq!(stats.skipped, 2);
    assert_eq!(pipeline.scene().lock().len(), 2);
}

#[tokio::test]
async fn test_redraw_replaces_previous_scene() {
    let mut pipeline = pipeline().await;
    let many = list(
        (0..10)
            .map(|i| sector(&format!("S{i}"), 43.0, 76.0 + i as f64 * 0.01, Technology::Gsm))
            .collect(),
    );
    pipeline
        .redraw(SceneInput::new(many, list(vec![]), list(vec![])))
        .unwrap();
    assert_eq!(pipeline.scene().lock().len(), 20);

    pipeline
        .redraw(SceneInput::new(list(vec![]), list(vec![]), list(vec![])))
        .unwrap();
    assert!(pipeline.scene().lock().is_empty());
    assert_eq!(pipeline.backend().last_sprite_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reinitialize_keeps_single_rescale_loop_and_scene() {
    let mut pipeline = pipeline().await;
    pipeline
        .redraw(SceneInput::new(
            list(vec![sector("G", 43.25, 76.95, Technology::Gsm)]),
            list(vec![]),
            list(vec![sector("G", 43.25, 76.95, Technology::Gsm)]),
        ))
        .unwrap();

    let resized = Viewport::new(LatLng::new(43.25, 76.95), 13.0, 1024.0, 768.0);
    for _ in 0..3 {
        pipeline.initialize(&resized).unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(pipeline.rescale_loop().live_tasks(), 1);
    assert_eq!(pipeline.backend().size(), (1024, 768));
    assert_eq!(pipeline.scene().lock().len(), 5);

    pipeline.shutdown();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(pipeline.rescale_loop().live_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_zoom_change_rescales_pins() {
    let mut pipeline = pipeline().await;
    pipeline
        .redraw(SceneInput::new(
            list(vec![]),
            list(vec![]),
            list(vec![sector("P", 43.25, 76.95, Technology::Lte)]),
        ))
        .unwrap();

    let zoomed = Viewport::new(LatLng::new(43.25, 76.95), 17.0, 800.0, 600.0);
    pipeline.set_viewport(&zoomed).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let scene = pipeline.scene();
    let pin = scene.lock().of_kind(SpriteKind::SearchPin).next().unwrap().clone();
    assert_eq!(pin.scale, 1.0 / 256.0);
}
