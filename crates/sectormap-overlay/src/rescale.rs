//! Per-frame pin rescaling.
//!
//! Search pins keep a constant apparent size, so their scale tracks the
//! inverse map scale. A repeating task reads the current zoom every frame
//! and writes the pin scale into the shared scene. Only one loop may run per
//! pipeline: `start` always stops the previous loop first.

use sectormap_core::ThreadSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::projection::pin_scale;
use crate::scene::Scene;

/// Parameters of the rescale loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescaleParams {
    /// Zoom the layer is projected at
    pub projection_zoom: f64,
    /// Upper bound of the pin scale
    pub max_pin_scale: f64,
    /// Loop period
    pub frame_interval: Duration,
}

#[derive(Debug, Default)]
struct LoopStats {
    frames: AtomicU64,
    live: AtomicUsize,
}

/// Decrements the live-loop count when the task ends or is aborted.
struct LiveGuard(Arc<LoopStats>);

impl LiveGuard {
    fn enter(stats: Arc<LoopStats>) -> Self {
        stats.live.fetch_add(1, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to the cancellable rescale task.
#[derive(Debug, Default)]
pub struct RescaleLoop {
    task: Option<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
    stats: Arc<LoopStats>,
}

impl RescaleLoop {
    /// Creates a stopped loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts rescaling `scene` from `zoom`, stopping any previous loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &mut self,
        scene: ThreadSafe<Scene>,
        mut zoom: watch::Receiver<f64>,
        params: RescaleParams,
    ) {
        self.cancel();

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let stats = self.stats.clone();
        let guard = LiveGuard::enter(stats.clone());

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let mut ticker = tokio::time::interval(params.frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let current = *zoom.borrow_and_update();
                        let scale = pin_scale(
                            current,
                            params.projection_zoom,
                            params.max_pin_scale,
                        );
                        scene.lock().set_pin_scale(scale);
                        stats.frames.fetch_add(1, Ordering::Relaxed);
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::trace!("Rescale loop stopped");
        });

        self.shutdown = Some(shutdown_tx);
        self.task = Some(handle);
        tracing::debug!("Rescale loop started ({:?} per frame)", params.frame_interval);
    }

    /// Stops the loop. Safe to call when not running.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.task.take() {
            handle.abort();
            tracing::debug!("Rescale loop cancelled");
        }
    }

    /// True while a loop task is owned by this handle.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Number of loop tasks currently alive, including ones still winding down.
    pub fn live_tasks(&self) -> usize {
        self.stats.live.load(Ordering::SeqCst)
    }

    /// Total frames applied across every loop started by this handle.
    pub fn frames(&self) -> u64 {
        self.stats.frames.load(Ordering::Relaxed)
    }
}

impl Drop for RescaleLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectormap_core::{thread_safe, PixelPoint};
    use sectormap_settings::OverlaySettings;

    use crate::scene::{Sprite, SpriteKind};
    use crate::texture::TextureCache;

    fn params() -> RescaleParams {
        RescaleParams {
            projection_zoom: 9.0,
            max_pin_scale: 1.0 / 32.0,
            frame_interval: Duration::from_millis(16),
        }
    }

    fn scene_with_pin() -> ThreadSafe<Scene> {
        let cache = TextureCache::build(&OverlaySettings::default()).unwrap();
        let mut scene = Scene::new();
        scene.add(Sprite::new(
            SpriteKind::SearchPin,
            cache.search_pin().clone(),
            PixelPoint::new(0.0, 0.0),
            11,
        ));
        thread_safe(scene)
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_applies_pin_scale_from_zoom() {
        let scene = scene_with_pin();
        let (zoom_tx, zoom_rx) = watch::channel(16.0);
        let mut rescale = RescaleLoop::new();
        rescale.start(scene.clone(), zoom_rx, params());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(scene.lock().sprites()[0].scale, 1.0 / 128.0);

        zoom_tx.send_replace(10.0);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(scene.lock().sprites()[0].scale, 1.0 / 32.0);
        assert!(rescale.frames() >= 2);

        rescale.cancel();
        assert!(!rescale.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_never_duplicates_loops() {
        let scene = scene_with_pin();
        let (_zoom_tx, zoom_rx) = watch::channel(12.0);
        let mut rescale = RescaleLoop::new();

        for _ in 0..3 {
            rescale.start(scene.clone(), zoom_rx.clone(), params());
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(rescale.live_tasks(), 1);

        let before = rescale.frames();
        tokio::time::sleep(Duration::from_millis(160)).await;
        let ticks = rescale.frames() - before;
        assert!(ticks <= 11, "{} ticks in 10 frames", ticks);

        rescale.cancel();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(rescale.live_tasks(), 0);
    }
}
