//! Type aliases for commonly used shared-state types.
//!
//! The overlay scene and the map view are shared between the event loop and
//! the rescale task, so they live behind a `parking_lot` mutex.
//!
//! ```rust,ignore
//! use sectormap_core::types::*;
//!
//! let scene: ThreadSafe<Scene> = thread_safe(Scene::default());
//! scene.lock().clear();
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for sharing between tasks.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// Create a new `ThreadSafe<T>` from a value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}
