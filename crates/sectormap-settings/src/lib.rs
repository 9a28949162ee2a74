//! SectorMap Settings Crate
//!
//! Handles map configuration and client-local viewport persistence.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    InteractionSettings, Locale, MapConfig, OverlaySettings, PopupSettings, TileSettings,
    ViewSettings,
};
pub use error::{PersistenceError, PersistenceResult, SettingsError, SettingsResult};
pub use persistence::{
    FileStorage, KeyValueStorage, MemoryStorage, RestoredView, ViewportPersistence, CENTER_KEY,
    ZOOM_KEY,
};
