//! # SectorMap Map
//!
//! Map-side orchestration for SectorMap. The [`SectorsComponent`] binds a
//! [`Basemap`] to the sprite overlay and the application store:
//!
//! - [`viewport_sync`]: view restore/persist and bounds queries
//! - [`draw_tool`]: draw mode and area-layer actions
//! - [`popup`]: click queries, hover requests and the info popup
//! - [`adapter`]: drawing-toolkit payloads to typed geometry

pub mod adapter;
pub mod basemap;
pub mod commands;
pub mod component;
pub mod draw_tool;
pub mod events;
pub mod popup;
pub mod viewport_sync;

pub use adapter::{layer_geometry, parse_draw_event, parse_draw_event_str};
pub use basemap::{Basemap, HeadlessMap, OpenPopup};
pub use commands::MapCommand;
pub use component::{ComponentHandle, SectorsComponent};
pub use draw_tool::{add_layer_action, DrawMode, DrawTool, LayerIdAllocator};
pub use events::{DrawEvent, DrawInteraction, MapEvent};
pub use popup::{PopupContent, PopupController, PopupLabels, PopupOutcome, TaskLink};
pub use viewport_sync::{bounds_query, should_query, ViewportSync};
