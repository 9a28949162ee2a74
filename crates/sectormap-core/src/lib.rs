//! # SectorMap Core
//!
//! Core types and plumbing shared by the SectorMap crates:
//! geographic geometry and viewport math, the sector domain model, the
//! store feeds the map reads, and the action bus the map dispatches to.

pub mod action_bus;
pub mod error;
pub mod geo;
pub mod model;
pub mod store;
pub mod types;

pub use action_bus::{
    ActionBus, ActionBusError, ActionCategory, ActionFilter, ActionSink, MapAction,
    SubscriptionId,
};

pub use error::{Error, GeometryError, OverlayError, Result, StoreError};

pub use geo::{LatLng, LatLngBounds, PixelPoint, Viewport};

pub use model::{
    AreaGeometry, BlockMode, BlockedServices, GeometryKind, LayerId, Sector, SectorInfo,
    SectorList, TaskRef, Technology,
};

pub use store::{store_channel, StoreFeeds, StorePublisher};

pub use types::{thread_safe, ThreadSafe};
