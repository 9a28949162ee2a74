//! # Action Bus Module
//!
//! Carries the map's dispatches to the application store. The store side
//! registers an [`ActionSink`] or takes an async queue; the map never waits
//! for an answer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sectormap_core::action_bus::{ActionBus, ActionCategory, ActionFilter, MapAction};
//!
//! let bus = ActionBus::with_journal(64);
//! let subscription = bus.subscribe(
//!     ActionFilter::Categories(vec![ActionCategory::Layers]),
//!     |action: &MapAction| println!("layer action: {}", action.description()),
//! );
//! let mut queries = bus.queue(ActionFilter::Categories(vec![ActionCategory::Sectors]));
//!
//! bus.dispatch(MapAction::RemoveLayers { ids: vec![5, 7] }).ok();
//! bus.unsubscribe(subscription);
//! ```

mod actions;
mod bus;

pub use actions::*;
pub use bus::*;
