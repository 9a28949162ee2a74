//! Action routing.
//!
//! Store-side [`ActionSink`]s register for a set of categories and are kept
//! in one route list per [`ActionCategory`], so a dispatch only visits the
//! sinks that asked for its category. Queue sinks feed an async store task
//! and fall out of the table once their receiver is dropped. An optional
//! bounded journal keeps the latest dispatches for inspection.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::actions::{ActionCategory, MapAction};

const CATEGORY_COUNT: usize = ActionCategory::ALL.len();

/// Handle for removing a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sink({})", &self.0.to_string()[..8])
    }
}

/// Which categories a sink receives
#[derive(Debug, Clone, Default)]
pub enum ActionFilter {
    /// Every category.
    #[default]
    All,
    /// Only these categories.
    Categories(Vec<ActionCategory>),
}

impl ActionFilter {
    fn includes(&self, category: ActionCategory) -> bool {
        match self {
            ActionFilter::All => true,
            ActionFilter::Categories(categories) => categories.contains(&category),
        }
    }
}

/// Receives map actions on the dispatching task.
///
/// Implementations return quickly and must not subscribe or unsubscribe
/// from inside `accept`.
pub trait ActionSink: Send + Sync {
    /// Takes one action. Returns false once the sink can no longer accept
    /// anything; it is then removed from the bus.
    fn accept(&self, action: &MapAction) -> bool;
}

impl<F> ActionSink for F
where
    F: Fn(&MapAction) + Send + Sync,
{
    fn accept(&self, action: &MapAction) -> bool {
        self(action);
        true
    }
}

struct QueueSink(mpsc::UnboundedSender<MapAction>);

impl ActionSink for QueueSink {
    fn accept(&self, action: &MapAction) -> bool {
        self.0.send(action.clone()).is_ok()
    }
}

#[derive(Clone)]
struct Route {
    id: SubscriptionId,
    sink: Arc<dyn ActionSink>,
}

/// Errors from [`ActionBus::dispatch`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionBusError {
    /// Nothing is registered for the action's category.
    #[error("No sink for {category} actions")]
    NoSubscribers {
        /// Category of the undelivered action
        category: ActionCategory,
    },
}

/// Carries map dispatches to the store
pub struct ActionBus {
    routes: RwLock<[Vec<Route>; CATEGORY_COUNT]>,
    journal: Mutex<VecDeque<MapAction>>,
    journal_capacity: usize,
}

impl ActionBus {
    /// A bus without a journal.
    pub fn new() -> Self {
        Self::with_journal(0)
    }

    /// A bus that keeps the last `capacity` dispatches.
    pub fn with_journal(capacity: usize) -> Self {
        Self {
            routes: RwLock::new(Default::default()),
            journal: Mutex::new(VecDeque::with_capacity(capacity)),
            journal_capacity: capacity,
        }
    }

    /// Delivers an action to every sink of its category.
    ///
    /// The action is journaled even when nothing receives it. Returns the
    /// number of sinks reached.
    pub fn dispatch(&self, action: MapAction) -> Result<usize, ActionBusError> {
        let category = action.category();
        tracing::debug!("Dispatch [{}]: {}", category, action.description());
        self.record(&action);

        let (delivered, closed) = {
            let routes = self.routes.read();
            let mut delivered = 0;
            let mut closed = Vec::new();
            for route in &routes[category.index()] {
                if route.sink.accept(&action) {
                    delivered += 1;
                } else {
                    closed.push(route.id);
                }
            }
            (delivered, closed)
        };

        for id in closed {
            tracing::debug!("{} closed, removing", id);
            self.unsubscribe(id);
        }

        if delivered == 0 {
            Err(ActionBusError::NoSubscribers { category })
        } else {
            Ok(delivered)
        }
    }

    /// Registers a sink for the categories `filter` selects.
    pub fn subscribe<S>(&self, filter: ActionFilter, sink: S) -> SubscriptionId
    where
        S: ActionSink + 'static,
    {
        let route = Route {
            id: SubscriptionId::new(),
            sink: Arc::new(sink),
        };
        let mut routes = self.routes.write();
        for category in ActionCategory::ALL {
            if filter.includes(category) {
                routes[category.index()].push(route.clone());
            }
        }
        tracing::debug!("{} registered for {:?}", route.id, filter);
        route.id
    }

    /// Unbounded queue of matching actions for an async store task.
    /// Dropping the receiver removes the sink on the next dispatch.
    pub fn queue(&self, filter: ActionFilter) -> mpsc::UnboundedReceiver<MapAction> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe(filter, QueueSink(tx));
        rx
    }

    /// Removes a sink from every category. Returns true if it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for slot in self.routes.write().iter_mut() {
            let before = slot.len();
            slot.retain(|route| route.id != id);
            removed |= slot.len() != before;
        }
        removed
    }

    /// Number of registered sinks.
    pub fn subscriber_count(&self) -> usize {
        let routes = self.routes.read();
        routes
            .iter()
            .flatten()
            .map(|route| route.id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Sinks that would receive an action of `category`.
    pub fn sinks_for(&self, category: ActionCategory) -> usize {
        self.routes.read()[category.index()].len()
    }

    /// Journaled dispatches, oldest first. Empty without a journal.
    pub fn journal(&self) -> Vec<MapAction> {
        self.journal.lock().iter().cloned().collect()
    }

    /// Empties the journal.
    pub fn clear_journal(&self) {
        self.journal.lock().clear();
    }

    fn record(&self, action: &MapAction) {
        if self.journal_capacity == 0 {
            return;
        }
        let mut journal = self.journal.lock();
        if journal.len() == self.journal_capacity {
            journal.pop_front();
        }
        journal.push_back(action.clone());
    }
}

impl Default for ActionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBus")
            .field("sinks", &self.subscriber_count())
            .field("journal_capacity", &self.journal_capacity)
            .finish()
    }
}
