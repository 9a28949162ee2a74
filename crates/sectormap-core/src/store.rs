//! Store feeds consumed by the map.
//!
//! The application store owns sector, selection and search data. The map
//! reads it through `tokio::sync::watch` receivers: each feed always holds
//! the latest snapshot and wakes the reader when it changes. The publisher
//! half is handed to whatever drives the store.

use std::sync::Arc;
use tokio::sync::watch;

use crate::model::{SectorInfo, SectorList, Technology};

/// Receivers for every store feed the map reads.
#[derive(Debug, Clone)]
pub struct StoreFeeds {
    /// All sectors in the current area.
    pub sectors: watch::Receiver<SectorList>,
    /// Selected sectors.
    pub selected: watch::Receiver<SectorList>,
    /// Sectors returned by the latest search.
    pub searched: watch::Receiver<SectorList>,
    /// Active technology filter.
    pub technologies: watch::Receiver<Vec<Technology>>,
    /// Offline tile mode.
    pub offline_mode: watch::Receiver<bool>,
    /// Details for the last hover request.
    pub sector_info: watch::Receiver<Option<SectorInfo>>,
}

impl StoreFeeds {
    /// Current value of the technology filter.
    pub fn technologies_snapshot(&self) -> Vec<Technology> {
        self.technologies.borrow().clone()
    }
}

/// Sender side of the store feeds.
#[derive(Debug)]
pub struct StorePublisher {
    sectors: watch::Sender<SectorList>,
    selected: watch::Sender<SectorList>,
    searched: watch::Sender<SectorList>,
    technologies: watch::Sender<Vec<Technology>>,
    offline_mode: watch::Sender<bool>,
    sector_info: watch::Sender<Option<SectorInfo>>,
}

impl StorePublisher {
    /// Publishes the sectors in the current area.
    pub fn set_sectors(&self, sectors: impl Into<SectorList>) {
        self.sectors.send_replace(sectors.into());
    }

    /// Publishes the selected sectors.
    pub fn set_selected(&self, selected: impl Into<SectorList>) {
        self.selected.send_replace(selected.into());
    }

    /// Publishes search results.
    pub fn set_searched(&self, searched: impl Into<SectorList>) {
        self.searched.send_replace(searched.into());
    }

    /// Publishes the technology filter.
    pub fn set_technologies(&self, technologies: Vec<Technology>) {
        self.technologies.send_replace(technologies);
    }

    /// Publishes the offline tile flag.
    pub fn set_offline_mode(&self, offline: bool) {
        self.offline_mode.send_replace(offline);
    }

    /// Publishes hover details.
    pub fn set_sector_info(&self, info: Option<SectorInfo>) {
        self.sector_info.send_replace(info);
    }

    /// Number of live readers of the sector feed.
    pub fn reader_count(&self) -> usize {
        self.sectors.receiver_count()
    }
}

/// Creates a connected publisher and feed set with empty initial values.
pub fn store_channel(technologies: Vec<Technology>) -> (StorePublisher, StoreFeeds) {
    let empty: SectorList = Arc::from(Vec::new());
    let (sectors_tx, sectors_rx) = watch::channel(empty.clone());
    let (selected_tx, selected_rx) = watch::channel(empty.clone());
    let (searched_tx, searched_rx) = watch::channel(empty);
    let (tech_tx, tech_rx) = watch::channel(technologies);
    let (offline_tx, offline_rx) = watch::channel(false);
    let (info_tx, info_rx) = watch::channel(None);

    (
        StorePublisher {
            sectors: sectors_tx,
            selected: selected_tx,
            searched: searched_tx,
            technologies: tech_tx,
            offline_mode: offline_tx,
            sector_info: info_tx,
        },
        StoreFeeds {
            sectors: sectors_rx,
            selected: selected_rx,
            searched: searched_rx,
            technologies: tech_rx,
            offline_mode: offline_rx,
            sector_info: info_rx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::model::Sector;

    #[test]
    fn test_publish_and_read() {
        let (publisher, feeds) = store_channel(vec![Technology::Gsm]);
        assert_eq!(feeds.technologies_snapshot(), vec![Technology::Gsm]);

        publisher.set_sectors(vec![Sector::new(
            "A-1",
            LatLng::new(1.0, 2.0),
            0.0,
            Technology::Lte,
        )]);
        assert_eq!(feeds.sectors.borrow().len(), 1);
        assert!(feeds.selected.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_change_notification() {
        let (publisher, mut feeds) = store_channel(Vec::new());
        publisher.set_offline_mode(true);
        feeds.offline_mode.changed().await.unwrap();
        assert!(*feeds.offline_mode.borrow_and_update());
    }
}
