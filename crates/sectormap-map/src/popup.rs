//! Hit-Test & Popup Controller
//!
//! Handles map clicks and hover. Clicks become point queries. Pointer
//! moves are debounced into sector-info requests, and the answer opens a
//! single info popup at the hover point unless the nearest sector sits
//! practically under the pointer.

use sectormap_core::{BlockMode, LatLng, MapAction, Sector, SectorInfo, Technology};
use sectormap_settings::{Locale, PopupSettings};
use std::fmt::Write as _;
use std::time::Duration;
use tokio::time::Instant;

use crate::basemap::Basemap;

/// Localized popup captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupLabels {
    /// Base station caption
    pub base_stations: &'static str,
    /// Block type caption
    pub block_type: &'static str,
    /// Blocked services caption
    pub blocked_services: &'static str,
    /// Tasks caption
    pub tasks: &'static str,
    /// Unconditional block
    pub unconditional: &'static str,
    /// Conditional block
    pub conditional: &'static str,
}

const RU_LABELS: PopupLabels = PopupLabels {
    base_stations: "Базовые станции:",
    block_type: "Тип блокировки:",
    blocked_services: "Заблокированные сервисы:",
    tasks: "Задания:",
    unconditional: "Безусловная",
    conditional: "Условная",
};

const EN_LABELS: PopupLabels = PopupLabels {
    base_stations: "Base stations:",
    block_type: "Block type:",
    blocked_services: "Blocked services:",
    tasks: "Tasks:",
    unconditional: "Unconditional",
    conditional: "Conditional",
};

impl PopupLabels {
    /// Captions for `locale`.
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Ru => RU_LABELS,
            Locale::En => EN_LABELS,
        }
    }

    /// Block type label; empty when not blocked.
    pub fn block_mode(&self, mode: BlockMode) -> &'static str {
        match mode {
            BlockMode::Unconditional => self.unconditional,
            BlockMode::Conditional => self.conditional,
            BlockMode::NoBlock => "",
        }
    }
}

/// A task link shown in the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLink {
    /// Task id
    pub id: u64,
    /// Journal URL
    pub url: String,
}

/// Content of the sector info popup.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    /// Owning base station
    pub base_station: String,
    /// Localized block type
    pub block_label: String,
    /// Blocked services, conditional first
    pub blocked_services: Vec<String>,
    /// Attached tasks
    pub tasks: Vec<TaskLink>,
    /// Captions
    pub labels: PopupLabels,
}

impl PopupContent {
    /// Builds the popup for `sector`.
    ///
    /// The block label follows the reported block type, or the block state
    /// derived from the service lists when none is reported.
    pub fn from_sector(sector: &Sector, settings: &PopupSettings) -> Self {
        let labels = PopupLabels::for_locale(settings.locale);
        let mode = sector.blocked_type.unwrap_or_else(|| sector.block_mode());

        let blocked_services = sector
            .blocked
            .conditional
            .iter()
            .chain(sector.blocked.unconditional.iter())
            .flatten()
            .cloned()
            .collect();

        let origin = settings.tasks_base_url.trim_end_matches('/');
        let tasks = sector
            .tasks
            .iter()
            .map(|task| TaskLink {
                id: task.id,
                url: format!("{}/journal/tasks/{}", origin, task.id),
            })
            .collect();

        Self {
            base_station: sector.base_station_name.clone().unwrap_or_default(),
            block_label: labels.block_mode(mode).to_string(),
            blocked_services,
            tasks,
            labels,
        }
    }

    /// HTML body of the popup.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "{} {}<br/>{} {}<br/>{} {}<br/>{}",
            self.labels.base_stations,
            escape(&self.base_station),
            self.labels.block_type,
            escape(&self.block_label),
            self.labels.blocked_services,
            escape(&self.blocked_services.join(", ")),
            self.labels.tasks,
        );
        for task in &self.tasks {
            let _ = write!(html, " <a href=\"{}\">{}</a>", escape(&task.url), task.id);
        }
        html
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// What a sector-info answer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupOutcome {
    /// A popup was opened
    Opened,
    /// The sector is within the noise distance of the pointer
    Suppressed,
}

/// Click and hover handling plus the single live popup.
#[derive(Debug)]
pub struct PopupController {
    settings: PopupSettings,
    noise_m: f64,
    hover_debounce: Duration,
    pending_hover: Option<(LatLng, Instant)>,
    open_at: Option<LatLng>,
}

impl PopupController {
    /// Creates a controller.
    pub fn new(settings: PopupSettings, noise_m: f64, hover_debounce: Duration) -> Self {
        Self {
            settings,
            noise_m,
            hover_debounce,
            pending_hover: None,
            open_at: None,
        }
    }

    /// Point query for a click, unless drawing or no technology is active.
    pub fn on_click(
        &self,
        point: LatLng,
        drawing: bool,
        technologies: &[Technology],
    ) -> Option<MapAction> {
        if drawing || technologies.is_empty() {
            tracing::debug!("Click at {} suppressed", point);
            return None;
        }
        Some(MapAction::LoadSectorsByPoint {
            point,
            technologies: technologies.to_vec(),
        })
    }

    /// Pointer moved; restarts the hover window.
    pub fn on_pointer_move(&mut self, point: LatLng, now: Instant) {
        self.pending_hover = Some((point, now + self.hover_debounce));
    }

    /// When the pending hover fires.
    pub fn hover_deadline(&self) -> Option<Instant> {
        self.pending_hover.map(|(_, deadline)| deadline)
    }

    /// Fires a due hover: removes the live popup, then requests info for
    /// the hover point unless drawing or no technology is active.
    pub fn fire_hover(
        &mut self,
        map: &mut dyn Basemap,
        drawing: bool,
        technologies: &[Technology],
        now: Instant,
    ) -> Option<MapAction> {
        let (point, deadline) = self.pending_hover?;
        if deadline > now {
            return None;
        }
        self.pending_hover = None;
        self.close(map);

        if drawing || technologies.is_empty() {
            return None;
        }
        Some(MapAction::RequestSectorInfo { point })
    }

    /// Sector details arrived for a hover point.
    pub fn on_sector_info(&mut self, map: &mut dyn Basemap, info: &SectorInfo) -> PopupOutcome {
        let distance = info.sector.position().distance_to(&info.latlng);
        if distance < self.noise_m {
            tracing::trace!(
                "Sector {} is {:.1} m from the pointer, no popup",
                info.sector.cell_name,
                distance
            );
            return PopupOutcome::Suppressed;
        }

        self.close(map);
        let content = PopupContent::from_sector(&info.sector, &self.settings);
        map.open_popup(info.latlng, &content);
        self.open_at = Some(info.latlng);
        tracing::debug!("Popup for {} at {}", info.sector.cell_name, info.latlng);
        PopupOutcome::Opened
    }

    /// Removes the live popup, if any.
    pub fn close(&mut self, map: &mut dyn Basemap) {
        if self.open_at.take().is_some() {
            map.close_popup();
        }
    }

    /// True while a popup is open.
    pub fn is_open(&self) -> bool {
        self.open_at.is_some()
    }

    /// Drops a pending hover.
    pub fn cancel_hover(&mut self) {
        self.pending_hover = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectormap_core::{BlockedServices, TaskRef};

    fn blocked_sector() -> Sector {
        let mut sector = Sector::new("ALM-1", LatLng::new(50.0, 60.0), 90.0, Technology::Gsm)
            .with_blocked(BlockedServices {
                unconditional: Some(vec!["voice".into()]),
                conditional: Some(vec!["sms".into(), "data".into()]),
            });
        sector.base_station_name = Some("ALM <north>".into());
        sector.tasks = vec![TaskRef { id: 7 }, TaskRef { id: 12 }];
        sector
    }

    #[test]
    fn test_content_lists_conditional_first() {
        let settings = PopupSettings {
            locale: Locale::Ru,
            tasks_base_url: "https://noc.example.kz/".into(),
        };
        let content = PopupContent::from_sector(&blocked_sector(), &settings);
        assert_eq!(content.blocked_services, vec!["sms", "data", "voice"]);
        assert_eq!(content.block_label, "Безусловная");
        assert_eq!(content.tasks[0].url, "https://noc.example.kz/journal/tasks/7");
    }

    #[test]
    fn test_reported_block_type_wins() {
        let mut sector = blocked_sector();
        sector.blocked_type = Some(BlockMode::Conditional);
        let content = PopupContent::from_sector(&sector, &PopupSettings::default());
        assert_eq!(content.block_label, "Условная");

        sector.blocked = BlockedServices::default();
        sector.blocked_type = None;
        let content = PopupContent::from_sector(&sector, &PopupSettings::default());
        assert_eq!(content.block_label, "");
    }

    #[test]
    fn test_html_escapes_and_links() {
        let settings = PopupSettings {
            locale: Locale::En,
            tasks_base_url: "https://noc".into(),
        };
        let html = PopupContent::from_sector(&blocked_sector(), &settings).to_html();
        assert!(html.starts_with("Base stations: ALM &lt;north&gt;<br/>"));
        assert!(html.contains("Block type: Unconditional"));
        assert!(html.contains("Blocked services: sms, data, voice"));
        assert!(html.ends_with(
            "Tasks: <a href=\"https://noc/journal/tasks/7\">7</a> <a href=\"https://noc/journal/tasks/12\">12</a>"
        ));
    }

    #[test]
    fn test_click_suppression() {
        let controller =
            PopupController::new(PopupSettings::default(), 13.6, Duration::from_millis(500));
        let point = LatLng::new(43.0, 76.0);
        assert!(controller.on_click(point, true, &[Technology::Gsm]).is_none());
        assert!(controller.on_click(point, false, &[]).is_none());
        assert_eq!(
            controller.on_click(point, false, &[Technology::Gsm]),
            Some(MapAction::LoadSectorsByPoint {
                point,
                technologies: vec![Technology::Gsm]
            })
        );
    }

    #[test]
    fn test_hover_restarts_window() {
        let t0 = Instant::now();
        let mut controller =
            PopupController::new(PopupSettings::default(), 13.6, Duration::from_millis(500));
        controller.on_pointer_move(LatLng::new(1.0, 1.0), t0);
        controller.on_pointer_move(LatLng::new(2.0, 2.0), t0 + Duration::from_millis(300));
        assert_eq!(
            controller.hover_deadline(),
            Some(t0 + Duration::from_millis(800))
        );
    }
}
