//! Configuration for the sector map
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats.
//!
//! Configuration is organized into logical sections:
//! - Default view (center and zoom used when nothing is persisted)
//! - Tile sources (online and offline URLs)
//! - Interaction thresholds and debounce windows
//! - Popup content (locale, task link base)
//! - Overlay rendering (projection zoom, sprite scales, frame interval)

use sectormap_core::LatLng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{SettingsError, SettingsResult};

/// View shown when no persisted viewport exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Map center
    pub center: LatLng,
    /// Zoom level
    pub zoom: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            center: LatLng::new(48.0, 68.0),
            zoom: 5.0,
        }
    }
}

/// Basemap tile sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSettings {
    /// Tile URL template used online
    pub online_url: String,
    /// Tile URL template used in offline mode
    pub offline_url: String,
    /// Highest zoom the tiles support
    pub max_zoom: f64,
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            online_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            offline_url: "http://localhost:8080/tiles/{z}/{x}/{y}.png".to_string(),
            max_zoom: 18.0,
        }
    }
}

impl TileSettings {
    /// URL template for the given mode
    pub fn url_for(&self, offline: bool) -> &str {
        if offline {
            &self.offline_url
        } else {
            &self.online_url
        }
    }
}

/// Interaction thresholds and debounce windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSettings {
    /// Lowest zoom at which bounds queries are sent
    pub min_query_zoom: f64,
    /// Delay before a draw/edit/delete stop returns the map to idle
    pub draw_debounce_ms: u64,
    /// Pointer-move debounce before a hover request
    pub hover_debounce_ms: u64,
    /// Hover results closer than this (meters) open no popup
    pub popup_noise_m: f64,
    /// Max zoom when fitting areas or search results
    pub fit_max_zoom: f64,
    /// Zoom used when focusing a single sector
    pub focus_zoom: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            min_query_zoom: 12.0,
            draw_debounce_ms: 10,
            hover_debounce_ms: 500,
            popup_noise_m: 13.6,
            fit_max_zoom: 16.0,
            focus_zoom: 18.0,
        }
    }
}

impl InteractionSettings {
    /// Draw-stop debounce as a duration
    pub fn draw_debounce(&self) -> Duration {
        Duration::from_millis(self.draw_debounce_ms)
    }

    /// Hover debounce as a duration
    pub fn hover_debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }
}

/// Popup language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Russian
    #[default]
    Ru,
    /// English
    En,
}

/// Popup content settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PopupSettings {
    /// Label language
    pub locale: Locale,
    /// Origin prepended to task links (e.g. `https://noc.example.kz`)
    pub tasks_base_url: String,
}

/// Overlay rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    /// Zoom at which sprite positions are projected
    pub projection_zoom: f64,
    /// Fixed scale of sector and base-station sprites
    pub sector_scale: f32,
    /// Upper bound of the search-pin scale
    pub max_pin_scale: f64,
    /// Rescale loop period
    pub frame_interval_ms: u64,
    /// PNG used for search pins instead of the generated marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_pin_icon: Option<PathBuf>,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            projection_zoom: 9.0,
            sector_scale: 0.04,
            max_pin_scale: 1.0 / 32.0,
            frame_interval_ms: 16,
            search_pin_icon: None,
        }
    }
}

impl OverlaySettings {
    /// Frame interval as a duration
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Complete map configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MapConfig {
    /// Fallback view
    #[serde(default)]
    pub default_view: ViewSettings,
    /// Tile sources
    #[serde(default)]
    pub tiles: TileSettings,
    /// Interaction thresholds
    #[serde(default)]
    pub interaction: InteractionSettings,
    /// Popup content
    #[serde(default)]
    pub popup: PopupSettings,
    /// Overlay rendering
    #[serde(default)]
    pub overlay: OverlaySettings,
}

impl MapConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(SettingsError::LoadError(
                "Config file must be .json or .toml".to_string(),
            ));
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(SettingsError::SaveError(
                "Config file must be .json or .toml".to_string(),
            ));
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let max_zoom = self.tiles.max_zoom;
        if !(0.0..=24.0).contains(&max_zoom) {
            return Err(invalid("tiles.max_zoom", "must be between 0 and 24"));
        }

        let view = &self.default_view;
        if !view.center.is_finite() || view.center.lat.abs() > 90.0 {
            return Err(invalid("default_view.center", "must be a valid coordinate"));
        }
        if !(0.0..=max_zoom).contains(&view.zoom) {
            return Err(invalid("default_view.zoom", "must be within the tile zoom range"));
        }

        let interaction = &self.interaction;
        if !(0.0..=max_zoom).contains(&interaction.min_query_zoom) {
            return Err(invalid(
                "interaction.min_query_zoom",
                "must be within the tile zoom range",
            ));
        }
        if !interaction.popup_noise_m.is_finite() || interaction.popup_noise_m < 0.0 {
            return Err(invalid("interaction.popup_noise_m", "must be >= 0"));
        }
        if interaction.fit_max_zoom > max_zoom || interaction.focus_zoom > max_zoom {
            return Err(invalid(
                "interaction.fit_max_zoom",
                "fit and focus zoom cannot exceed tiles.max_zoom",
            ));
        }

        let overlay = &self.overlay;
        if overlay.sector_scale <= 0.0 {
            return Err(invalid("overlay.sector_scale", "must be > 0"));
        }
        if overlay.max_pin_scale <= 0.0 {
            return Err(invalid("overlay.max_pin_scale", "must be > 0"));
        }
        if overlay.frame_interval_ms == 0 {
            return Err(invalid("overlay.frame_interval_ms", "must be > 0"));
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> SettingsError {
    SettingsError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interaction.min_query_zoom, 12.0);
        assert_eq!(config.interaction.draw_debounce(), Duration::from_millis(10));
        assert_eq!(config.interaction.hover_debounce(), Duration::from_millis(500));
        assert_eq!(config.overlay.max_pin_scale, 0.03125);
    }

    #[test]
    fn test_rejects_zero_frame_interval() {
        let mut config = MapConfig::default();
        config.overlay.frame_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: MapConfig = toml::from_str(
            r#"
            [popup]
            locale = "en"
            tasks_base_url = "https://noc.example.kz"
            "#,
        )
        .unwrap();
        assert_eq!(config.popup.locale, Locale::En);
        assert_eq!(config.default_view, ViewSettings::default());
    }

    #[test]
    fn test_tile_url_for_mode() {
        let tiles = TileSettings::default();
        assert!(tiles.url_for(false).contains("openstreetmap"));
        assert!(tiles.url_for(true).contains("localhost"));
    }
}
