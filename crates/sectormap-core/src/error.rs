//! Error handling for SectorMap
//!
//! Provides error types for each layer of the sector map:
//! - Geometry errors (coordinates, rings, drawn layer payloads)
//! - Overlay errors (texture generation, asset loading, render backend)
//! - Store errors (feeds closed underneath a running component)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Raised when a coordinate, ring or drawn-layer payload cannot be turned
/// into a typed geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A coordinate is NaN or infinite
    #[error("Invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate {
        /// The latitude component.
        lat: f64,
        /// The longitude component.
        lng: f64,
    },

    /// A polygon or rectangle ring has no points
    #[error("Ring is empty")]
    EmptyRing,

    /// A polygon or rectangle ring encloses no area
    #[error("Ring has {points} distinct points, at least 3 are needed")]
    DegenerateRing {
        /// Distinct points in the ring.
        points: usize,
    },

    /// A circle radius is negative or not finite
    #[error("Invalid circle radius: {radius}")]
    InvalidRadius {
        /// The offending radius in meters.
        radius: f64,
    },

    /// The drawing toolkit reported a layer type we do not handle
    #[error("Unsupported layer type: {layer_type}")]
    UnsupportedLayerType {
        /// The layer type string reported by the toolkit.
        layer_type: String,
    },

    /// A drawn layer payload is missing a required field
    #[error("Malformed layer payload: {reason}")]
    MalformedLayer {
        /// What was missing or wrong.
        reason: String,
    },
}

/// Overlay error type
///
/// Represents failures of the sprite overlay: texture generation, asset
/// loading and the render backend.
#[derive(Error, Debug, Clone)]
pub enum OverlayError {
    /// A texture could not be rasterized
    #[error("Texture generation failed for {variant}: {reason}")]
    TextureGeneration {
        /// The variant being generated.
        variant: String,
        /// Why generation failed.
        reason: String,
    },

    /// An image asset could not be loaded
    #[error("Failed to load asset '{path}': {reason}")]
    AssetLoad {
        /// The asset path.
        path: String,
        /// Why loading failed.
        reason: String,
    },

    /// The overlay was used before its render context was initialized
    #[error("Overlay render context is not initialized")]
    NotInitialized,

    /// A single marker could not be placed
    #[error("Marker '{cell_name}' skipped: {reason}")]
    Marker {
        /// Cell name of the sector.
        cell_name: String,
        /// Why the marker was skipped.
        reason: String,
    },

    /// The render backend failed to draw a frame
    #[error("Render backend error: {message}")]
    Backend {
        /// The error message.
        message: String,
    },
}

/// Store error type
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// A store feed was closed while the component was still running
    #[error("Store feed '{feed}' closed")]
    FeedClosed {
        /// Name of the feed.
        feed: String,
    },
}

/// Main error type for SectorMap
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Overlay error
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an overlay error
    pub fn is_overlay_error(&self) -> bool {
        matches!(self, Error::Overlay(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
