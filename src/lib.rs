//! RFox Snip
//!
//! Drag out a rectangle over rendered markup and rasterize exactly the
//! pixels underneath it.
//!
//! # Overview
//!
//! - **Geometry**: two pointer samples become a normalized rectangle
//! - **Activation gate**: decides whether a pointer-down lands on a selection surface
//! - **Selection machine**: `Idle` / `Dragging` gesture lifecycle
//! - **Capture pipeline**: scroll-aware rasterization on a worker thread
//!
//! # Example
//!
//! ```no_run
//! use rfsnip::{InputEvent, PointerPoint, SnipConfig, Snipper};
//! use rfsnip::platform::HeadlessPlatform;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SnipConfig {
//!     content: r#"<div id="overlay-page1"><p>Hello</p></div>"#.to_string(),
//!     ..Default::default()
//! };
//! let platform = HeadlessPlatform::default();
//! let mut snipper = Snipper::with_paint_rasterizer(config, &platform)?;
//!
//! let start = PointerPoint::new(10.0, 10.0);
//! let target = snipper.target_at(start);
//! let mut events = snipper.attach();
//! events.dispatch(InputEvent::PointerDown { point: start, target });
//! events.dispatch(InputEvent::PointerMove { point: PointerPoint::new(120.0, 40.0) });
//! if let Some(pending) = events.dispatch(InputEvent::PointerUp { point: PointerPoint::new(120.0, 40.0) }) {
//!     let capture = pending.await?;
//!     println!("{}", capture.image.to_data_uri());
//! }
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::collections::HashSet;

pub mod error;
pub use error::{Error, Result};

pub mod activation;
pub mod capture;
pub mod coalesce;
pub mod geometry;
pub mod platform;
pub mod rendering;
pub mod selection;
pub mod snipper;

pub use activation::{ActivationGate, ActivationTarget, HoverAffordance};
pub use capture::{
    CapturePipeline, CaptureRequest, CaptureResult, EncodedImage, FailureHook, RasterRegion,
    Rasterizer,
};
pub use geometry::{normalize_rect, PointerPoint, SelectionRect};
pub use rendering::document::NodeId;
pub use rendering::ContentHost;
pub use selection::{Finalization, GestureState, SelectionMachine};
pub use snipper::{Attachment, InputEvent, PendingCapture, Snipper};

/// Configuration for a snipping session
///
/// By default activation regions are elements whose id starts with
/// `overlay`, and `span` elements are annotated text that gets a pointer
/// cursor.
///
/// # Examples
///
/// ```
/// let cfg = rfsnip::SnipConfig::default();
/// assert_eq!(cfg.activation_prefix, "overlay");
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnipConfig {
    /// Raw markup to render
    pub content: String,
    /// Content scale factor applied by the renderer
    pub scale: f32,
    /// Element ids the renderer paints highlighted
    pub highlight_ids: HashSet<String>,
    /// Visible window in CSS pixels
    pub viewport: Viewport,
    /// Output pixels per CSS pixel
    pub device_pixel_ratio: f32,
    /// Id prefix marking activation regions
    pub activation_prefix: String,
    /// Tag name of annotated spans
    pub annotated_tag: String,
    /// Apply pointer moves once per frame instead of per event
    pub coalesce_moves: bool,
}

impl Default for SnipConfig {
    fn default() -> Self {
        Self {
            content: String::new(),
            scale: 1.0,
            highlight_ids: HashSet::new(),
            viewport: Viewport::default(),
            device_pixel_ratio: 1.0,
            activation_prefix: "overlay".to_string(),
            annotated_tag: "span".to_string(),
            coalesce_moves: true,
        }
    }
}

impl SnipConfig {
    /// Reject values no renderer can honor
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::ConfigError(format!("scale must be positive, got {}", self.scale)));
        }
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            return Err(Error::ConfigError(format!(
                "device_pixel_ratio must be positive, got {}",
                self.device_pixel_ratio
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError("viewport must not be empty".into()));
        }
        if self.activation_prefix.is_empty() {
            return Err(Error::ConfigError("activation_prefix must not be empty".into()));
        }
        Ok(())
    }

    /// Load a config from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: SnipConfig = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("invalid config JSON: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnipConfig::default();
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.viewport.height, 720);
        assert_eq!(config.scale, 1.0);
        assert!(config.coalesce_moves);
    }

    #[test]
    fn test_validate_rejects_bad_scale() {
        for scale in [0.0, -1.0, f32::NAN] {
            let cfg = SnipConfig {
                scale,
                ..Default::default()
            };
            assert!(matches!(cfg.validate(), Err(Error::ConfigError(_))));
        }
        let cfg = SnipConfig {
            viewport: Viewport { width: 0, height: 10 },
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_json_keeps_defaults() {
        let cfg = SnipConfig::from_json(
            r#"{"content": "<p>x</p>", "scale": 1.5, "highlight_ids": ["a", "b"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.scale, 1.5);
        assert_eq!(cfg.highlight_ids.len(), 2);
        assert_eq!(cfg.activation_prefix, "overlay");
        assert_eq!(cfg.viewport, Viewport::default());

        assert!(SnipConfig::from_json(r#"{"scale": 0}"#).is_err());
        assert!(SnipConfig::from_json("not json").is_err());
    }
}
