use serde::{Deserialize, Serialize};

use crate::consts::VIEWPORT_MIN_SIZE;

/// Construction-time settings for a [`RenderingEngine`](super::RenderingEngine).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine id. A random UUID is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Render every viewport through its own pipeline instead of the shared
    /// buffer. Fixed for the lifetime of the engine.
    #[serde(default)]
    pub software_fallback: bool,
    /// Overrides the host's device-pixel ratio when set.
    #[serde(default)]
    pub device_pixel_ratio: Option<f64>,
    /// Viewports smaller than this in either device-pixel dimension are
    /// skipped when rendering.
    #[serde(default = "default_min_viewport_size")]
    pub min_viewport_size: u32,
}

fn default_min_viewport_size() -> u32 {
    VIEWPORT_MIN_SIZE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            id: None,
            software_fallback: false,
            device_pixel_ratio: None,
            min_viewport_size: VIEWPORT_MIN_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn software() -> Self {
        Self {
            software_fallback: true,
            ..Self::default()
        }
    }
}
