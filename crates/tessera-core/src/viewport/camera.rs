use serde::{Deserialize, Serialize};

use super::{OrientationAxis, ViewportKind};

/// View state of a viewport: in-plane pan and zoom plus the view direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    /// In-plane offset in display pixels.
    pub pan: [f64; 2],
    pub zoom: f64,
    pub view_plane_normal: [f64; 3],
    pub view_up: [f64; 3],
    pub parallel_projection: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::oriented(OrientationAxis::Axial, true)
    }
}

impl Camera {
    /// Unpanned, unzoomed camera looking along `axis`.
    pub fn oriented(axis: OrientationAxis, parallel_projection: bool) -> Self {
        let (view_plane_normal, view_up) = match axis {
            OrientationAxis::Axial | OrientationAxis::Acquisition => {
                ([0.0, 0.0, -1.0], [0.0, -1.0, 0.0])
            }
            OrientationAxis::Sagittal => ([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            OrientationAxis::Coronal => ([0.0, -1.0, 0.0], [0.0, 0.0, 1.0]),
        };
        Self {
            pan: [0.0, 0.0],
            zoom: 1.0,
            view_plane_normal,
            view_up,
            parallel_projection,
        }
    }

    /// Default camera for a viewport kind. Only the perspective and 3-D
    /// kinds use a perspective projection.
    pub fn default_for(kind: ViewportKind, orientation: Option<OrientationAxis>) -> Self {
        let parallel = matches!(kind, ViewportKind::Stack | ViewportKind::Orthographic);
        let axis = orientation.unwrap_or(match kind {
            ViewportKind::Volume3d => OrientationAxis::Coronal,
            _ => OrientationAxis::Axial,
        });
        Self::oriented(axis, parallel)
    }
}
