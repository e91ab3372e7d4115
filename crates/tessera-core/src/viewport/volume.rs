use crate::error::{Result, TesseraError};

use super::{Camera, OrientationAxis, RenderTarget, RenderableViewport, ViewportKind};

/// Volumetric slice viewport, orthographic or perspective. Drawn only
/// through the shared buffer.
#[derive(Clone, Debug)]
pub struct VolumeViewport {
    kind: ViewportKind,
    orientation: Option<OrientationAxis>,
    camera: Camera,
}

impl VolumeViewport {
    pub fn new(kind: ViewportKind, orientation: Option<OrientationAxis>) -> Self {
        Self {
            kind,
            orientation,
            camera: Camera::default_for(kind, orientation),
        }
    }

    pub fn orientation(&self) -> Option<OrientationAxis> {
        self.orientation
    }
}

impl RenderableViewport for VolumeViewport {
    fn render(&mut self, _target: RenderTarget<'_>) -> Result<()> {
        Err(TesseraError::UnsupportedViewportType(self.kind))
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn camera(&self) -> Camera {
        self.camera
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn reset_camera(&mut self) {
        self.camera = Camera::default_for(self.kind, self.orientation);
    }
}

/// Free 3-D volume viewport.
#[derive(Clone, Debug)]
pub struct VolumeViewport3d {
    camera: Camera,
}

impl Default for VolumeViewport3d {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeViewport3d {
    pub fn new() -> Self {
        Self {
            camera: Camera::default_for(ViewportKind::Volume3d, None),
        }
    }
}

impl RenderableViewport for VolumeViewport3d {
    fn render(&mut self, _target: RenderTarget<'_>) -> Result<()> {
        Err(TesseraError::UnsupportedViewportType(ViewportKind::Volume3d))
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn camera(&self) -> Camera {
        self.camera
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn reset_camera(&mut self) {
        self.camera = Camera::default_for(ViewportKind::Volume3d, None);
    }
}
