use crate::engine::composite::{fill_with_background, paint_windowed_gray};
use crate::error::Result;

use super::{Camera, RenderTarget, RenderableViewport, ViewportKind};

/// Raster-stack viewport. Renders its current image itself, so it is the
/// only kind that works without the shared buffer.
#[derive(Clone, Debug)]
pub struct StackViewport {
    camera: Camera,
    size: (u32, u32),
}

impl Default for StackViewport {
    fn default() -> Self {
        Self::new()
    }
}

impl StackViewport {
    pub fn new() -> Self {
        Self {
            camera: Camera::default_for(ViewportKind::Stack, None),
            size: (0, 0),
        }
    }

    /// Last display size seen by [`RenderableViewport::resize`].
    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl RenderableViewport for StackViewport {
    fn render(&mut self, target: RenderTarget<'_>) -> Result<()> {
        match target.image {
            Some(image) => paint_windowed_gray(image, target.surface.image_mut()),
            None => fill_with_background(target.surface.image_mut(), Some(target.background)),
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn reset_camera(&mut self) {
        self.camera = Camera::default_for(ViewportKind::Stack, None);
    }
}
