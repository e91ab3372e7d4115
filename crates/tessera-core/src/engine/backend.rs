use std::cell::RefCell;
use std::rc::Rc;

use image::{Rgba, RgbaImage};
use tracing::debug;

use super::composite::background_rgba;
use super::layout::NormalizedRect;

/// Per-viewport renderer held by a render backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Renderer {
    id: String,
    viewport: NormalizedRect,
    background: [f32; 3],
    draw: bool,
}

impl Renderer {
    pub fn new(id: impl Into<String>, viewport: NormalizedRect, background: [f32; 3]) -> Self {
        Self {
            id: id.into(),
            viewport,
            background,
            draw: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn viewport(&self) -> NormalizedRect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: NormalizedRect) {
        self.viewport = viewport;
    }

    pub fn background(&self) -> [f32; 3] {
        self.background
    }

    pub fn draw_enabled(&self) -> bool {
        self.draw
    }

    pub fn set_draw(&mut self, draw: bool) {
        self.draw = draw;
    }
}

/// External rendering library that draws every viewport into one shared
/// buffer in a single draw call.
pub trait RenderBackend {
    fn add_renderer(&mut self, id: &str, viewport: NormalizedRect, background: [f32; 3]);

    fn remove_renderer(&mut self, id: &str);

    fn renderer(&self, id: &str) -> Option<&Renderer>;

    fn renderer_mut(&mut self, id: &str) -> Option<&mut Renderer>;

    fn renderer_ids(&self) -> Vec<String>;

    /// Resize the shared buffer (device pixels).
    fn resize(&mut self, width: u32, height: u32);

    /// Draw every renderer whose draw flag is set.
    fn render(&mut self);

    fn drawing_surface(&self) -> &RgbaImage;

    /// Free the shared buffer. The backend is unusable afterwards.
    fn release(&mut self);
}

#[derive(Debug, Default)]
struct DrawRecord {
    draw_calls: usize,
    last_drawn: Vec<String>,
}

/// Shared view of a [`HeadlessBackend`]'s draw history.
#[derive(Clone, Debug, Default)]
pub struct DrawLog {
    inner: Rc<RefCell<DrawRecord>>,
}

impl DrawLog {
    pub fn draw_calls(&self) -> usize {
        self.inner.borrow().draw_calls
    }

    /// Renderer ids drawn by the most recent draw call.
    pub fn last_drawn(&self) -> Vec<String> {
        self.inner.borrow().last_drawn.clone()
    }
}

/// CPU render backend without a display. Each enabled renderer fills its
/// rectangle of the shared buffer with its background color.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    surface: RgbaImage,
    renderers: Vec<Renderer>,
    released: bool,
    log: DrawLog,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_log(&self) -> DrawLog {
        self.log.clone()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Pixel bounds `(left, top, right, bottom)` of a normalized rect. The
    /// normalized y axis grows upward, pixel rows grow downward.
    fn pixel_bounds(&self, rect: NormalizedRect) -> (u32, u32, u32, u32) {
        let (w, h) = (self.surface.width() as f64, self.surface.height() as f64);
        let px = |v: f64, extent: f64| (v * extent).round().clamp(0.0, extent) as u32;
        (
            px(rect.x0, w),
            px(1.0 - rect.y1, h),
            px(rect.x1, w),
            px(1.0 - rect.y0, h),
        )
    }
}

impl RenderBackend for HeadlessBackend {
    fn add_renderer(&mut self, id: &str, viewport: NormalizedRect, background: [f32; 3]) {
        self.remove_renderer(id);
        self.renderers.push(Renderer::new(id, viewport, background));
    }

    fn remove_renderer(&mut self, id: &str) {
        self.renderers.retain(|r| r.id != id);
    }

    fn renderer(&self, id: &str) -> Option<&Renderer> {
        self.renderers.iter().find(|r| r.id == id)
    }

    fn renderer_mut(&mut self, id: &str) -> Option<&mut Renderer> {
        self.renderers.iter_mut().find(|r| r.id == id)
    }

    fn renderer_ids(&self) -> Vec<String> {
        self.renderers.iter().map(|r| r.id.clone()).collect()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.surface.dimensions() != (width, height) {
            debug!(width, height, "Resizing headless drawing surface");
            self.surface = RgbaImage::new(width, height);
        }
    }

    fn render(&mut self) {
        let mut drawn = Vec::new();
        for renderer in self.renderers.iter().filter(|r| r.draw) {
            let (left, top, right, bottom) = self.pixel_bounds(renderer.viewport);
            let color: Rgba<u8> = background_rgba(renderer.background);
            for y in top..bottom {
                for x in left..right {
                    self.surface.put_pixel(x, y, color);
                }
            }
            drawn.push(renderer.id.clone());
        }

        let mut record = self.log.inner.borrow_mut();
        record.draw_calls += 1;
        record.last_drawn = drawn;
    }

    fn drawing_surface(&self) -> &RgbaImage {
        &self.surface
    }

    fn release(&mut self) {
        self.renderers.clear();
        self.surface = RgbaImage::new(0, 0);
        self.released = true;
    }
}
