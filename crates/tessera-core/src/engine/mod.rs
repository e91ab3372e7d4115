//! Offscreen-compositing render engine.
//!
//! GPU-driven viewports are packed side by side into one shared buffer that
//! the render backend draws in a single call per frame; each viewport's slice
//! is then copied onto its own surface. Under software fallback every
//! viewport renders through its own pipeline instead.

pub mod backend;
pub mod composite;
pub mod config;
pub mod events;
pub mod host;
pub mod layout;
pub mod scheduler;

use image::RgbaImage;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::consts::{ENABLED_TAB_INDEX, ENGINE_UID_ATTRIBUTE, VIEWPORT_UID_ATTRIBUTE};
use crate::error::{Result, TesseraError};
use crate::segmentation::SegmentationWorkspace;
use crate::viewport::{DefaultOptions, Element, Viewport, ViewportInput, ViewportKind};

pub use backend::{DrawLog, HeadlessBackend, RenderBackend, Renderer};
pub use composite::fill_with_background;
pub use config::EngineConfig;
pub use events::{EngineEvent, EventLog, EventSink, NullSink};
pub use host::{FrameHandle, FrameHost, ManualFrameHost};
pub use layout::{compute_layout, device_pixels, NormalizedRect, OffscreenLayout, Placement};
pub use scheduler::{FrameState, RenderScheduler};

use composite::blit_region;

/// Whether viewports of `kind` render through their own pipeline. Only the
/// raster stack has one, and only under software fallback.
pub fn viewport_kind_uses_custom_pipeline(kind: ViewportKind, software_fallback: bool) -> bool {
    software_fallback && kind == ViewportKind::Stack
}

/// Per-frame settings shared by every viewport composite.
struct FrameContext<'a> {
    engine_id: &'a str,
    software_fallback: bool,
    min_size: u32,
}

pub struct RenderingEngine {
    id: String,
    config: EngineConfig,
    software_fallback: bool,
    backend: Option<Box<dyn RenderBackend>>,
    host: Box<dyn FrameHost>,
    events: Box<dyn EventSink>,
    /// Registry, in enable order.
    viewports: Vec<Viewport>,
    scheduler: RenderScheduler,
    offscreen_size: (u32, u32),
    workspace: SegmentationWorkspace,
    destroyed: bool,
}

impl RenderingEngine {
    /// Create an engine. A render backend is required unless the config
    /// selects software fallback, in which case any backend given is unused.
    pub fn new(
        config: EngineConfig,
        backend: Option<Box<dyn RenderBackend>>,
        host: Box<dyn FrameHost>,
        events: Box<dyn EventSink>,
    ) -> Result<Self> {
        let software_fallback = config.software_fallback;
        let backend = if software_fallback {
            if backend.is_some() {
                debug!("Software fallback selected, render backend left unused");
            }
            None
        } else {
            Some(backend.ok_or(TesseraError::BackendRequired)?)
        };

        let id = config
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info!(engine_id = %id, software_fallback, "Rendering engine created");

        Ok(Self {
            id,
            config,
            software_fallback,
            backend,
            host,
            events,
            viewports: Vec::new(),
            scheduler: RenderScheduler::new(),
            offscreen_size: (0, 0),
            workspace: SegmentationWorkspace::new(),
            destroyed: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn uses_software_fallback(&self) -> bool {
        self.software_fallback
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Shared buffer size in device pixels, (width, height).
    pub fn shared_buffer_size(&self) -> (u32, u32) {
        self.offscreen_size
    }

    pub fn backend(&self) -> Option<&dyn RenderBackend> {
        self.backend.as_deref()
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// Configured override, else the host's ratio.
    pub fn device_pixel_ratio(&self) -> f64 {
        self.config
            .device_pixel_ratio
            .unwrap_or_else(|| self.host.device_pixel_ratio())
    }

    fn throw_if_destroyed(&self) -> Result<()> {
        if self.destroyed {
            return Err(TesseraError::Destroyed);
        }
        Ok(())
    }

    fn position(&self, viewport_id: &str) -> Option<usize> {
        self.viewports.iter().position(|vp| vp.id() == viewport_id)
    }

    fn is_gpu_driven(&self, kind: ViewportKind) -> bool {
        !self.software_fallback && !viewport_kind_uses_custom_pipeline(kind, self.software_fallback)
    }

    // -- Registry ---------------------------------------------------------

    pub fn get_viewport(&self, viewport_id: &str) -> Result<Option<&Viewport>> {
        self.throw_if_destroyed()?;
        Ok(self.viewports.iter().find(|vp| vp.id() == viewport_id))
    }

    pub fn get_viewport_mut(&mut self, viewport_id: &str) -> Result<Option<&mut Viewport>> {
        self.throw_if_destroyed()?;
        Ok(self.viewports.iter_mut().find(|vp| vp.id() == viewport_id))
    }

    /// All viewports in registry order.
    pub fn get_viewports(&self) -> Result<&[Viewport]> {
        self.throw_if_destroyed()?;
        Ok(&self.viewports)
    }

    pub fn get_stack_viewports(&self) -> Result<Vec<&Viewport>> {
        self.throw_if_destroyed()?;
        Ok(self
            .viewports
            .iter()
            .filter(|vp| vp.kind() == ViewportKind::Stack)
            .collect())
    }

    pub fn get_volume_viewports(&self) -> Result<Vec<&Viewport>> {
        self.throw_if_destroyed()?;
        Ok(self
            .viewports
            .iter()
            .filter(|vp| vp.kind().is_volume())
            .collect())
    }

    // -- Lifecycle --------------------------------------------------------

    /// Enable a viewport, replacing any existing viewport with the same id.
    pub fn enable_element(&mut self, input: ViewportInput) -> Result<()> {
        self.throw_if_destroyed()?;
        let ViewportInput {
            viewport_id,
            kind,
            element,
            default_options,
            suppress_events,
        } = input;
        let element = element.ok_or(TesseraError::MissingElement)?;
        let options = default_options.normalized(kind);

        if self.position(&viewport_id).is_some() {
            self.disable_element(&viewport_id)?;
        }

        if self.is_gpu_driven(kind) {
            let viewport = self.build_viewport(viewport_id.clone(), kind, element, options, suppress_events, false);
            self.register_gpu_viewport(viewport)?;
            self.repack();
        } else {
            self.add_custom_viewport(viewport_id.clone(), kind, element, options, suppress_events)?;
        }

        self.announce_enabled(&viewport_id);
        info!(viewport_id = %viewport_id, %kind, "Viewport enabled");
        Ok(())
    }

    /// Disable a viewport. Unknown ids are logged and ignored.
    pub fn disable_element(&mut self, viewport_id: &str) -> Result<()> {
        self.throw_if_destroyed()?;
        let Some(index) = self.position(viewport_id) else {
            warn!(viewport_id, "Viewport does not exist, nothing to disable");
            return Ok(());
        };

        let mut viewport = self.viewports.remove(index);
        Self::reset_viewport(self.events.as_mut(), &self.id, &mut viewport);
        if !viewport.uses_custom_pipeline() {
            if let Some(backend) = self.backend.as_mut() {
                backend.remove_renderer(viewport_id);
            }
        }
        viewport.disabled = true;

        self.scheduler.forget(viewport_id);
        if self.viewports.is_empty() {
            self.scheduler.cancel(self.host.as_mut());
        }
        info!(viewport_id, "Viewport disabled");

        self.resize(true, true)
    }

    /// Replace every viewport with `inputs`, packing all GPU-driven ones in a
    /// single layout pass.
    pub fn set_viewports(&mut self, inputs: Vec<ViewportInput>) -> Result<()> {
        self.throw_if_destroyed()?;
        self.reset();

        let (gpu, custom): (Vec<_>, Vec<_>) =
            inputs.into_iter().partition(|input| self.is_gpu_driven(input.kind));

        let mut enabled = Vec::with_capacity(gpu.len() + custom.len());
        for input in gpu {
            let element = input.element.ok_or(TesseraError::MissingElement)?;
            let options = input.default_options.normalized(input.kind);
            let viewport = self.build_viewport(
                input.viewport_id.clone(),
                input.kind,
                element,
                options,
                input.suppress_events,
                false,
            );
            self.register_gpu_viewport(viewport)?;
            enabled.push(input.viewport_id);
        }
        self.repack();

        for input in custom {
            let element = input.element.ok_or(TesseraError::MissingElement)?;
            let options = input.default_options.normalized(input.kind);
            self.add_custom_viewport(
                input.viewport_id.clone(),
                input.kind,
                element,
                options,
                input.suppress_events,
            )?;
            enabled.push(input.viewport_id);
        }

        for viewport_id in &enabled {
            self.announce_enabled(viewport_id);
        }
        info!(viewports = enabled.len(), "Viewports set");
        Ok(())
    }

    /// Recompute geometry after surfaces changed size.
    ///
    /// Repacks the shared buffer, resizes custom-pipeline viewports, and
    /// resets every camera, restoring the previous camera when `keep_camera`.
    /// With `immediate`, every viewport is flagged for the next frame.
    pub fn resize(&mut self, immediate: bool, keep_camera: bool) -> Result<()> {
        self.throw_if_destroyed()?;

        self.repack();
        for viewport in self.viewports.iter_mut().filter(|vp| vp.uses_custom_pipeline()) {
            Self::size_custom_viewport(viewport);
        }

        for viewport in &mut self.viewports {
            let previous = viewport.camera();
            viewport.reset_camera();
            if keep_camera {
                viewport.set_camera(previous);
            }
        }

        if immediate {
            self.render()?;
        }
        Ok(())
    }

    /// Release every resource. Idempotent; every later call except this one
    /// fails with [`TesseraError::Destroyed`].
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.reset();
        if let Some(backend) = self.backend.as_mut() {
            backend.release();
        }
        self.offscreen_size = (0, 0);
        self.destroyed = true;
        info!(engine_id = %self.id, "Rendering engine destroyed");
    }

    // -- Rendering --------------------------------------------------------

    /// Flag every viewport for the next frame.
    pub fn render(&mut self) -> Result<()> {
        self.throw_if_destroyed()?;
        let ids: Vec<String> = self.viewports.iter().map(|vp| vp.id().to_owned()).collect();
        self.render_viewports(ids.as_slice())
    }

    pub fn render_viewport(&mut self, viewport_id: &str) -> Result<()> {
        self.render_viewports(&[viewport_id])
    }

    /// Flag the given viewports for the next frame. Unknown ids are dropped.
    pub fn render_viewports<S: AsRef<str>>(&mut self, viewport_ids: &[S]) -> Result<()> {
        self.throw_if_destroyed()?;
        let viewports = &self.viewports;
        self.scheduler.request(
            viewport_ids.iter().map(|id| id.as_ref()),
            |id| viewports.iter().any(|vp| vp.id() == id),
            self.host.as_mut(),
        );
        Ok(())
    }

    /// Flag every viewport showing the given frame of reference.
    pub fn render_frame_of_reference(&mut self, frame_of_reference: &str) -> Result<()> {
        self.throw_if_destroyed()?;
        let ids: Vec<String> = self
            .viewports
            .iter()
            .filter(|vp| vp.frame_of_reference() == Some(frame_of_reference))
            .map(|vp| vp.id().to_owned())
            .collect();
        self.render_viewports(ids.as_slice())
    }

    /// Service the scheduled frame: one draw call for the shared buffer, then
    /// a composite of each pending viewport in registry order. Image-rendered
    /// notifications go out once the frame is complete.
    ///
    /// If a composite fails, the error is returned and no notifications are
    /// published for that frame, including those for viewports composited
    /// before the failure. The scheduler returns to idle either way.
    pub fn on_frame(&mut self) -> Result<()> {
        self.throw_if_destroyed()?;
        if !self.scheduler.begin_frame() {
            debug!("Frame callback with nothing scheduled");
            return Ok(());
        }

        let result = self.render_flagged_viewports();
        self.scheduler.finish_frame();

        for event in result? {
            self.events.emit(event);
        }
        Ok(())
    }

    /// Draw every renderer, copy every GPU-driven viewport's slice to its
    /// surface and return a copy of the shared buffer.
    pub fn debug_render(&mut self) -> Result<RgbaImage> {
        self.throw_if_destroyed()?;
        let backend = self.backend.as_mut().ok_or(TesseraError::GpuUnavailable)?;

        let ids = backend.renderer_ids();
        Self::set_draw(backend.as_mut(), &ids, |_| true);
        backend.render();
        Self::set_draw(backend.as_mut(), &ids, |_| false);

        let shared = backend.drawing_surface();
        for viewport in self.viewports.iter_mut().filter(|vp| !vp.uses_custom_pipeline()) {
            let placement = viewport.placement();
            blit_region(shared, placement, viewport.element_mut().surface_mut().image_mut());
        }
        Ok(shared.clone())
    }

    fn render_flagged_viewports(&mut self) -> Result<Vec<EngineEvent>> {
        if !self.software_fallback {
            self.perform_draw_call();
        }

        let frame = FrameContext {
            engine_id: &self.id,
            software_fallback: self.software_fallback,
            min_size: self.config.min_viewport_size,
        };
        let shared = self.backend.as_deref().map(|b| b.drawing_surface());

        let mut rendered = Vec::new();
        for viewport in self.viewports.iter_mut() {
            if !self.scheduler.is_pending(viewport.id()) {
                continue;
            }

            if let Some(event) = Self::composite_viewport(viewport, shared, &mut self.workspace, &frame)? {
                rendered.push(event);
            }
            self.scheduler.complete(viewport.id());

            if !self.scheduler.has_pending() {
                break;
            }
        }
        debug!(rendered = rendered.len(), "Frame rendered");
        Ok(rendered)
    }

    /// One draw call with drawing enabled only for pending viewports.
    fn perform_draw_call(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let ids = backend.renderer_ids();
        if ids.is_empty() {
            warn!("No renderers registered, skipping draw call");
            return;
        }

        let scheduler = &self.scheduler;
        Self::set_draw(backend.as_mut(), &ids, |id| scheduler.is_pending(id));
        backend.render();
        Self::set_draw(backend.as_mut(), &ids, |_| false);
    }

    fn set_draw(backend: &mut dyn RenderBackend, ids: &[String], draw: impl Fn(&str) -> bool) {
        for id in ids {
            if let Some(renderer) = backend.renderer_mut(id) {
                renderer.set_draw(draw(id));
            }
        }
    }

    /// Bring one viewport's surface up to date. Returns the notification to
    /// publish, if any.
    fn composite_viewport(
        viewport: &mut Viewport,
        shared: Option<&RgbaImage>,
        workspace: &mut SegmentationWorkspace,
        frame: &FrameContext<'_>,
    ) -> Result<Option<EngineEvent>> {
        let placement = viewport.placement();
        if placement.width < frame.min_size || placement.height < frame.min_size {
            debug!(
                viewport_id = viewport.id(),
                width = placement.width,
                height = placement.height,
                "Viewport is too small, skipping"
            );
            return Ok(None);
        }

        if viewport_kind_uses_custom_pipeline(viewport.kind(), frame.software_fallback) {
            viewport.render_custom()?;
        } else {
            let shared = match shared {
                Some(shared) if !frame.software_fallback => shared,
                _ => return Err(TesseraError::GpuUnavailable),
            };
            blit_region(shared, placement, viewport.element_mut().surface_mut().image_mut());
        }

        viewport.composite_segmentation(workspace)?;

        if viewport.suppresses_events() {
            return Ok(None);
        }
        Ok(Some(EngineEvent::ImageRendered {
            element_id: viewport.element().id.clone(),
            viewport_id: viewport.id().to_owned(),
            engine_id: frame.engine_id.to_owned(),
            suppress_events: false,
        }))
    }

    // -- Internals --------------------------------------------------------

    fn build_viewport(
        &self,
        viewport_id: String,
        kind: ViewportKind,
        mut element: Element,
        options: DefaultOptions,
        suppress_events: bool,
        custom_pipeline: bool,
    ) -> Viewport {
        element.tab_index = Some(ENABLED_TAB_INDEX);
        element.set_attribute(VIEWPORT_UID_ATTRIBUTE, viewport_id.as_str());
        element.set_attribute(ENGINE_UID_ATTRIBUTE, self.id.as_str());
        Viewport::new(viewport_id, kind, element, options, suppress_events, custom_pipeline)
    }

    /// Register a renderer and append to the registry. Placement is assigned
    /// by the next [`Self::repack`].
    fn register_gpu_viewport(&mut self, viewport: Viewport) -> Result<()> {
        let backend = self.backend.as_mut().ok_or(TesseraError::BackendRequired)?;
        backend.add_renderer(viewport.id(), NormalizedRect::default(), viewport.background());
        self.viewports.push(viewport);
        Ok(())
    }

    fn add_custom_viewport(
        &mut self,
        viewport_id: String,
        kind: ViewportKind,
        element: Element,
        options: DefaultOptions,
        suppress_events: bool,
    ) -> Result<()> {
        if !viewport_kind_uses_custom_pipeline(kind, self.software_fallback) {
            return Err(TesseraError::UnsupportedViewportType(kind));
        }
        let mut viewport = self.build_viewport(viewport_id, kind, element, options, suppress_events, true);
        Self::size_custom_viewport(&mut viewport);
        self.viewports.push(viewport);
        Ok(())
    }

    /// Custom-pipeline viewports cover their whole surface at client size.
    fn size_custom_viewport(viewport: &mut Viewport) {
        let element = viewport.element();
        let width = device_pixels(element.client_width, 1.0);
        let height = device_pixels(element.client_height, 1.0);
        viewport.placement = Placement::whole(width, height);
        viewport.element_mut().surface_mut().set_size(width, height);
        viewport.behavior.resize(width, height);
    }

    /// Recompute the shared buffer and every GPU-driven viewport's slice.
    fn repack(&mut self) {
        let ratio = self.device_pixel_ratio();
        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        let indices: Vec<usize> = (0..self.viewports.len())
            .filter(|&i| !self.viewports[i].uses_custom_pipeline())
            .collect();
        let sizes: Vec<(u32, u32)> = indices
            .iter()
            .map(|&i| {
                let element = self.viewports[i].element();
                (
                    device_pixels(element.client_width, ratio),
                    device_pixels(element.client_height, ratio),
                )
            })
            .collect();

        let layout = compute_layout(&sizes);
        backend.resize(layout.width, layout.height);
        if self.offscreen_size != (layout.width, layout.height) {
            info!(width = layout.width, height = layout.height, "Offscreen buffer resized");
        }
        self.offscreen_size = (layout.width, layout.height);

        for (&i, slot) in indices.iter().zip(&layout.slots) {
            let viewport = &mut self.viewports[i];
            let placement = slot.placement;
            viewport.placement = placement;
            viewport
                .element_mut()
                .surface_mut()
                .set_size(placement.width, placement.height);
            viewport.behavior.resize(placement.width, placement.height);

            if let Some(renderer) = backend.renderer_mut(viewport.id()) {
                renderer.set_viewport(slot.rect);
            } else {
                backend.add_renderer(viewport.id(), slot.rect, viewport.background());
            }
        }
    }

    /// Fill the new viewport's surface and publish the enabled notification.
    fn announce_enabled(&mut self, viewport_id: &str) {
        let Some(viewport) = self.viewports.iter_mut().find(|vp| vp.id() == viewport_id) else {
            return;
        };
        let background = viewport.background();
        fill_with_background(viewport.element_mut().surface_mut().image_mut(), Some(background));

        if !viewport.suppresses_events() {
            self.events.emit(EngineEvent::ElementEnabled {
                element_id: viewport.element().id.clone(),
                viewport_id: viewport_id.to_owned(),
                engine_id: self.id.clone(),
            });
        }
    }

    /// Detach a viewport from its element: notify, strip the engine's
    /// attributes and clear the surface.
    fn reset_viewport(events: &mut dyn EventSink, engine_id: &str, viewport: &mut Viewport) {
        events.emit(EngineEvent::ElementDisabled {
            element_id: viewport.element().id.clone(),
            viewport_id: viewport.id().to_owned(),
            engine_id: engine_id.to_owned(),
        });

        let element = viewport.element_mut();
        element.remove_attribute(VIEWPORT_UID_ATTRIBUTE);
        element.remove_attribute(ENGINE_UID_ATTRIBUTE);
        element.surface_mut().clear();
    }

    /// Disable every viewport and cancel scheduling.
    fn reset(&mut self) {
        for mut viewport in std::mem::take(&mut self.viewports) {
            Self::reset_viewport(self.events.as_mut(), &self.id, &mut viewport);
            if !viewport.uses_custom_pipeline() {
                if let Some(backend) = self.backend.as_mut() {
                    backend.remove_renderer(viewport.id());
                }
            }
            viewport.disabled = true;
        }
        self.scheduler.cancel(self.host.as_mut());
    }
}

impl std::fmt::Debug for RenderingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingEngine")
            .field("id", &self.id)
            .field("software_fallback", &self.software_fallback)
            .field("viewports", &self.viewports.len())
            .field("offscreen_size", &self.offscreen_size)
            .field("scheduler", &self.scheduler.state())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
