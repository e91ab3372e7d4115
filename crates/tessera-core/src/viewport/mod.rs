//! Viewports: the logical display surfaces the engine packs and renders.

mod camera;
mod element;
mod stack;
mod volume;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_BACKGROUND;
use crate::engine::composite::apply_segmentation_overlay;
use crate::engine::layout::Placement;
use crate::error::Result;
use crate::scan::{ScanData, ScanImage};
use crate::segmentation::{SegmentationSummary, SegmentationWorkspace};

pub use camera::Camera;
pub use element::{Element, Surface};
pub use stack::StackViewport;
pub use volume::{VolumeViewport, VolumeViewport3d};

/// Closed set of viewport kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportKind {
    /// Raster stack of 2-D images.
    Stack,
    /// Volumetric slice with parallel projection.
    Orthographic,
    /// Volumetric slice with perspective projection.
    Perspective,
    /// Free 3-D volume rendering.
    Volume3d,
}

impl ViewportKind {
    pub fn is_volume(self) -> bool {
        !matches!(self, Self::Stack)
    }
}

impl fmt::Display for ViewportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stack => "stack",
            Self::Orthographic => "orthographic",
            Self::Perspective => "perspective",
            Self::Volume3d => "volume3d",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationAxis {
    Axial,
    Sagittal,
    Coronal,
    Acquisition,
}

/// Portion of the viewport the image should occupy, as fractions of the
/// viewport width and height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayArea {
    pub image_area: [f64; 2],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultOptions {
    /// RGB in [0, 1].
    pub background: Option<[f32; 3]>,
    pub orientation: Option<OrientationAxis>,
    pub display_area: Option<DisplayArea>,
}

impl DefaultOptions {
    /// Fill in the defaults the engine relies on: a black background, and the
    /// axial orientation for orthographic viewports.
    pub fn normalized(mut self, kind: ViewportKind) -> Self {
        self.background.get_or_insert(DEFAULT_BACKGROUND);
        if kind == ViewportKind::Orthographic {
            self.orientation.get_or_insert(OrientationAxis::Axial);
        }
        self
    }

    pub fn background_or_default(&self) -> [f32; 3] {
        self.background.unwrap_or(DEFAULT_BACKGROUND)
    }
}

/// Everything needed to enable a viewport.
#[derive(Clone, Debug)]
pub struct ViewportInput {
    pub viewport_id: String,
    pub kind: ViewportKind,
    pub element: Option<Element>,
    pub default_options: DefaultOptions,
    pub suppress_events: bool,
}

impl ViewportInput {
    pub fn new(viewport_id: impl Into<String>, kind: ViewportKind, element: Element) -> Self {
        Self {
            viewport_id: viewport_id.into(),
            kind,
            element: Some(element),
            default_options: DefaultOptions::default(),
            suppress_events: false,
        }
    }

    pub fn with_options(mut self, options: DefaultOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn suppress_events(mut self, suppress: bool) -> Self {
        self.suppress_events = suppress;
        self
    }
}

/// Surface and inputs handed to a viewport's own render pipeline.
pub struct RenderTarget<'a> {
    pub surface: &'a mut Surface,
    pub image: Option<&'a ScanImage>,
    pub background: [f32; 3],
}

/// Per-kind viewport behavior, chosen once when the viewport is created.
pub trait RenderableViewport: fmt::Debug {
    /// Draw directly onto the target surface, bypassing the shared buffer.
    fn render(&mut self, target: RenderTarget<'_>) -> Result<()>;

    /// The display surface changed size (device pixels).
    fn resize(&mut self, width: u32, height: u32);

    fn camera(&self) -> Camera;

    fn set_camera(&mut self, camera: Camera);

    /// Return to the kind's default camera.
    fn reset_camera(&mut self);
}

fn create_behavior(kind: ViewportKind, options: &DefaultOptions) -> Box<dyn RenderableViewport> {
    match kind {
        ViewportKind::Stack => Box::new(StackViewport::new()),
        ViewportKind::Orthographic | ViewportKind::Perspective => {
            Box::new(VolumeViewport::new(kind, options.orientation))
        }
        ViewportKind::Volume3d => Box::new(VolumeViewport3d::new()),
    }
}

/// A scan image and its analysis parameters attached to a viewport.
#[derive(Clone, Debug)]
pub struct ScanAttachment {
    pub image: ScanImage,
    pub data: ScanData,
    /// Summary of the most recent segmentation run, if any.
    pub summary: Option<SegmentationSummary>,
}

/// A registered viewport.
#[derive(Debug)]
pub struct Viewport {
    id: String,
    kind: ViewportKind,
    element: Element,
    pub(crate) placement: Placement,
    options: DefaultOptions,
    suppress_events: bool,
    pub(crate) disabled: bool,
    custom_pipeline: bool,
    pub(crate) behavior: Box<dyn RenderableViewport>,
    pub(crate) scan: Option<ScanAttachment>,
    frame_of_reference: Option<String>,
}

impl Viewport {
    pub(crate) fn new(
        id: String,
        kind: ViewportKind,
        element: Element,
        options: DefaultOptions,
        suppress_events: bool,
        custom_pipeline: bool,
    ) -> Self {
        let behavior = create_behavior(kind, &options);
        Self {
            id,
            kind,
            element,
            placement: Placement::default(),
            options,
            suppress_events,
            disabled: false,
            custom_pipeline,
            behavior,
            scan: None,
            frame_of_reference: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ViewportKind {
        self.kind
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }

    /// Source rectangle in device pixels. For viewports using the shared
    /// buffer this is the slice of that buffer; otherwise the own surface.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn default_options(&self) -> &DefaultOptions {
        &self.options
    }

    pub fn background(&self) -> [f32; 3] {
        self.options.background_or_default()
    }

    pub fn suppresses_events(&self) -> bool {
        self.suppress_events
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether this viewport renders through its own pipeline instead of
    /// the shared buffer.
    pub fn uses_custom_pipeline(&self) -> bool {
        self.custom_pipeline
    }

    pub fn camera(&self) -> Camera {
        self.behavior.camera()
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.behavior.set_camera(camera);
    }

    pub fn reset_camera(&mut self) {
        self.behavior.reset_camera();
    }

    /// Attach a scan image for display and segmentation. Inverted images
    /// are corrected on attach and the image's frame of reference, if any,
    /// becomes the viewport's.
    pub fn set_scan(&mut self, mut image: ScanImage, data: ScanData) {
        image.correct_if_inverted();
        if let Some(frame) = &image.frame_of_reference {
            self.frame_of_reference = Some(frame.clone());
        }
        self.scan = Some(ScanAttachment {
            image,
            data,
            summary: None,
        });
    }

    pub fn clear_scan(&mut self) -> Option<ScanAttachment> {
        self.scan.take()
    }

    pub fn scan(&self) -> Option<&ScanAttachment> {
        self.scan.as_ref()
    }

    pub fn frame_of_reference(&self) -> Option<&str> {
        self.frame_of_reference.as_deref()
    }

    pub fn set_frame_of_reference(&mut self, uid: Option<String>) {
        self.frame_of_reference = uid;
    }

    /// Draw through the viewport's own pipeline onto its surface.
    pub(crate) fn render_custom(&mut self) -> Result<()> {
        let target = RenderTarget {
            surface: self.element.surface_mut(),
            image: self.scan.as_ref().map(|s| &s.image),
            background: self.options.background_or_default(),
        };
        self.behavior.render(target)
    }

    /// Segment the attached scan, if any, and blend its overlay onto the
    /// surface. The run's summary is kept on the attachment.
    pub(crate) fn composite_segmentation(&mut self, ws: &mut SegmentationWorkspace) -> Result<()> {
        let Some(scan) = self.scan.as_mut() else {
            return Ok(());
        };
        let surface = self.element.surface_mut().image_mut();
        let summary = apply_segmentation_overlay(ws, &scan.image, &mut scan.data, surface)?;
        scan.summary = Some(summary);
        Ok(())
    }
}
