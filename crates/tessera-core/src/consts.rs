/// Minimum device-pixel size per side a viewport needs before it is rendered.
/// Renderers misbehave below two pixels in either direction.
pub const VIEWPORT_MIN_SIZE: u32 = 2;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Largest downsample factor used by the segmentation working set.
pub const MAX_DOWNSAMPLE_FACTOR: usize = 5;

/// Source width covered by each downsample step (factor = 1 + width / this).
pub const DOWNSAMPLE_WIDTH_STEP: usize = 800;

/// Default device-pixel ratio when the host does not report one.
pub const DEFAULT_DEVICE_PIXEL_RATIO: f64 = 1.0;

/// Default viewport background (black).
pub const DEFAULT_BACKGROUND: [f32; 3] = [0.0, 0.0, 0.0];

/// Overlay color of the primary region boundary (opaque blue).
pub const PRIMARY_BORDER_RGBA: [u8; 4] = [0, 0, 255, 255];

/// Overlay color of the secondary region boundary (opaque green).
pub const SECONDARY_BORDER_RGBA: [u8; 4] = [0, 255, 0, 255];

/// Overlay color of the translucent secondary region fill.
pub const SECONDARY_FILL_RGBA: [u8; 4] = [0, 100, 0, 100];

/// Attenuation filter baseline at or above which the filter is disabled.
pub const ATTENUATION_DISABLED_BASELINE: f64 = 1.0;

/// Default attenuation filter exponent.
pub const DEFAULT_ATTENUATION_EXPONENT: f64 = 1.0;

/// Default attenuation filter scale.
pub const DEFAULT_ATTENUATION_SCALE: f64 = 1.0;

/// Element attribute naming the viewport that owns the element.
pub const VIEWPORT_UID_ATTRIBUTE: &str = "data-viewport-uid";

/// Element attribute naming the engine that owns the element.
pub const ENGINE_UID_ATTRIBUTE: &str = "data-rendering-engine-uid";

/// Tab index assigned to enabled elements (focusable only programmatically).
pub const ENABLED_TAB_INDEX: i32 = -1;
