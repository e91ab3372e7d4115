//! Two-threshold segmentation of a scan image into a primary region and a
//! secondary region, with a boundary overlay for display.

pub mod attenuation;
pub mod boundary;
pub mod labeling;
pub mod mask;
pub mod orientation;
pub mod secondary;
pub mod union_find;
pub mod workspace;

pub use boundary::OverlayStyle;
pub use labeling::{label_components, ComponentLabels};
pub use orientation::Laterality;
pub use union_find::UnionFind;
pub use workspace::{downsample_factor, SegmentationSummary, SegmentationWorkspace};
