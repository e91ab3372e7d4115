use thiserror::Error;

use crate::viewport::ViewportKind;

#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("rendering engine has been destroyed; create a new instance instead")]
    Destroyed,

    #[error("No element provided")]
    MissingElement,

    #[error("Viewport type {0} is not supported")]
    UnsupportedViewportType(ViewportKind),

    #[error("GPU not available, and using a viewport with no custom render pipeline")]
    GpuUnavailable,

    #[error("GPU-driven rendering requires a render backend")]
    BackendRequired,

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TesseraError>;
