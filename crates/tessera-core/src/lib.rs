pub mod consts;
pub mod engine;
pub mod error;
pub mod io;
pub mod scan;
pub mod segmentation;
pub mod viewport;

pub use engine::{EngineConfig, RenderingEngine};
pub use error::{Result, TesseraError};
