#![allow(dead_code)]

use ndarray::Array2;
use tessera_core::engine::{DrawLog, EventLog, HeadlessBackend, ManualFrameHost};
use tessera_core::scan::ScanImage;
use tessera_core::viewport::{Element, ViewportInput, ViewportKind};
use tessera_core::{EngineConfig, RenderingEngine};

/// Engine plus shared handles to its headless collaborators.
pub struct Harness {
    pub engine: RenderingEngine,
    pub host: ManualFrameHost,
    pub events: EventLog,
    pub draws: DrawLog,
}

impl Harness {
    /// Fire the outstanding frame, if any. Returns whether one fired.
    pub fn fire(&mut self) -> bool {
        if !self.host.fire() {
            return false;
        }
        self.engine.on_frame().unwrap();
        true
    }
}

pub fn gpu_engine() -> Harness {
    gpu_engine_with_ratio(1.0)
}

pub fn gpu_engine_with_ratio(ratio: f64) -> Harness {
    let host = ManualFrameHost::with_device_pixel_ratio(ratio);
    let events = EventLog::new();
    let backend = HeadlessBackend::new();
    let draws = backend.draw_log();
    let engine = RenderingEngine::new(
        EngineConfig::with_id("engine-test"),
        Some(Box::new(backend)),
        Box::new(host.clone()),
        Box::new(events.clone()),
    )
    .unwrap();
    Harness {
        engine,
        host,
        events,
        draws,
    }
}

pub fn software_engine() -> Harness {
    let host = ManualFrameHost::new();
    let events = EventLog::new();
    let mut config = EngineConfig::software();
    config.id = Some("engine-cpu".into());
    let engine = RenderingEngine::new(
        config,
        None,
        Box::new(host.clone()),
        Box::new(events.clone()),
    )
    .unwrap();
    Harness {
        engine,
        host,
        events,
        draws: DrawLog::default(),
    }
}

pub fn input(id: &str, kind: ViewportKind, width: f64, height: f64) -> ViewportInput {
    ViewportInput::new(id, kind, Element::new(format!("{id}-element"), width, height))
}

pub fn stack_input(id: &str, width: f64, height: f64) -> ViewportInput {
    input(id, ViewportKind::Stack, width, height)
}

/// Scan image from rows of equal length.
pub fn scan_image(rows: &[&[u32]]) -> ScanImage {
    let h = rows.len();
    let w = rows[0].len();
    let flat: Vec<u32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    ScanImage::new(Array2::from_shape_vec((h, w), flat).unwrap(), 12)
}
