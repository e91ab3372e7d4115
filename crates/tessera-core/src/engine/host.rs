use std::cell::RefCell;
use std::rc::Rc;

use crate::consts::DEFAULT_DEVICE_PIXEL_RATIO;

/// Opaque handle of a requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host platform frame primitives.
///
/// `request_frame` arranges for the engine's `on_frame` to be called once on
/// the next frame. The engine never requests a second frame while one is
/// outstanding.
pub trait FrameHost {
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);

    fn device_pixel_ratio(&self) -> f64 {
        DEFAULT_DEVICE_PIXEL_RATIO
    }
}

#[derive(Debug)]
struct HostState {
    next_handle: u64,
    pending: Option<FrameHandle>,
    requested: usize,
    cancelled: Vec<FrameHandle>,
    device_pixel_ratio: f64,
}

/// Frame host driven by hand: the owner decides when a frame fires.
///
/// Clones share state, so a caller can keep one clone to inspect requests
/// while the engine owns another.
#[derive(Clone, Debug)]
pub struct ManualFrameHost {
    inner: Rc<RefCell<HostState>>,
}

impl Default for ManualFrameHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualFrameHost {
    pub fn new() -> Self {
        Self::with_device_pixel_ratio(DEFAULT_DEVICE_PIXEL_RATIO)
    }

    pub fn with_device_pixel_ratio(ratio: f64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HostState {
                next_handle: 1,
                pending: None,
                requested: 0,
                cancelled: Vec::new(),
                device_pixel_ratio: ratio,
            })),
        }
    }

    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        self.inner.borrow_mut().device_pixel_ratio = ratio;
    }

    /// The outstanding frame, if one was requested and not yet fired or
    /// cancelled.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.inner.borrow().pending
    }

    /// Mark the outstanding frame as fired. Returns whether there was one;
    /// the caller then invokes the engine's `on_frame`.
    pub fn fire(&self) -> bool {
        self.inner.borrow_mut().pending.take().is_some()
    }

    /// Total number of frames requested so far.
    pub fn requested_count(&self) -> usize {
        self.inner.borrow().requested
    }

    pub fn cancelled(&self) -> Vec<FrameHandle> {
        self.inner.borrow().cancelled.clone()
    }
}

impl FrameHost for ManualFrameHost {
    fn request_frame(&mut self) -> FrameHandle {
        let mut state = self.inner.borrow_mut();
        let handle = FrameHandle(state.next_handle);
        state.next_handle += 1;
        state.requested += 1;
        state.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut state = self.inner.borrow_mut();
        if state.pending == Some(handle) {
            state.pending = None;
        }
        state.cancelled.push(handle);
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.inner.borrow().device_pixel_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_fire_cancel() {
        let observer = ManualFrameHost::new();
        let mut host = observer.clone();

        let first = host.request_frame();
        assert_eq!(observer.pending(), Some(first));
        assert!(observer.fire());
        assert!(!observer.fire());

        let second = host.request_frame();
        assert_ne!(first, second);
        host.cancel_frame(second);
        assert_eq!(observer.pending(), None);
        assert_eq!(observer.cancelled(), vec![second]);
        assert_eq!(observer.requested_count(), 2);
    }
}
