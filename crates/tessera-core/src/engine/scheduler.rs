//! Single-flight render scheduling.
//!
//! Render requests accumulate in a pending set; at most one frame callback is
//! outstanding at any time. The frame drains the set and returns the
//! scheduler to [`FrameState::Idle`].

use std::collections::HashSet;

use tracing::debug;

use super::host::{FrameHandle, FrameHost};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Scheduled(FrameHandle),
}

#[derive(Debug)]
pub struct RenderScheduler {
    state: FrameState,
    pending: HashSet<String>,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self {
            state: FrameState::Idle,
            pending: HashSet::new(),
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self.state, FrameState::Scheduled(_))
    }

    /// Flag `ids` for the next frame and schedule one if none is
    /// outstanding. Ids rejected by `is_known` are dropped. Returns true when
    /// this call scheduled a new frame.
    pub fn request<'a, I, F>(&mut self, ids: I, is_known: F, host: &mut dyn FrameHost) -> bool
    where
        I: IntoIterator<Item = &'a str>,
        F: Fn(&str) -> bool,
    {
        for id in ids {
            if is_known(id) {
                self.pending.insert(id.to_owned());
            } else {
                debug!(viewport_id = id, "Dropping render request for unknown viewport");
            }
        }

        if self.pending.is_empty() || self.is_scheduled() {
            return false;
        }

        let handle = host.request_frame();
        debug!(?handle, pending = self.pending.len(), "Frame scheduled");
        self.state = FrameState::Scheduled(handle);
        true
    }

    /// Start servicing the scheduled frame. Returns false for a stale
    /// callback, when nothing is scheduled.
    pub fn begin_frame(&self) -> bool {
        self.is_scheduled()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains(id)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Mark `id` as rendered in the current frame.
    pub fn complete(&mut self, id: &str) -> bool {
        self.pending.remove(id)
    }

    /// Drop `id` from the pending set without rendering it.
    pub fn forget(&mut self, id: &str) {
        self.pending.remove(id);
    }

    /// End the current frame so a new one can be requested.
    pub fn finish_frame(&mut self) {
        self.state = FrameState::Idle;
    }

    /// Cancel any outstanding frame and discard all pending requests.
    pub fn cancel(&mut self, host: &mut dyn FrameHost) {
        if let FrameState::Scheduled(handle) = self.state {
            debug!(?handle, "Frame cancelled");
            host.cancel_frame(handle);
        }
        self.state = FrameState::Idle;
        self.pending.clear();
    }
}
