use std::cell::RefCell;
use std::rc::Rc;

/// Notifications published by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    ElementEnabled {
        element_id: String,
        viewport_id: String,
        engine_id: String,
    },
    ElementDisabled {
        element_id: String,
        viewport_id: String,
        engine_id: String,
    },
    /// Emitted after the frame that rendered the viewport completes.
    ImageRendered {
        element_id: String,
        viewport_id: String,
        engine_id: String,
        suppress_events: bool,
    },
}

impl EngineEvent {
    pub fn viewport_id(&self) -> &str {
        match self {
            Self::ElementEnabled { viewport_id, .. }
            | Self::ElementDisabled { viewport_id, .. }
            | Self::ImageRendered { viewport_id, .. } => viewport_id,
        }
    }
}

/// Publish/subscribe target for engine notifications.
pub trait EventSink {
    fn emit(&mut self, event: EngineEvent);
}

/// Sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: EngineEvent) {}
}

/// Sink that records events in order. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<EngineEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Viewport ids of the recorded image-rendered events, in order.
    pub fn rendered_viewports(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, EngineEvent::ImageRendered { .. }))
            .map(|e| e.viewport_id().to_owned())
            .collect()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: EngineEvent) {
        self.events.borrow_mut().push(event);
    }
}
