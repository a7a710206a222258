//! Domain events and the receiver capability they are delivered to.
//!
//! Both event types are immutable values with structural equality. They are
//! handed to an [`EventReceiver`] by value and never retained by the
//! component that produced them.

use crate::capture::Screenshot;
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Numeric key code as reported by the OS hook.
pub type KeyCode = u32;

/// A qualifying click, optionally enriched with a screen capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MouseEvent {
    pub click_x: i32,
    pub click_y: i32,

    /// Image captured at click time. `None` when capture is disabled.
    #[serde(skip)]
    pub screenshot: Option<Screenshot>,
}

impl MouseEvent {
    pub fn new(click_x: i32, click_y: i32, screenshot: Option<Screenshot>) -> Self {
        Self {
            click_x,
            click_y,
            screenshot,
        }
    }
}

/// Snapshot of the currently held keys, in first-press order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyboardStateChangedEvent(Vec<KeyCode>);

impl KeyboardStateChangedEvent {
    pub fn new(pressed_keys: Vec<KeyCode>) -> Self {
        Self(pressed_keys)
    }

    pub fn pressed_keys(&self) -> &[KeyCode] {
        &self.0
    }

    pub fn into_pressed_keys(self) -> Vec<KeyCode> {
        self.0
    }
}

impl From<Vec<KeyCode>> for KeyboardStateChangedEvent {
    fn from(keys: Vec<KeyCode>) -> Self {
        Self(keys)
    }
}

/// Sink for the events produced by the listeners.
///
/// Implementations decide what happens next (logging, persistence,
/// forwarding). A returned error propagates to the caller of the
/// `tap`/`click` that triggered the event.
pub trait EventReceiver: Send + Sync {
    fn receive_mouse_event(&self, event: MouseEvent) -> Result<()>;

    fn receive_keyboard_state_change_event(&self, event: KeyboardStateChangedEvent)
        -> Result<()>;
}

impl<R: EventReceiver + ?Sized> EventReceiver for Arc<R> {
    fn receive_mouse_event(&self, event: MouseEvent) -> Result<()> {
        (**self).receive_mouse_event(event)
    }

    fn receive_keyboard_state_change_event(
        &self,
        event: KeyboardStateChangedEvent,
    ) -> Result<()> {
        (**self).receive_keyboard_state_change_event(event)
    }
}

/// Emits every event as a structured log line.
#[derive(Debug, Default)]
pub struct LoggingReceiver;

impl EventReceiver for LoggingReceiver {
    fn receive_mouse_event(&self, event: MouseEvent) -> Result<()> {
        tracing::info!(
            x = event.click_x,
            y = event.click_y,
            screenshot = event.screenshot.as_ref().map(|s| s.id()),
            "Mouse event"
        );
        Ok(())
    }

    fn receive_keyboard_state_change_event(
        &self,
        event: KeyboardStateChangedEvent,
    ) -> Result<()> {
        tracing::info!(keys = ?event.pressed_keys(), "Keyboard state changed");
        Ok(())
    }
}

/// Forwards each event to several receivers in registration order.
///
/// Stops at the first receiver that fails and returns its error; later
/// receivers do not see that event.
#[derive(Default)]
pub struct FanoutReceiver {
    receivers: Vec<Arc<dyn EventReceiver>>,
}

impl FanoutReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a receiver to the end of the chain.
    pub fn with(mut self, receiver: Arc<dyn EventReceiver>) -> Self {
        self.receivers.push(receiver);
        self
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

impl EventReceiver for FanoutReceiver {
    fn receive_mouse_event(&self, event: MouseEvent) -> Result<()> {
        for receiver in &self.receivers {
            receiver.receive_mouse_event(event.clone())?;
        }
        Ok(())
    }

    fn receive_keyboard_state_change_event(
        &self,
        event: KeyboardStateChangedEvent,
    ) -> Result<()> {
        for receiver in &self.receivers {
            receiver.receive_keyboard_state_change_event(event.clone())?;
        }
        Ok(())
    }
}
