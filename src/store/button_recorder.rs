//! Event receiver that persists clicks as buttons.

use super::{Button, ButtonRepository};
use crate::error::{KeycatError, Result};
use crate::events::{EventReceiver, KeyCode, KeyboardStateChangedEvent, MouseEvent};
use std::sync::Mutex;

/// Saves every mouse event as a [`Button`], tagged with the keys that were
/// held at the moment of the click.
pub struct ButtonRecorder<R> {
    repository: R,
    /// Payload of the most recent keyboard event.
    held_keys: Mutex<Vec<KeyCode>>,
}

impl<R: ButtonRepository> ButtonRecorder<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            held_keys: Mutex::new(Vec::new()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn held_keys(&self) -> Result<Vec<KeyCode>> {
        self.held_keys
            .lock()
            .map(|keys| keys.clone())
            .map_err(|_| KeycatError::LockPoisoned("held keys"))
    }
}

impl<R: ButtonRepository> EventReceiver for ButtonRecorder<R> {
    fn receive_mouse_event(&self, event: MouseEvent) -> Result<()> {
        let button = Button::from_mouse_event(&event, self.held_keys()?);
        let id = self.repository.save_button(&button)?;
        tracing::info!(
            id,
            x = button.click_x,
            y = button.click_y,
            keys = ?button.pressed_keys,
            screenshot = button.has_screenshot(),
            "Recorded button"
        );
        Ok(())
    }

    fn receive_keyboard_state_change_event(
        &self,
        event: KeyboardStateChangedEvent,
    ) -> Result<()> {
        let mut keys = self
            .held_keys
            .lock()
            .map_err(|_| KeycatError::LockPoisoned("held keys"))?;
        *keys = event.into_pressed_keys();
        Ok(())
    }
}
