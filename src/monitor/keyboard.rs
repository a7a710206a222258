//! Pressed-key tracking.
//!
//! [`KeyboardStateManager`] turns noisy key transitions (auto-repeat downs,
//! releases without a matching press) into an ordered set of held keys and
//! emits one [`KeyboardStateChangedEvent`] per net change.
//!
//! Keys are ordered by first press. Releasing a key removes it without
//! reordering the keys still held.

use crate::error::Result;
use crate::events::{EventReceiver, KeyCode, KeyboardStateChangedEvent};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Insertion-ordered set of key codes.
#[derive(Debug, Default)]
struct PressedKeys {
    order: Vec<KeyCode>,
    members: HashSet<KeyCode>,
}

impl PressedKeys {
    /// Returns `false` if the key was already held.
    fn insert(&mut self, code: KeyCode) -> bool {
        if !self.members.insert(code) {
            return false;
        }
        self.order.push(code);
        true
    }

    /// Returns `false` if the key was not held.
    fn remove(&mut self, code: KeyCode) -> bool {
        if !self.members.remove(&code) {
            return false;
        }
        // Vec::remove shifts the tail, keeping survivors in order
        if let Some(index) = self.order.iter().position(|&k| k == code) {
            self.order.remove(index);
        }
        true
    }

    fn clear(&mut self) -> bool {
        if self.order.is_empty() {
            return false;
        }
        self.order.clear();
        self.members.clear();
        true
    }

    fn snapshot(&self) -> Vec<KeyCode> {
        self.order.clone()
    }
}

/// Target of keyboard transitions, implemented by [`KeyboardStateManager`].
pub trait KeyStateSink: Send + Sync {
    fn key_pressed(&self, code: KeyCode) -> Result<()>;
    fn key_released(&self, code: KeyCode) -> Result<()>;
}

/// Owns the set of currently held keys.
///
/// Check, mutate and emit happen under one lock, so concurrent callers
/// observe transitions atomically and the receiver sees events in the
/// order the transitions were applied. The receiver must not call back
/// into the manager.
pub struct KeyboardStateManager {
    state: Mutex<PressedKeys>,
    receiver: Arc<dyn EventReceiver>,
}

impl KeyboardStateManager {
    pub fn new(receiver: Arc<dyn EventReceiver>) -> Self {
        Self {
            state: Mutex::new(PressedKeys::default()),
            receiver,
        }
    }

    // The set is fully updated before the receiver runs, so a panic
    // inside the receiver cannot leave it half-modified.
    fn lock_state(&self) -> MutexGuard<'_, PressedKeys> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, state: &PressedKeys) -> Result<()> {
        let event = KeyboardStateChangedEvent::new(state.snapshot());
        tracing::trace!(keys = ?event.pressed_keys(), "Keyboard state changed");
        self.receiver.receive_keyboard_state_change_event(event)
    }

    /// Records a key going down.
    ///
    /// A key that is already held is ignored and no event is emitted.
    pub fn key_pressed(&self, code: KeyCode) -> Result<()> {
        let mut state = self.lock_state();
        if !state.insert(code) {
            return Ok(());
        }
        self.emit(&state)
    }

    /// Records a key going up.
    ///
    /// Releasing a key that is not held is ignored and no event is emitted.
    pub fn key_released(&self, code: KeyCode) -> Result<()> {
        let mut state = self.lock_state();
        if !state.remove(code) {
            return Ok(());
        }
        self.emit(&state)
    }

    /// Releases every held key at once, emitting a single empty-state event
    /// if anything was held.
    ///
    /// Used when input delivery stops so no key stays stuck down.
    pub fn release_all(&self) -> Result<()> {
        let mut state = self.lock_state();
        if !state.clear() {
            return Ok(());
        }
        tracing::debug!("Released all held keys");
        self.emit(&state)
    }

    /// Returns the held keys in first-press order.
    pub fn get_pressed_keys(&self) -> Vec<KeyCode> {
        self.lock_state().snapshot()
    }

    pub fn is_pressed(&self, code: KeyCode) -> bool {
        self.lock_state().members.contains(&code)
    }
}

impl KeyStateSink for KeyboardStateManager {
    fn key_pressed(&self, code: KeyCode) -> Result<()> {
        KeyboardStateManager::key_pressed(self, code)
    }

    fn key_released(&self, code: KeyCode) -> Result<()> {
        KeyboardStateManager::key_released(self, code)
    }
}

/// Stateless filter from raw key taps to press/release calls.
pub struct KeyboardListener {
    sink: Arc<dyn KeyStateSink>,
}

impl KeyboardListener {
    pub fn new(sink: Arc<dyn KeyStateSink>) -> Self {
        Self { sink }
    }

    /// Handles one raw key transition.
    ///
    /// Keys are identified by `code` alone; `name` is only logged.
    pub fn tap(&self, code: KeyCode, name: &str, pressed: bool) -> Result<()> {
        tracing::trace!(code, name, pressed, "Key tap");
        if pressed {
            self.sink.key_pressed(code)
        } else {
            self.sink.key_released(code)
        }
    }
}
