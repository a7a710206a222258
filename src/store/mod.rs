//! Button persistence.
//!
//! Captured clicks are stored as [`Button`] records behind the
//! [`ButtonRepository`] façade. [`ButtonRecorder`] is the event receiver
//! that turns mouse events into records.

pub mod button_recorder;
pub mod types;

pub use button_recorder::*;
pub use types::*;

use crate::error::Result;
use std::sync::Arc;

/// Create/read access to stored buttons.
pub trait ButtonRepository: Send + Sync {
    /// Returns every stored button, oldest first.
    fn find_all_buttons(&self) -> Result<Vec<Button>>;

    /// Stores one button and returns its new id.
    fn save_button(&self, button: &Button) -> Result<i64>;

    /// Stores several buttons atomically and returns how many were saved.
    fn save_buttons(&self, buttons: &[Button]) -> Result<usize>;
}

impl<R: ButtonRepository + ?Sized> ButtonRepository for Arc<R> {
    fn find_all_buttons(&self) -> Result<Vec<Button>> {
        (**self).find_all_buttons()
    }

    fn save_button(&self, button: &Button) -> Result<i64> {
        (**self).save_button(button)
    }

    fn save_buttons(&self, buttons: &[Button]) -> Result<usize> {
        (**self).save_buttons(buttons)
    }
}
