//! Persisted record types.

use crate::events::{KeyCode, MouseEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A captured click paired with its screenshot.
///
/// `id` is `None` until the record has been saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: Option<i64>,

    pub click_x: i32,
    pub click_y: i32,

    /// Keys held when the click happened, in first-press order.
    pub pressed_keys: Vec<KeyCode>,

    pub screenshot_width: Option<u32>,
    pub screenshot_height: Option<u32>,

    /// Raw BGRA pixels. Not serialized to JSON.
    #[serde(skip)]
    pub screenshot: Option<Vec<u8>>,

    pub created_at: DateTime<Utc>,
}

impl Button {
    /// Builds an unsaved record from a mouse event and the keys held at
    /// click time.
    pub fn from_mouse_event(event: &MouseEvent, pressed_keys: Vec<KeyCode>) -> Self {
        let shot = event.screenshot.as_ref();
        Self {
            id: None,
            click_x: event.click_x,
            click_y: event.click_y,
            pressed_keys,
            screenshot_width: shot.map(|s| s.width()),
            screenshot_height: shot.map(|s| s.height()),
            screenshot: shot.map(|s| s.pixels().to_vec()),
            created_at: shot.map(|s| s.captured_at()).unwrap_or_else(Utc::now),
        }
    }

    pub fn has_screenshot(&self) -> bool {
        self.screenshot.is_some()
    }
}
