//! Screen capture capability.
//!
//! The core only needs "take a full-screen screenshot and give me a handle".
//! Backends implement [`ScreenshotTaker`]; the Windows GDI backend lives in
//! [`gdi`].

#[cfg(windows)]
pub mod gdi;

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of unique screenshot ids for this process.
static NEXT_SCREENSHOT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to a captured image.
///
/// Pixels are 32-bit BGRA, rows top-down. Cloning is cheap; the pixel
/// buffer is shared.
#[derive(Clone, PartialEq, Eq)]
pub struct Screenshot {
    id: u64,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
    pixels: Arc<[u8]>,
}

impl Screenshot {
    /// Wraps a freshly captured pixel buffer and assigns it a new id.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            id: NEXT_SCREENSHOT_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            captured_at: Utc::now(),
            pixels: pixels.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

// Pixel buffers are large; keep them out of debug output.
impl fmt::Debug for Screenshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screenshot")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("captured_at", &self.captured_at)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Anything that can capture the whole screen on demand.
///
/// Capture is a blocking call. Failures are returned as-is to the caller;
/// no retry happens at this layer.
pub trait ScreenshotTaker: Send + Sync {
    fn take_full_screenshot(&self) -> Result<Screenshot>;
}

impl<S: ScreenshotTaker + ?Sized> ScreenshotTaker for Arc<S> {
    fn take_full_screenshot(&self) -> Result<Screenshot> {
        (**self).take_full_screenshot()
    }
}
