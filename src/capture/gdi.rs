//! Full virtual-screen capture through GDI.
//!
//! Copies the desktop into a memory bitmap with `BitBlt` and reads it back
//! as 32-bit top-down BGRA with `GetDIBits`.

use super::{Screenshot, ScreenshotTaker};
use crate::error::{KeycatError, Result};
use std::ffi::c_void;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC,
    SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

/// Captures every monitor as one image.
#[derive(Debug, Default)]
pub struct GdiScreenshotTaker;

impl GdiScreenshotTaker {
    pub fn new() -> Self {
        Self
    }
}

/// Releases the GDI objects acquired for one capture, in reverse order.
struct CaptureResources {
    screen_dc: HDC,
    memory_dc: HDC,
    bitmap: HBITMAP,
}

impl Drop for CaptureResources {
    fn drop(&mut self) {
        unsafe {
            if !self.bitmap.is_invalid() {
                let _ = DeleteObject(self.bitmap);
            }
            if !self.memory_dc.is_invalid() {
                let _ = DeleteDC(self.memory_dc);
            }
            ReleaseDC(HWND::default(), self.screen_dc);
        }
    }
}

impl ScreenshotTaker for GdiScreenshotTaker {
    fn take_full_screenshot(&self) -> Result<Screenshot> {
        let (left, top, width, height) = unsafe {
            (
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };

        if width <= 0 || height <= 0 {
            return Err(KeycatError::Capture(format!(
                "invalid virtual screen size {}x{}",
                width, height
            )));
        }

        let screen_dc = unsafe { GetDC(HWND::default()) };
        if screen_dc.is_invalid() {
            return Err(KeycatError::Capture("GetDC failed".to_string()));
        }

        let mut resources = CaptureResources {
            screen_dc,
            memory_dc: HDC::default(),
            bitmap: HBITMAP::default(),
        };

        unsafe {
            resources.memory_dc = CreateCompatibleDC(screen_dc);
            if resources.memory_dc.is_invalid() {
                return Err(KeycatError::Capture("CreateCompatibleDC failed".to_string()));
            }

            resources.bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            if resources.bitmap.is_invalid() {
                return Err(KeycatError::Capture(
                    "CreateCompatibleBitmap failed".to_string(),
                ));
            }

            let previous = SelectObject(resources.memory_dc, resources.bitmap);

            let blit = BitBlt(
                resources.memory_dc,
                0,
                0,
                width,
                height,
                screen_dc,
                left,
                top,
                SRCCOPY,
            );

            SelectObject(resources.memory_dc, previous);
            blit.map_err(|e| KeycatError::Capture(format!("BitBlt failed: {}", e)))?;
        }

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height requests top-down rows
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        let lines = unsafe {
            GetDIBits(
                resources.memory_dc,
                resources.bitmap,
                0,
                height as u32,
                Some(pixels.as_mut_ptr() as *mut c_void),
                &mut info,
                DIB_RGB_COLORS,
            )
        };

        if lines != height {
            return Err(KeycatError::Capture(format!(
                "GetDIBits copied {} of {} lines",
                lines, height
            )));
        }

        drop(resources);

        let screenshot = Screenshot::new(width as u32, height as u32, pixels);
        tracing::debug!(
            id = screenshot.id(),
            width,
            height,
            "Captured full-screen screenshot"
        );
        Ok(screenshot)
    }
}
