//! Low-level hook installation.
//!
//! [`HookGuard`] owns one `WH_KEYBOARD_LL` or `WH_MOUSE_LL` hook and removes
//! it when dropped.

use windows::Win32::Foundation::HINSTANCE;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, HOOKPROC, WH_KEYBOARD_LL, WH_MOUSE_LL,
    WINDOWS_HOOK_ID,
};

/// RAII guard for an installed low-level hook.
///
/// The installing thread must pump messages (see
/// [`super::run_message_loop`]) or Windows silently removes the hook.
pub struct HookGuard {
    handle: HHOOK,
    hook_type: &'static str,
}

impl HookGuard {
    fn install(
        hook_id: WINDOWS_HOOK_ID,
        callback: HOOKPROC,
        hook_type: &'static str,
    ) -> windows::core::Result<Self> {
        let handle = unsafe {
            let module = GetModuleHandleW(None)?;
            SetWindowsHookExW(hook_id, callback, HINSTANCE(module.0), 0)?
        };
        tracing::info!(hook_type, "Hook installed");
        Ok(Self { handle, hook_type })
    }

    /// Installs a low-level keyboard hook for the whole session.
    pub fn install_keyboard_hook(callback: HOOKPROC) -> windows::core::Result<Self> {
        Self::install(WH_KEYBOARD_LL, callback, "keyboard_ll")
    }

    /// Installs a low-level mouse hook for the whole session.
    pub fn install_mouse_hook(callback: HOOKPROC) -> windows::core::Result<Self> {
        Self::install(WH_MOUSE_LL, callback, "mouse_ll")
    }

    pub fn handle(&self) -> HHOOK {
        self.handle
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        match unsafe { UnhookWindowsHookEx(self.handle) } {
            Ok(_) => tracing::info!(hook_type = self.hook_type, "Hook removed"),
            Err(e) => tracing::error!(
                hook_type = self.hook_type,
                error = ?e,
                "Failed to remove hook"
            ),
        }
    }
}
