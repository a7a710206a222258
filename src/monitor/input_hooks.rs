//! Low-level hook procedures.
//!
//! The callbacks run synchronously in the Windows input pipeline, so they
//! only translate the hook message into a [`RawInput`] and push it onto the
//! dispatch channel. They never block on listeners and always call the next
//! hook in the chain.

use super::dispatch::RawInput;
use super::mouse::{LEFT_BUTTON, MIDDLE_BUTTON, RIGHT_BUTTON};
use once_cell::sync::OnceCell;
use std::sync::mpsc::{self, Receiver, Sender};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::GetKeyNameTextW;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, HC_ACTION, KBDLLHOOKSTRUCT, LLKHF_EXTENDED, MSLLHOOKSTRUCT, WM_KEYDOWN,
    WM_KEYUP, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_RBUTTONDOWN,
    WM_RBUTTONUP, WM_SYSKEYDOWN, WM_SYSKEYUP, WM_XBUTTONDOWN, WM_XBUTTONUP,
};

/// Channel the hook procedures publish to. Set once per process.
static INPUT_TX: OnceCell<Sender<RawInput>> = OnceCell::new();

/// Creates the hook channel and returns its receiving end.
///
/// Returns `None` if a channel was already installed.
pub fn install_input_channel() -> Option<Receiver<RawInput>> {
    let (tx, rx) = mpsc::channel();
    INPUT_TX.set(tx).ok()?;
    Some(rx)
}

fn publish(input: RawInput) {
    if let Some(tx) = INPUT_TX.get() {
        // A closed channel means dispatch has shut down; drop the input.
        let _ = tx.send(input);
    }
}

/// Human-readable key name for logging, e.g. "Ctrl" or "A".
fn key_name(info: &KBDLLHOOKSTRUCT) -> String {
    let mut lparam = (info.scanCode << 16) as i32;
    if info.flags.0 & LLKHF_EXTENDED.0 != 0 {
        lparam |= 1 << 24;
    }

    let mut buf = [0u16; 64];
    let len = unsafe { GetKeyNameTextW(lparam, &mut buf) };
    if len > 0 {
        String::from_utf16_lossy(&buf[..len as usize])
    } else {
        format!("VK_{:#04X}", info.vkCode)
    }
}

/// Low-level keyboard hook callback.
///
/// Key-down messages repeat while a key is held; the state manager
/// absorbs the repeats.
///
/// # Safety
/// Called by Windows on the thread running the message loop.
pub unsafe extern "system" fn keyboard_hook_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code == HC_ACTION as i32 {
        let pressed = match wparam.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => Some(true),
            WM_KEYUP | WM_SYSKEYUP => Some(false),
            _ => None,
        };

        if let Some(pressed) = pressed {
            let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
            publish(RawInput::Tap {
                code: info.vkCode,
                name: key_name(info),
                pressed,
            });
        }
    }

    CallNextHookEx(None, code, wparam, lparam)
}

/// Low-level mouse hook callback.
///
/// Button transitions are forwarded with ids 1 (left), 2 (right),
/// 3 (middle), 4 and 5 (extra buttons). Movement and wheel messages are
/// ignored.
///
/// # Safety
/// Called by Windows on the thread running the message loop.
pub unsafe extern "system" fn mouse_hook_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code == HC_ACTION as i32 {
        let info = &*(lparam.0 as *const MSLLHOOKSTRUCT);

        let transition = match wparam.0 as u32 {
            WM_LBUTTONDOWN => Some((LEFT_BUTTON, true)),
            WM_LBUTTONUP => Some((LEFT_BUTTON, false)),
            WM_RBUTTONDOWN => Some((RIGHT_BUTTON, true)),
            WM_RBUTTONUP => Some((RIGHT_BUTTON, false)),
            WM_MBUTTONDOWN => Some((MIDDLE_BUTTON, true)),
            WM_MBUTTONUP => Some((MIDDLE_BUTTON, false)),
            WM_XBUTTONDOWN => Some((xbutton_id(info.mouseData), true)),
            WM_XBUTTONUP => Some((xbutton_id(info.mouseData), false)),
            _ => None,
        };

        if let Some((button, pressed)) = transition {
            publish(RawInput::Click {
                x: info.pt.x,
                y: info.pt.y,
                button,
                pressed,
            });
        }
    }

    CallNextHookEx(None, code, wparam, lparam)
}

/// XBUTTON1 / XBUTTON2 live in the high word of `mouseData`.
fn xbutton_id(mouse_data: u32) -> u8 {
    MIDDLE_BUTTON.saturating_add(((mouse_data >> 16) & 0xFF) as u8)
}
