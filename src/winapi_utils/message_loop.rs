//! Windows message pump.
//!
//! Low-level hooks are serviced through the message queue of the thread
//! that installed them, so that thread has to sit in [`run_message_loop`]
//! for as long as the hooks are active.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW, TranslateMessage, MSG,
    PM_NOREMOVE, WM_QUIT,
};

/// Id of the thread running the message loop; 0 when none is running.
static LOOP_THREAD_ID: AtomicU32 = AtomicU32::new(0);

/// Pumps messages on the calling thread until `WM_QUIT` arrives.
///
/// Returns immediately if `quit` is already set, so a quit requested
/// before the loop started is not lost.
pub fn run_message_loop(quit: &AtomicBool) {
    let thread_id = unsafe { GetCurrentThreadId() };

    // Make sure the thread has a queue before publishing its id
    let mut msg = MSG::default();
    unsafe {
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
    }
    LOOP_THREAD_ID.store(thread_id, Ordering::SeqCst);

    // A quit posted from here on reaches the queue; one requested earlier
    // only set the flag
    if quit.load(Ordering::SeqCst) {
        LOOP_THREAD_ID.store(0, Ordering::SeqCst);
        tracing::debug!("Quit requested before message loop started");
        return;
    }

    tracing::debug!(thread_id, "Message loop starting");

    unsafe {
        // 0 means WM_QUIT, -1 an error; both end the loop
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    LOOP_THREAD_ID.store(0, Ordering::SeqCst);
    tracing::debug!("Message loop exited");
}

/// Asks the message loop to exit. Safe to call from any thread, including
/// a Ctrl+C handler.
///
/// Sets `quit` first so a loop that has not started yet exits on entry.
pub fn post_quit_message(quit: &AtomicBool, exit_code: i32) {
    quit.store(true, Ordering::SeqCst);
    let thread_id = LOOP_THREAD_ID.load(Ordering::SeqCst);
    if thread_id == 0 {
        tracing::debug!("Message loop not running yet, quit flag set");
        return;
    }

    let result = unsafe {
        PostThreadMessageW(thread_id, WM_QUIT, WPARAM(exit_code as usize), LPARAM(0))
    };

    match result {
        Ok(_) => tracing::debug!(exit_code, thread_id, "Posted quit message"),
        Err(e) => tracing::error!(?e, "Failed to post quit message"),
    }
}
