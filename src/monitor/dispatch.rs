//! Serialized delivery of raw input to the listeners.
//!
//! OS hook callbacks must return quickly, so they only enqueue a
//! [`RawInput`]. A single worker thread drains the queue and drives the
//! listeners one input at a time, in arrival order. Screenshot capture and
//! receiver work therefore never run inside the hook itself.

use super::keyboard::{KeyboardListener, KeyboardStateManager};
use super::mouse::MouseEventListener;
use crate::error::Result;
use crate::events::KeyCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the worker checks the shutdown flag while idle.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One raw transition as reported by the OS hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    Tap {
        code: KeyCode,
        name: String,
        pressed: bool,
    },
    Click {
        x: i32,
        y: i32,
        button: u8,
        pressed: bool,
    },
}

/// Counters reported by the dispatch thread when it exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub taps: u64,
    pub clicks: u64,
    pub failures: u64,
}

/// Routes raw input to the keyboard or mouse listener.
pub struct InputDispatcher {
    keyboard: KeyboardListener,
    mouse: MouseEventListener,
    /// Held so outstanding keys can be released on shutdown.
    state: Arc<KeyboardStateManager>,
}

impl InputDispatcher {
    pub fn new(state: Arc<KeyboardStateManager>, mouse: MouseEventListener) -> Self {
        Self {
            keyboard: KeyboardListener::new(state.clone()),
            mouse,
            state,
        }
    }

    pub fn dispatch(&self, input: &RawInput) -> Result<()> {
        match input {
            RawInput::Tap {
                code,
                name,
                pressed,
            } => self.keyboard.tap(*code, name, *pressed),
            RawInput::Click {
                x,
                y,
                button,
                pressed,
            } => self.mouse.click(*x, *y, *button, *pressed),
        }
    }

    pub fn keyboard_state(&self) -> &KeyboardStateManager {
        &self.state
    }

    fn process(&self, input: &RawInput, stats: &mut DispatchStats) {
        match input {
            RawInput::Tap { .. } => stats.taps += 1,
            RawInput::Click { .. } => stats.clicks += 1,
        }

        if let Err(e) = self.dispatch(input) {
            stats.failures += 1;
            tracing::warn!(?input, error = %e, "Failed to dispatch input");
        }
    }

    /// Drains `rx` until it disconnects or `shutdown` is set.
    ///
    /// A failed input is logged and skipped; later inputs are still
    /// processed. Inputs already queued when shutdown is requested are
    /// still delivered. Held keys are released before returning.
    pub fn run(&self, rx: &Receiver<RawInput>, shutdown: &AtomicBool) -> DispatchStats {
        let mut stats = DispatchStats::default();

        while !shutdown.load(Ordering::Relaxed) {
            match rx.recv_timeout(SHUTDOWN_POLL_INTERVAL) {
                Ok(input) => self.process(&input, &mut stats),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        // The hooks may have queued transitions before the flag was seen
        let mut drained = 0u64;
        while let Ok(input) = rx.try_recv() {
            self.process(&input, &mut stats);
            drained += 1;
        }
        if drained > 0 {
            tracing::debug!(drained, "Delivered queued input after shutdown");
        }

        if let Err(e) = self.state.release_all() {
            tracing::warn!(error = %e, "Failed to release held keys on shutdown");
        }

        tracing::info!(
            taps = stats.taps,
            clicks = stats.clicks,
            failures = stats.failures,
            "Input dispatch stopped"
        );
        stats
    }
}

/// Spawns the worker thread that owns `dispatcher`.
pub fn spawn_dispatch_thread(
    rx: Receiver<RawInput>,
    dispatcher: InputDispatcher,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<DispatchStats> {
    thread::spawn(move || {
        tracing::debug!("Input dispatch thread started");
        dispatcher.run(&rx, &shutdown)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::StubScreenshotTaker;
    use crate::events::tests::RecordingReceiver;
    use crate::events::{KeyboardStateChangedEvent, MouseEvent};
    use crate::monitor::mouse::{FullscreenMouseEventCreator, NullMouseEventCreator};
    use std::sync::mpsc;

    fn dispatcher(receiver: Arc<RecordingReceiver>) -> InputDispatcher {
        let state = Arc::new(KeyboardStateManager::new(receiver.clone()));
        let mouse = MouseEventListener::new(Arc::new(NullMouseEventCreator), receiver);
        InputDispatcher::new(state, mouse)
    }

    fn tap(code: KeyCode, pressed: bool) -> RawInput {
        RawInput::Tap {
            code,
            name: format!("key{}", code),
            pressed,
        }
    }

    fn click(button: u8, pressed: bool) -> RawInput {
        RawInput::Click {
            x: 10,
            y: 15,
            button,
            pressed,
        }
    }

    #[test]
    fn test_dispatch_routes_inputs() {
        let receiver = Arc::new(RecordingReceiver::default());
        let dispatcher = dispatcher(receiver.clone());

        dispatcher.dispatch(&tap(37, true)).unwrap();
        dispatcher.dispatch(&click(1, true)).unwrap();
        dispatcher.dispatch(&click(1, false)).unwrap();

        assert_eq!(dispatcher.keyboard_state().get_pressed_keys(), vec![37]);
        assert_eq!(receiver.keyboard(), vec![KeyboardStateChangedEvent::new(vec![37])]);
        assert_eq!(receiver.mouse(), vec![MouseEvent::new(10, 15, None)]);
    }

    #[test]
    fn test_end_to_end_key_scenario() {
        let receiver = Arc::new(RecordingReceiver::default());
        let dispatcher = dispatcher(receiver.clone());

        for input in [
            tap(37, true),
            tap(30, true),
            tap(40, true),
            tap(37, false),
            tap(40, false),
        ] {
            dispatcher.dispatch(&input).unwrap();
        }

        let events = receiver.keyboard();
        assert_eq!(dispatcher.keyboard_state().get_pressed_keys(), vec![30]);
        assert_eq!(events.len(), 5);
        assert_eq!(events.last().unwrap().pressed_keys(), &[30]);
    }

    #[test]
    fn test_worker_processes_in_order_and_releases_on_disconnect() {
        let receiver = Arc::new(RecordingReceiver::default());
        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));

        for input in [tap(37, true), click(1, true), tap(30, true), click(2, true)] {
            tx.send(input).unwrap();
        }
        drop(tx);

        let handle = spawn_dispatch_thread(rx, dispatcher(receiver.clone()), shutdown);
        let stats = handle.join().unwrap();

        assert_eq!(
            stats,
            DispatchStats {
                taps: 2,
                clicks: 2,
                failures: 0
            }
        );
        assert_eq!(
            receiver.keyboard(),
            vec![
                KeyboardStateChangedEvent::new(vec![37]),
                KeyboardStateChangedEvent::new(vec![37, 30]),
                KeyboardStateChangedEvent::new(vec![]),
            ]
        );
        assert_eq!(receiver.mouse().len(), 1);
    }

    #[test]
    fn test_worker_survives_capture_failure() {
        let receiver = Arc::new(RecordingReceiver::default());
        let state = Arc::new(KeyboardStateManager::new(receiver.clone()));
        let mouse = MouseEventListener::new(
            Arc::new(FullscreenMouseEventCreator::new(Arc::new(
                StubScreenshotTaker::failing(),
            ))),
            receiver.clone(),
        );
        let dispatcher = InputDispatcher::new(state, mouse);
        let (tx, rx) = mpsc::channel();

        tx.send(click(1, true)).unwrap();
        tx.send(tap(37, true)).unwrap();
        drop(tx);

        let stats = dispatcher.run(&rx, &AtomicBool::new(false));

        assert_eq!(stats.failures, 1);
        assert!(receiver.mouse().is_empty());
        assert_eq!(receiver.keyboard().len(), 2);
    }

    #[test]
    fn test_queued_input_delivered_after_shutdown() {
        let receiver = Arc::new(RecordingReceiver::default());
        let dispatcher = dispatcher(receiver.clone());
        let (tx, rx) = mpsc::channel();

        tx.send(tap(37, true)).unwrap();
        tx.send(click(1, true)).unwrap();
        tx.send(click(1, true)).unwrap();

        let stats = dispatcher.run(&rx, &AtomicBool::new(true));

        assert_eq!(
            stats,
            DispatchStats {
                taps: 1,
                clicks: 2,
                failures: 0
            }
        );
        assert_eq!(receiver.mouse().len(), 2);
        assert_eq!(
            receiver.keyboard(),
            vec![
                KeyboardStateChangedEvent::new(vec![37]),
                KeyboardStateChangedEvent::new(vec![]),
            ]
        );
        drop(tx);
    }

    #[test]
    fn test_worker_stops_on_shutdown_flag() {
        let receiver = Arc::new(RecordingReceiver::default());
        let (tx, rx) = mpsc::channel::<RawInput>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = spawn_dispatch_thread(rx, dispatcher(receiver), Arc::clone(&shutdown));
        shutdown.store(true, Ordering::SeqCst);
        let stats = handle.join().unwrap();

        assert_eq!(stats, DispatchStats::default());
        drop(tx);
    }
}
