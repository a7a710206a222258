//! Mouse click filtering and event creation.

use crate::capture::ScreenshotTaker;
use crate::config::CaptureMode;
use crate::error::Result;
use crate::events::{EventReceiver, MouseEvent};
use std::sync::Arc;

/// Button id reported by the hook for the left mouse button.
pub const LEFT_BUTTON: u8 = 1;
pub const RIGHT_BUTTON: u8 = 2;
pub const MIDDLE_BUTTON: u8 = 3;

/// Builds a [`MouseEvent`] for a qualifying click.
pub trait MouseEventCreator: Send + Sync {
    fn get_mouse_event(&self, x: i32, y: i32) -> Result<MouseEvent>;
}

/// Creates events without any screenshot.
#[derive(Debug, Default)]
pub struct NullMouseEventCreator;

impl MouseEventCreator for NullMouseEventCreator {
    fn get_mouse_event(&self, x: i32, y: i32) -> Result<MouseEvent> {
        Ok(MouseEvent::new(x, y, None))
    }
}

/// Captures the whole screen for every event it creates.
pub struct FullscreenMouseEventCreator<S> {
    screenshot_taker: S,
}

impl<S: ScreenshotTaker> FullscreenMouseEventCreator<S> {
    pub fn new(screenshot_taker: S) -> Self {
        Self { screenshot_taker }
    }
}

impl<S: ScreenshotTaker> MouseEventCreator for FullscreenMouseEventCreator<S> {
    fn get_mouse_event(&self, x: i32, y: i32) -> Result<MouseEvent> {
        let screenshot = self.screenshot_taker.take_full_screenshot()?;
        Ok(MouseEvent::new(x, y, Some(screenshot)))
    }
}

/// Picks the creator variant for the configured capture mode.
pub fn build_mouse_event_creator(
    mode: CaptureMode,
    screenshot_taker: Arc<dyn ScreenshotTaker>,
) -> Arc<dyn MouseEventCreator> {
    match mode {
        CaptureMode::None => Arc::new(NullMouseEventCreator),
        CaptureMode::Fullscreen => Arc::new(FullscreenMouseEventCreator::new(screenshot_taker)),
    }
}

/// Filters raw clicks down to left-button presses.
///
/// Anything else (releases, other buttons) is dropped before the creator
/// runs, so no screenshot is taken for irrelevant input.
pub struct MouseEventListener {
    creator: Arc<dyn MouseEventCreator>,
    receiver: Arc<dyn EventReceiver>,
}

impl MouseEventListener {
    pub fn new(creator: Arc<dyn MouseEventCreator>, receiver: Arc<dyn EventReceiver>) -> Self {
        Self { creator, receiver }
    }

    /// Handles one raw button transition.
    pub fn click(&self, x: i32, y: i32, button: u8, pressed: bool) -> Result<()> {
        if button != LEFT_BUTTON || !pressed {
            return Ok(());
        }

        let event = self.creator.get_mouse_event(x, y)?;
        tracing::trace!(x, y, "Left click");
        self.receiver.receive_mouse_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::StubScreenshotTaker;
    use crate::capture::Screenshot;
    use crate::error::KeycatError;
    use crate::events::tests::RecordingReceiver;
    use std::sync::Mutex;

    /// Creator double that records its arguments. Attaches a fixed
    /// screenshot so its events can be told apart from
    /// ones built elsewhere.
    struct RecordingCreator {
        calls: Mutex<Vec<(i32, i32)>>,
        image: Screenshot,
    }

    impl Default for RecordingCreator {
        fn default() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                image: Screenshot::new(1, 1, vec![0; 4]),
            }
        }
    }

    impl MouseEventCreator for RecordingCreator {
        fn get_mouse_event(&self, x: i32, y: i32) -> Result<MouseEvent> {
            self.calls.lock().unwrap().push((x, y));
            Ok(MouseEvent::new(x, y, Some(self.image.clone())))
        }
    }

    fn listener() -> (MouseEventListener, Arc<RecordingCreator>, Arc<RecordingReceiver>) {
        let creator = Arc::new(RecordingCreator::default());
        let receiver = Arc::new(RecordingReceiver::default());
        let listener = MouseEventListener::new(creator.clone(), receiver.clone());
        (listener, creator, receiver)
    }

    #[test]
    fn test_null_creator() {
        let event = NullMouseEventCreator.get_mouse_event(10, 15).unwrap();
        assert_eq!(event, MouseEvent::new(10, 15, None));
    }

    #[test]
    fn test_fullscreen_creator_captures_once() {
        let image = Screenshot::new(2, 2, vec![0; 16]);
        let taker = Arc::new(StubScreenshotTaker::returning(image.clone()));
        let creator = FullscreenMouseEventCreator::new(taker.clone());

        let event = creator.get_mouse_event(10, 15).unwrap();

        assert_eq!(taker.call_count(), 1);
        assert_eq!(event.click_x, 10);
        assert_eq!(event.click_y, 15);
        assert_eq!(event, MouseEvent::new(10, 15, Some(image)));
    }

    #[test]
    fn test_fullscreen_creator_propagates_capture_failure() {
        let taker = Arc::new(StubScreenshotTaker::failing());
        let creator = FullscreenMouseEventCreator::new(taker.clone());

        let result = creator.get_mouse_event(10, 15);

        assert!(matches!(result, Err(KeycatError::Capture(_))));
        assert_eq!(taker.call_count(), 1);
    }

    #[test]
    fn test_build_creator_by_mode() {
        let image = Screenshot::new(1, 1, vec![0; 4]);
        let taker = Arc::new(StubScreenshotTaker::returning(image));

        let none = build_mouse_event_creator(CaptureMode::None, taker.clone());
        assert!(none.get_mouse_event(1, 2).unwrap().screenshot.is_none());
        assert_eq!(taker.call_count(), 0);

        let full = build_mouse_event_creator(CaptureMode::Fullscreen, taker.clone());
        assert!(full.get_mouse_event(1, 2).unwrap().screenshot.is_some());
        assert_eq!(taker.call_count(), 1);
    }

    #[test]
    fn test_left_click_press() {
        let (listener, creator, receiver) = listener();

        listener.click(10, 15, LEFT_BUTTON, true).unwrap();

        assert_eq!(*creator.calls.lock().unwrap(), vec![(10, 15)]);
        assert_eq!(
            receiver.mouse(),
            vec![MouseEvent::new(10, 15, Some(creator.image.clone()))]
        );
    }

    #[test]
    fn test_left_click_release_is_ignored() {
        let (listener, creator, receiver) = listener();

        listener.click(10, 15, LEFT_BUTTON, false).unwrap();

        assert!(creator.calls.lock().unwrap().is_empty());
        assert!(receiver.mouse().is_empty());
    }

    #[test]
    fn test_right_click_press_is_ignored() {
        let (listener, creator, receiver) = listener();

        listener.click(10, 15, RIGHT_BUTTON, true).unwrap();

        assert!(creator.calls.lock().unwrap().is_empty());
        assert!(receiver.mouse().is_empty());
    }

    #[test]
    fn test_right_click_release_is_ignored() {
        let (listener, creator, receiver) = listener();

        listener.click(10, 15, RIGHT_BUTTON, false).unwrap();

        assert!(creator.calls.lock().unwrap().is_empty());
        assert!(receiver.mouse().is_empty());
    }

    #[test]
    fn test_other_buttons_are_ignored() {
        let (listener, creator, receiver) = listener();

        listener.click(10, 15, MIDDLE_BUTTON, true).unwrap();
        listener.click(10, 15, 0, true).unwrap();
        listener.click(10, 15, 5, true).unwrap();

        assert!(creator.calls.lock().unwrap().is_empty());
        assert!(receiver.mouse().is_empty());
    }

    #[test]
    fn test_capture_failure_reaches_no_receiver() {
        let taker = Arc::new(StubScreenshotTaker::failing());
        let receiver = Arc::new(RecordingReceiver::default());
        let listener = MouseEventListener::new(
            Arc::new(FullscreenMouseEventCreator::new(taker)),
            receiver.clone(),
        );

        let result = listener.click(10, 15, LEFT_BUTTON, true);

        assert!(matches!(result, Err(KeycatError::Capture(_))));
        assert!(receiver.mouse().is_empty());
    }

    #[test]
    fn test_receiver_failure_propagates() {
        let listener = MouseEventListener::new(
            Arc::new(NullMouseEventCreator),
            Arc::new(RecordingReceiver::failing()),
        );

        let result = listener.click(10, 15, LEFT_BUTTON, true);

        assert!(matches!(result, Err(KeycatError::Receiver(_))));
    }
}
