//! Core input normalization.
//!
//! Listeners filter raw keyboard and mouse callbacks, the keyboard state
//! manager tracks held keys, and the dispatcher serializes delivery from
//! the OS hooks to both.

pub mod dispatch;
#[cfg(windows)]
pub mod input_hooks;
pub mod keyboard;
pub mod mouse;

pub use dispatch::*;
#[cfg(windows)]
pub use input_hooks::*;
pub use keyboard::*;
pub use mouse::*;
