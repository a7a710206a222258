//! Safe wrappers around Windows API calls.
//!
//! This module provides safe Rust abstractions over the low-level hook
//! and message loop functions the input hooks depend on.

pub mod hooks;
pub mod message_loop;

pub use hooks::*;
pub use message_loop::*;
