//! keycat - keyboard state and click capture core.
//!
//! Normalizes raw keyboard and mouse hook callbacks into ordered
//! pressed-key state and screenshot-enriched click events, and delivers
//! them to an [`events::EventReceiver`].

pub mod capture;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod monitor;
pub mod store;
#[cfg(windows)]
pub mod winapi_utils;

pub use error::{KeycatError, Result};
