//! Scanner window
//!
//! Toolbar on top, image preview in the middle, read-only text panel below.

pub mod app;
pub mod components;
pub mod state;
pub mod theme;
pub mod views;

pub use app::{run_scanner, Startup};
