//! Reusable UI components for the scanner window

pub mod toolbar;

pub use toolbar::render_toolbar;
