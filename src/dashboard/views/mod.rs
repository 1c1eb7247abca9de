//! Window views

pub mod scanner;

pub use scanner::{render_image_panel, render_text_panel};
