//! State shared between the command handlers and the window

pub mod state;

pub use state::{AppState, PendingDrag};
