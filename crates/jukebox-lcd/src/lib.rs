//! Incremental-redraw remote control for a 160×128 LCD.

pub mod backend;
pub mod controller;
pub mod dirty;
pub mod display;
pub mod error;
pub mod failure_log;
pub mod frame;
pub mod keys;
pub mod render;
pub mod state;
pub mod theme;

pub use controller::{Controller, Settings};
pub use error::{UiError, UiResult};
