//! TUI module for Squad Board
//!
//! Terminal dashboard using Ratatui.

mod app;
mod backend;
mod form;
pub mod log_capture;
mod ui;

pub use app::run;
