//! Terminal user interface for the Vita chat, using Ratatui.

mod app;
mod compose;
mod messages;
mod ui;

pub use app::run;
