//! Culina command-line application.
//!
//! Wires storage, the inventory, the scan pipeline and the chat session to
//! the HTTP backend, and exposes each CLI command as a function.

pub mod app;
pub mod cli;
pub mod commands;
pub mod photo;

pub use app::App;
pub use cli::CliArgs;
