//! # Configuration
//!
//! Process-wide settings, read once from the environment at startup and
//! then overridden by command-line flags.

mod controller;
mod server;

pub use controller::ControllerConfig;
pub use server::ServerConfig;
