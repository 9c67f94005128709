//! Command-line interface module.

mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{handle_config, handle_serve};
