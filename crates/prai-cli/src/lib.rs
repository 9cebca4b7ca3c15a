// Library interface for prai-cli, shared by the binary and integration tests.

pub mod commands;
pub mod render;

pub use commands::{handle_command, CommandResult};
