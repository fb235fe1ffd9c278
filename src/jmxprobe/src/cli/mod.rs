pub mod commands;
mod process_command;

pub use commands::Cli;
pub use process_command::{process_args, process_command};
