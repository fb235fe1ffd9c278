pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod mbeans;
pub mod message;
pub mod output;
pub mod pipeline;
pub mod process;

pub use error::{exit_codes, ProbeError};
pub use pipeline::{Pipeline, ProbeRequest, Request};
