mod config_loader;
mod defaults;

pub use config_loader::{AgentConfig, AttachConfig, Config, ConfigLoader, ConfigOverrides};
