use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    AGENT_BUNDLE_NAME, AGENT_BUNDLE_SUBPATHS, AGENT_OPTIONS, ATTACHABLE_EXECUTABLE,
    ATTACH_POLL_INTERVAL_MS, ATTACH_TIMEOUT_MS, ATTACH_TMP_DIR, HTTP_TIMEOUT_MS,
    LOCAL_CONNECTOR_ADDRESS, PERFDATA_COMMAND_LINE_COUNTER, PERFDATA_CONNECTOR_ADDRESS_COUNTER,
    PROGRAM_IDENTIFIER, WATCH_FLAG,
};
use config::Config as RConfig;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Config {
    pub agent: AgentConfig,
    pub attach: AttachConfig,

    pub perfdata_command_line_counter: String,
    pub perfdata_connector_address_counter: String,

    pub http_timeout_ms: u64,

    pub program_identifier: String,
    pub watch_flag: String,
}

/// How a management agent gets loaded into a JVM that has none running.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AgentConfig {
    pub bundle_name: String,
    pub bundle_subpaths: Vec<String>,
    /// Explicit bundle location; skips the search under `java.home`.
    pub bundle_path: Option<String>,
    pub options: String,
    pub address_property: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AttachConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub tmp_dir: String,
    pub executable: String,
}

impl AttachConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl AgentConfig {
    /// Whether the operator picked the bundle or the published property
    /// instead of the platform management agent.
    pub fn is_customised(&self) -> bool {
        self.bundle_path.is_some() || self.address_property != LOCAL_CONNECTOR_ADDRESS
    }
}

impl Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

/// Values taken from the command line; they win over every default.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub agent_path: Option<String>,
    pub agent_options: Option<String>,
    pub address_property: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_config(overrides: &ConfigOverrides) -> Result<Config> {
        // no config file and no environment: defaults, then the command line
        let mut builder = RConfig::builder();

        builder = builder
            .set_default("agent.bundle_name", AGENT_BUNDLE_NAME)?
            .set_default::<&str, Vec<&str>>("agent.bundle_subpaths", AGENT_BUNDLE_SUBPATHS.to_vec())?
            .set_default("agent.options", AGENT_OPTIONS)?
            .set_default("agent.address_property", LOCAL_CONNECTOR_ADDRESS)?
            .set_default("attach.timeout_ms", ATTACH_TIMEOUT_MS)?
            .set_default("attach.poll_interval_ms", ATTACH_POLL_INTERVAL_MS)?
            .set_default("attach.tmp_dir", ATTACH_TMP_DIR)?
            .set_default("attach.executable", ATTACHABLE_EXECUTABLE)?
            .set_default("perfdata_command_line_counter", PERFDATA_COMMAND_LINE_COUNTER)?
            .set_default(
                "perfdata_connector_address_counter",
                PERFDATA_CONNECTOR_ADDRESS_COUNTER,
            )?
            .set_default("http_timeout_ms", HTTP_TIMEOUT_MS)?
            .set_default("program_identifier", PROGRAM_IDENTIFIER)?
            .set_default("watch_flag", WATCH_FLAG)?;

        builder = builder
            .set_override_option("agent.bundle_path", overrides.agent_path.clone())?
            .set_override_option("agent.options", overrides.agent_options.clone())?
            .set_override_option("agent.address_property", overrides.address_property.clone())?;

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("failed to assemble configuration")?;

        Ok(config)
    }
}
