use crate::config::{AgentConfig, AttachConfig, Config};
use crate::constants::{
    AGENT_BUNDLE_NAME, AGENT_BUNDLE_SUBPATHS, AGENT_OPTIONS, ATTACHABLE_EXECUTABLE,
    ATTACH_POLL_INTERVAL_MS, ATTACH_TIMEOUT_MS, ATTACH_TMP_DIR, HTTP_TIMEOUT_MS,
    LOCAL_CONNECTOR_ADDRESS, PERFDATA_COMMAND_LINE_COUNTER, PERFDATA_CONNECTOR_ADDRESS_COUNTER,
    PROGRAM_IDENTIFIER, WATCH_FLAG,
};

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            bundle_name: AGENT_BUNDLE_NAME.to_string(),
            bundle_subpaths: AGENT_BUNDLE_SUBPATHS.iter().map(|s| s.to_string()).collect(),
            bundle_path: None,
            options: AGENT_OPTIONS.to_string(),
            address_property: LOCAL_CONNECTOR_ADDRESS.to_string(),
        }
    }
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            timeout_ms: ATTACH_TIMEOUT_MS,
            poll_interval_ms: ATTACH_POLL_INTERVAL_MS,
            tmp_dir: ATTACH_TMP_DIR.to_string(),
            executable: ATTACHABLE_EXECUTABLE.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            attach: AttachConfig::default(),

            perfdata_command_line_counter: PERFDATA_COMMAND_LINE_COUNTER.to_string(),
            perfdata_connector_address_counter: PERFDATA_CONNECTOR_ADDRESS_COUNTER.to_string(),

            http_timeout_ms: HTTP_TIMEOUT_MS,

            program_identifier: PROGRAM_IDENTIFIER.to_string(),
            watch_flag: WATCH_FLAG.to_string(),
        }
    }
}
