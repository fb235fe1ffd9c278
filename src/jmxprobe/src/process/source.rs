use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use crate::constants::SELF_MARKER_PROPERTY;

/// Java system or agent properties of an attached process.
pub type Properties = BTreeMap<String, String>;

/// What the runtime monitoring facility knows about a process without
/// attaching to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredProcess {
    pub pid: u32,
    pub command_line: Option<String>,
    pub address: Option<String>,
}

/// Local process discovery and attach capability.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessSource {
    /// Pids published by the runtime monitoring facility.
    fn monitored_pids(&self) -> Result<Vec<u32>>;

    /// Reads the command line and published endpoint of a monitored pid.
    fn probe(&self, pid: u32) -> Result<MonitoredProcess>;

    /// Pids of every process an attach could be attempted on.
    fn attachable_pids(&self) -> Result<Vec<u32>>;

    /// Attaches to `pid`. The returned handle detaches when dropped.
    fn attach(&self, pid: u32) -> Result<Box<dyn AttachedProcess>>;

    /// Makes `marker` visible to anyone attaching to this very process.
    fn plant_marker(&self, marker: &SelfMarker);

    fn clear_marker(&self);
}

/// A live attach session with one process.
#[cfg_attr(test, mockall::automock)]
pub trait AttachedProcess {
    fn pid(&self) -> u32;

    fn system_properties(&self) -> Result<Properties>;

    fn agent_properties(&self) -> Result<Properties>;

    /// Loads a java agent bundle into the process.
    fn load_agent(&self, bundle: &Path, options: &str) -> Result<()>;
}

/// Reads the endpoint address the process published under `property`,
/// looking at the agent properties first and the system properties second.
pub fn published_address(process: &dyn AttachedProcess, property: &str) -> Result<Option<String>> {
    if let Some(address) = process.agent_properties()?.remove(property) {
        return Ok(Some(address));
    }
    Ok(process.system_properties()?.remove(property))
}

/// Token this run plants on itself so that it can recognise its own process
/// among the candidates of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfMarker {
    pub property: String,
    pub token: String,
}

impl SelfMarker {
    pub fn generate() -> Self {
        Self {
            property: SELF_MARKER_PROPERTY.to_string(),
            token: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_present_in(&self, properties: &Properties) -> bool {
        properties.get(&self.property) == Some(&self.token)
    }
}

/// Scoped marker planting: cleared again when the guard goes out of scope.
pub(crate) struct PlantedMarker<'a> {
    source: &'a dyn ProcessSource,
}

impl<'a> PlantedMarker<'a> {
    pub(crate) fn plant(source: &'a dyn ProcessSource, marker: &SelfMarker) -> Self {
        source.plant_marker(marker);
        Self { source }
    }
}

impl Drop for PlantedMarker<'_> {
    fn drop(&mut self) {
        self.source.clear_marker();
    }
}
