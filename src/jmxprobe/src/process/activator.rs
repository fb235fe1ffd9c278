use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::constants::JAVA_HOME_PROPERTY;
use crate::error::ProbeError;
use crate::mbeans::ManagementConnector;
use crate::process::source::{published_address, AttachedProcess, ProcessSource};
use crate::process::types::ManagedProcess;

/// Starts the management agent of a JVM that does not expose an endpoint yet.
pub struct EndpointActivator<'a> {
    source: &'a dyn ProcessSource,
    agent: &'a AgentConfig,
}

impl<'a> EndpointActivator<'a> {
    pub fn new(source: &'a dyn ProcessSource, agent: &'a AgentConfig) -> Self {
        Self { source, agent }
    }

    /// Returns the endpoint address of `process`, loading the management
    /// agent into it first when none is known. The address is recorded on
    /// `process`.
    ///
    /// A known address `connector` cannot use is replaced only when the
    /// agent configuration is customised; the platform agent would publish
    /// the same kind of address again.
    pub fn ensure_active(
        &self,
        process: &mut ManagedProcess,
        connector: &dyn ManagementConnector,
    ) -> Result<String, ProbeError> {
        if let Some(address) = process.address() {
            if connector.supports(address) || !self.agent.is_customised() {
                return Ok(address.to_string());
            }
            warn!(
                "{} publishes {}, which the client cannot use; loading the configured agent",
                process.pid(),
                address
            );
            process.forget_address();
        }

        info!("Starting the management agent of {}", process);
        let address = self
            .activate(process.pid())
            .map_err(|e| ProbeError::ActivationFailed {
                process: process.to_string(),
                source: e.into(),
            })?;

        debug!("{} now listens on {}", process.pid(), address);
        process.set_address(address.clone());
        Ok(address)
    }

    fn activate(&self, pid: u32) -> Result<String> {
        // the attach handle detaches on drop, whichever way we leave
        let attached = self.source.attach(pid)?;
        let bundle = self.bundle_for(attached.as_ref())?;

        attached
            .load_agent(&bundle, &self.agent.options)
            .with_context(|| format!("Failed to load {}", bundle.display()))?;

        published_address(attached.as_ref(), &self.agent.address_property)?.ok_or_else(|| {
            anyhow!(
                "The agent did not publish {} after loading {}",
                self.agent.address_property,
                bundle.display()
            )
        })
    }

    fn bundle_for(&self, attached: &dyn AttachedProcess) -> Result<PathBuf> {
        if let Some(path) = &self.agent.bundle_path {
            return Path::new(path)
                .canonicalize()
                .with_context(|| format!("Agent bundle {} is not accessible", path));
        }

        let home = attached
            .system_properties()?
            .remove(JAVA_HOME_PROPERTY)
            .ok_or_else(|| anyhow!("{} is not set", JAVA_HOME_PROPERTY))?;
        locate_bundle(Path::new(&home), self.agent)
    }
}

/// Looks for the agent bundle under each configured subdirectory of the
/// runtime's home, first hit wins.
pub fn locate_bundle(home: &Path, agent: &AgentConfig) -> Result<PathBuf> {
    agent
        .bundle_subpaths
        .iter()
        .map(|subpath| home.join(subpath).join(&agent.bundle_name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            anyhow!(
                "Couldn't find {} in {} or any of {:?}",
                agent.bundle_name,
                home.display(),
                agent.bundle_subpaths
            )
        })?
        .canonicalize()
        .context("Failed to canonicalize the agent bundle path")
}
