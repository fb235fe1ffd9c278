use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ProbeError;
use crate::mbeans::{list_beans, select_beans, ManagementConnector, PatternPair};
use crate::output::{OutputOptions, Pacer, WatchLoop};
use crate::process::{
    list_processes, print_process_list, select_process, EndpointActivator, ProcessSource,
    SelfExclusion, SelfMarker,
};

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Print every visible JVM.
    List,
    Probe(ProbeRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub selector: String,
    /// Empty when only the bean names are wanted.
    pub pairs: Vec<PatternPair>,
    pub options: OutputOptions,
    pub watch: Option<Duration>,
}

/// Wires the capabilities together: discovery, selection, activation,
/// connection, extraction and output.
pub struct Pipeline<'a> {
    pub source: &'a dyn ProcessSource,
    pub connector: &'a dyn ManagementConnector,
    pub config: &'a Config,
    pub marker: SelfMarker,
}

impl Pipeline<'_> {
    pub fn run(
        &self,
        request: &Request,
        out: &mut dyn Write,
        pacer: &dyn Pacer,
    ) -> Result<(), ProbeError> {
        match request {
            Request::List => self.list(out),
            Request::Probe(probe) => self.probe(probe, out, pacer),
        }
    }

    pub fn list(&self, out: &mut dyn Write) -> Result<(), ProbeError> {
        let processes = list_processes(self.source, &self.config.agent.address_property);
        print_process_list(out, processes.values())?;
        Ok(())
    }

    pub fn probe(
        &self,
        request: &ProbeRequest,
        out: &mut dyn Write,
        pacer: &dyn Pacer,
    ) -> Result<(), ProbeError> {
        let processes = list_processes(self.source, &self.config.agent.address_property);
        let exclusion = SelfExclusion {
            program_identifier: self.config.program_identifier.clone(),
            watch_flag: self.config.watch_flag.clone(),
            marker: self.marker.clone(),
        };
        let mut process = select_process(&request.selector, &processes, self.source, &exclusion, out)?;
        info!("Selected {}", process);

        let address = EndpointActivator::new(self.source, &self.config.agent)
            .ensure_active(&mut process, self.connector)?;

        // held until we return, dropping it closes the connection
        let connection = self
            .connector
            .connect(&address)
            .map_err(|e| ProbeError::Connection {
                address: address.clone(),
                source: e.into(),
            })?;

        let beans = list_beans(connection.as_ref()).map_err(|e| ProbeError::Connection {
            address: address.clone(),
            source: e.into(),
        })?;

        if request.pairs.is_empty() {
            for bean in &beans {
                writeln!(out, "{}", bean)?;
            }
            out.flush()?;
            return Ok(());
        }

        let selection = select_beans(&request.pairs, &beans)?;
        if selection.is_empty() {
            return Err(ProbeError::NoBeanMatch {
                process: process.to_string(),
            });
        }
        debug!("Selected {} of {} MBean(s)", selection.len(), beans.len());

        WatchLoop {
            connection: connection.as_ref(),
            selection: &selection,
            options: request.options,
            interval: request.watch,
            process: process.to_string(),
        }
        .run(out, pacer)
    }
}
