use tracing::{debug, warn};

use crate::process::source::{published_address, ProcessSource};
use crate::process::types::{ManagedProcess, ProcessTable};

/// Lists every JVM the source can see.
///
/// Processes published by the monitoring facility come first; attachable
/// processes it missed are added afterwards with their pid as name. A
/// process that cannot be probed is logged and left out, it never aborts the
/// listing.
pub fn list_processes(source: &dyn ProcessSource, address_property: &str) -> ProcessTable {
    let mut processes = ProcessTable::new();

    match source.monitored_pids() {
        Ok(pids) => {
            for pid in pids {
                match source.probe(pid) {
                    Ok(monitored) => {
                        let name = monitored.command_line.unwrap_or_default();
                        processes.insert(pid, ManagedProcess::new(pid, name, monitored.address));
                    }
                    Err(e) => warn!("Ignoring monitored process {}: {:#}", pid, e),
                }
            }
        }
        Err(e) => warn!("Failed to list monitored processes: {:#}", e),
    }

    match source.attachable_pids() {
        Ok(pids) => {
            for pid in pids {
                if processes.contains_key(&pid) {
                    continue;
                }
                let address = source
                    .attach(pid)
                    .and_then(|attached| published_address(attached.as_ref(), address_property));
                match address {
                    Ok(address) => {
                        processes.insert(pid, ManagedProcess::new(pid, pid.to_string(), address));
                    }
                    Err(e) => warn!("Could not attach to {}: {:#}", pid, e),
                }
            }
        }
        Err(e) => warn!("Failed to list attachable processes: {:#}", e),
    }

    debug!("Discovered {} JVM(s)", processes.len());
    processes
}
