use std::io::Write;
use tracing::{debug, warn};

use crate::error::{compile_pattern, ProbeError};
use crate::process::source::{PlantedMarker, ProcessSource, SelfMarker};
use crate::process::types::{print_process_list, ManagedProcess, ProcessTable};

/// Everything needed to recognise other instances of this tool, and this
/// very run, among the processes a selector matched.
///
/// Both checks are heuristics: an instance started without `--watch` is not
/// recognised by name, and a candidate exiting between the listing and the
/// attach is simply missed.
#[derive(Debug, Clone)]
pub struct SelfExclusion {
    pub program_identifier: String,
    pub watch_flag: String,
    pub marker: SelfMarker,
}

impl SelfExclusion {
    fn is_watching_instance(&self, process: &ManagedProcess) -> bool {
        process.name().contains(&self.watch_flag) && process.name().contains(&self.program_identifier)
    }

    fn is_this_process(&self, source: &dyn ProcessSource, process: &ManagedProcess) -> bool {
        let properties = source
            .attach(process.pid())
            .and_then(|attached| attached.system_properties());
        match properties {
            Ok(properties) => self.marker.is_present_in(&properties),
            Err(e) => {
                // a process we cannot attach to cannot be us
                warn!("Could not probe {} for self exclusion: {:#}", process, e);
                false
            }
        }
    }
}

/// Resolves `selector` (a pid, or a regexp searched in the process names) to
/// exactly one process.
///
/// When a regexp matches several processes they are listed on `out` before
/// failing, in the same `pid<TAB>name` format as `-l`.
pub fn select_process(
    selector: &str,
    processes: &ProcessTable,
    source: &dyn ProcessSource,
    exclusion: &SelfExclusion,
    out: &mut dyn Write,
) -> Result<ManagedProcess, ProbeError> {
    if let Ok(pid) = selector.parse::<i64>() {
        if pid < 2 {
            return Err(ProbeError::InvalidPid(pid));
        }
        return u32::try_from(pid)
            .ok()
            .and_then(|pid| processes.get(&pid))
            .cloned()
            .ok_or(ProbeError::PidNotFound(pid));
    }

    let pattern = compile_pattern(selector)?;
    let mut matches: Vec<&ManagedProcess> = processes
        .values()
        .filter(|process| pattern.is_match(process.name()))
        .collect();
    debug!("{} JVM(s) matched {:?} before self exclusion", matches.len(), selector);

    {
        let _planted = PlantedMarker::plant(source, &exclusion.marker);
        matches.retain(|process| {
            if exclusion.is_watching_instance(process) {
                debug!("Excluding watching instance {}", process);
                return false;
            }
            if exclusion.is_this_process(source, process) {
                debug!("Excluding ourselves: {}", process);
                return false;
            }
            true
        });
    }

    match matches.as_slice() {
        [] => Err(ProbeError::NoMatch(selector.to_string())),
        [process] => Ok((*process).clone()),
        _ => {
            print_process_list(out, matches.iter().copied())?;
            Err(ProbeError::Ambiguous {
                selector: selector.to_string(),
                count: matches.len(),
            })
        }
    }
}
