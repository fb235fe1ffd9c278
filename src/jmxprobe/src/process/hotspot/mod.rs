//! `ProcessSource` for HotSpot compatible JVMs on Linux: jvmstat perfdata
//! files for discovery, the dynamic attach socket for everything else.

pub mod attach;
pub mod perfdata;
pub mod properties;

use anyhow::{anyhow, bail, Context, Result};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

use crate::config::{AttachConfig, Config};
use crate::constants::PERFDATA_DIR_PREFIX;
use crate::process::source::{AttachedProcess, MonitoredProcess, ProcessSource, Properties, SelfMarker};
use attach::{listener_socket, AttachSession};

pub struct HotSpotProcessSource {
    attach: AttachConfig,
    command_line_counter: String,
    connector_address_counter: String,
    marker: RefCell<Option<SelfMarker>>,
}

impl HotSpotProcessSource {
    pub fn new(config: &Config) -> Self {
        Self {
            attach: config.attach.clone(),
            command_line_counter: config.perfdata_command_line_counter.clone(),
            connector_address_counter: config.perfdata_connector_address_counter.clone(),
            marker: RefCell::new(None),
        }
    }

    /// Every `hsperfdata_<user>` directory readable by us.
    fn perfdata_dirs(&self) -> Result<Vec<PathBuf>> {
        let tmp = Path::new(&self.attach.tmp_dir);
        let entries = fs::read_dir(tmp).with_context(|| format!("Failed to read {}", tmp.display()))?;

        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with(PERFDATA_DIR_PREFIX)
            })
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect())
    }

    /// Keeps the pids whose attach listener is already running. Starting a
    /// listener takes a `SIGQUIT`, which a `java` that is not HotSpot answers
    /// with a thread dump, so discovery never does it.
    fn with_listener(&self, pids: impl IntoIterator<Item = u32>) -> Vec<u32> {
        let mut pids: Vec<u32> = pids
            .into_iter()
            .filter(|pid| listener_socket(&self.attach.tmp_dir, *pid).exists())
            .collect();
        pids.sort_unstable();
        pids
    }

    fn perfdata_file(&self, pid: u32) -> Result<PathBuf> {
        self.perfdata_dirs()?
            .into_iter()
            .map(|dir| dir.join(pid.to_string()))
            .find(|path| path.is_file())
            .ok_or_else(|| anyhow!("No perfdata file for {}", pid))
    }
}

fn is_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    // EPERM means the process exists but belongs to someone else
    matches!(kill(Pid::from_raw(raw), None), Ok(()) | Err(Errno::EPERM))
}

impl ProcessSource for HotSpotProcessSource {
    fn monitored_pids(&self) -> Result<Vec<u32>> {
        let mut pids = Vec::new();
        for dir in self.perfdata_dirs()? {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("Skipping {}: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.filter_map(|entry| entry.ok()) {
                let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else {
                    continue;
                };
                if is_alive(pid) {
                    pids.push(pid);
                } else {
                    debug!("Skipping stale perfdata file {}", entry.path().display());
                }
            }
        }
        pids.sort_unstable();
        pids.dedup();
        Ok(pids)
    }

    fn probe(&self, pid: u32) -> Result<MonitoredProcess> {
        let path = self.perfdata_file(pid)?;
        let data = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let perfdata = perfdata::decode(&data)
            .with_context(|| format!("Failed to decode {}", path.display()))?;

        Ok(MonitoredProcess {
            pid,
            command_line: perfdata.text(&self.command_line_counter).map(str::to_string),
            address: perfdata
                .text(&self.connector_address_counter)
                .filter(|address| !address.is_empty())
                .map(str::to_string),
        })
    }

    fn attachable_pids(&self) -> Result<Vec<u32>> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        let named = system
            .processes()
            .iter()
            .filter(|(_, process)| process.name() == self.attach.executable.as_str())
            .map(|(pid, _)| pid.as_u32());
        Ok(self.with_listener(named))
    }

    fn attach(&self, pid: u32) -> Result<Box<dyn AttachedProcess>> {
        if pid == std::process::id() {
            return Ok(Box::new(SelfView {
                pid,
                marker: self.marker.borrow().clone(),
            }));
        }
        let session = AttachSession::attach(pid, &self.attach)
            .with_context(|| format!("Failed to attach to {}", pid))?;
        Ok(Box::new(session))
    }

    fn plant_marker(&self, marker: &SelfMarker) {
        *self.marker.borrow_mut() = Some(marker.clone());
    }

    fn clear_marker(&self) {
        self.marker.borrow_mut().take();
    }
}

/// What attaching to our own process reveals: only the planted marker.
struct SelfView {
    pid: u32,
    marker: Option<SelfMarker>,
}

impl AttachedProcess for SelfView {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn system_properties(&self) -> Result<Properties> {
        Ok(self
            .marker
            .iter()
            .map(|marker| (marker.property.clone(), marker.token.clone()))
            .collect())
    }

    fn agent_properties(&self) -> Result<Properties> {
        Ok(Properties::new())
    }

    fn load_agent(&self, _bundle: &Path, _options: &str) -> Result<()> {
        bail!("{} is not a JVM", self.pid)
    }
}
