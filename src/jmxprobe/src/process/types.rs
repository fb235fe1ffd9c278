use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

/// A JVM visible on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedProcess {
    pid: u32,
    name: String,
    address: Option<String>,
}

/// Discovered processes keyed by pid.
pub type ProcessTable = BTreeMap<u32, ManagedProcess>;

impl ManagedProcess {
    /// Creates a process entry. An empty or blank name falls back to the pid.
    pub fn new(pid: u32, name: impl Into<String>, address: Option<String>) -> Self {
        let name = name.into();
        let name = if name.trim().is_empty() {
            pid.to_string()
        } else {
            name
        };
        Self { pid, name, address }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Records the endpoint address published after activation. An address,
    /// once known, is never replaced.
    pub(crate) fn set_address(&mut self, address: String) {
        if self.address.is_none() {
            self.address = Some(address);
        }
    }

    /// Drops a known address the client cannot use, so that activation
    /// may publish another one.
    pub(crate) fn forget_address(&mut self) -> Option<String> {
        self.address.take()
    }
}

impl fmt::Display for ManagedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "JVM({}, \"{}\", \"{}\")", self.pid, self.name, address),
            None => write!(f, "JVM({}, \"{}\", null)", self.pid, self.name),
        }
    }
}

/// Prints `pid<TAB>name` lines sorted by pid.
pub fn print_process_list<'a>(
    out: &mut dyn Write,
    processes: impl IntoIterator<Item = &'a ManagedProcess>,
) -> io::Result<()> {
    for process in processes.into_iter().sorted_by_key(|p| p.pid()) {
        writeln!(out, "{}\t{}", process.pid(), process.name())?;
    }
    out.flush()
}
