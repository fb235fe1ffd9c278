use itertools::Itertools;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

use crate::error::ProbeError;
use crate::mbeans::{extract, ManagementConnection, Selection};
use crate::output::formatter::{write_leaves, OutputOptions};
use crate::output::pacer::Pacer;

/// Runs extraction passes over a fixed selection, once or every `interval`.
pub struct WatchLoop<'a> {
    pub connection: &'a dyn ManagementConnection,
    pub selection: &'a Selection,
    pub options: OutputOptions,
    pub interval: Option<Duration>,
    /// Shown in the error when a pass yields nothing.
    pub process: String,
}

impl WatchLoop<'_> {
    /// Returns after the single pass, or once the pacer asks to stop. A pass
    /// that reports nothing ends the run with `NoAttributeMatch`, before any
    /// pause.
    pub fn run(&self, out: &mut dyn Write, pacer: &dyn Pacer) -> Result<(), ProbeError> {
        let mut pass = 0u64;
        loop {
            pass += 1;
            let extraction = extract(self.connection, self.selection);
            let written = write_leaves(out, &extraction.leaves, self.options, pacer.now())?;
            out.flush()?;
            debug!("Pass {} reported {} value(s)", pass, written);

            if written == 0 {
                return Err(ProbeError::NoAttributeMatch {
                    beans: self.selection.keys().join(", "),
                    process: self.process.clone(),
                });
            }

            let Some(interval) = self.interval else {
                return Ok(());
            };
            if !pacer.pause(interval) {
                debug!("Stopping after pass {}", pass);
                return Ok(());
            }
        }
    }
}
