//! Turning leaves into metric lines, once or on an interval.

pub mod formatter;
pub mod pacer;
pub mod watch;

pub use formatter::{is_reportable, write_leaves, OutputLine, OutputOptions};
pub use pacer::{install_shutdown_handlers, shutdown_requested, Pacer, SystemPacer};
pub use watch::WatchLoop;
