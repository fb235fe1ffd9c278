//! Discovery of local JVMs, resolution of the user's selector to exactly one
//! of them, and activation of its management endpoint.

pub mod activator;
pub mod hotspot;
pub mod registry;
pub mod selector;
pub mod source;
pub mod types;

pub use activator::EndpointActivator;
pub use hotspot::HotSpotProcessSource;
pub use registry::list_processes;
pub use selector::{select_process, SelfExclusion};
pub use source::{AttachedProcess, MonitoredProcess, ProcessSource, Properties, SelfMarker};
pub use types::{print_process_list, ManagedProcess, ProcessTable};
