//! Everything that happens once a management endpoint is reachable: listing
//! its beans, choosing which of them to read, and reading them.

pub mod catalog;
pub mod connection;
pub mod extractor;
pub mod jolokia;
pub mod object_name;
pub mod selection;
pub mod value;

pub use catalog::list_beans;
pub use connection::{ConnectionError, ManagementConnection, ManagementConnector};
pub use extractor::{extract, Extraction, Leaf};
pub use jolokia::JolokiaConnector;
pub use object_name::ObjectName;
pub use selection::{select_beans, AttributeFilter, PatternPair, Selection};
pub use value::{AttributeValue, Scalar};
