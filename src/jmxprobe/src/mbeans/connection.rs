use anyhow::Result;

use crate::mbeans::object_name::ObjectName;
use crate::mbeans::value::AttributeValue;

/// An open session with a management endpoint. Closed when dropped.
#[cfg_attr(test, mockall::automock)]
pub trait ManagementConnection {
    /// Every bean registered on the endpoint, in no particular order.
    fn query_names(&self) -> Result<Vec<ObjectName>>;

    /// Names of the readable attributes of `bean`.
    fn attribute_names(&self, bean: &ObjectName) -> Result<Vec<String>>;

    fn read_attribute(&self, bean: &ObjectName, attribute: &str) -> Result<AttributeValue>;
}

/// Opens connections to endpoint addresses.
#[cfg_attr(test, mockall::automock)]
pub trait ManagementConnector {
    fn connect(&self, address: &str) -> Result<Box<dyn ManagementConnection>>;

    /// Whether `connect` understands the scheme of `address` at all.
    fn supports(&self, address: &str) -> bool;
}

/// Failures of the bundled management client.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("unsupported connector address {0}")]
    UnsupportedAddress(String),

    #[error("HTTP request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("the endpoint answered {status}: {message}")]
    Remote { status: i64, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}
