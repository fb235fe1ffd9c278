//! Management client speaking the Jolokia JSON-over-HTTP protocol.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::mbeans::connection::{ConnectionError, ManagementConnection, ManagementConnector};
use crate::mbeans::object_name::ObjectName;
use crate::mbeans::value::{AttributeValue, Scalar};

pub struct JolokiaConnector {
    timeout: Duration,
}

impl JolokiaConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ManagementConnector for JolokiaConnector {
    fn connect(&self, address: &str) -> Result<Box<dyn ManagementConnection>> {
        let connection = JolokiaConnection::open(address, self.timeout)?;
        Ok(Box::new(connection))
    }

    fn supports(&self, address: &str) -> bool {
        is_http(address)
    }
}

fn is_http(address: &str) -> bool {
    address.starts_with("http://") || address.starts_with("https://")
}

pub struct JolokiaConnection {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct JolokiaResponse {
    status: i64,
    #[serde(default)]
    value: Value,
    error: Option<String>,
}

impl JolokiaConnection {
    /// Checks the address and asks the agent for its version, so that an
    /// unreachable endpoint fails here rather than on the first read.
    pub fn open(address: &str, timeout: Duration) -> Result<Self, ConnectionError> {
        if !is_http(address) {
            return Err(ConnectionError::UnsupportedAddress(address.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ConnectionError::Http {
                url: address.to_string(),
                source,
            })?;
        let connection = Self {
            client,
            url: address.to_string(),
        };

        let version = connection.request(&json!({ "type": "version" }))?;
        debug!(
            "Connected to {} (agent {})",
            address,
            version["agent"].as_str().unwrap_or("unknown")
        );
        Ok(connection)
    }

    fn request(&self, body: &Value) -> Result<Value, ConnectionError> {
        let http_error = |source| ConnectionError::Http {
            url: self.url.clone(),
            source,
        };

        let response: JolokiaResponse = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .map_err(http_error)?
            .json()
            .map_err(http_error)?;

        if response.status != 200 {
            return Err(ConnectionError::Remote {
                status: response.status,
                message: response.error.unwrap_or_default(),
            });
        }
        Ok(response.value)
    }
}

impl ManagementConnection for JolokiaConnection {
    fn query_names(&self) -> Result<Vec<ObjectName>> {
        let value = self.request(&json!({ "type": "search", "mbean": "*:*" }))?;
        let names = value
            .as_array()
            .ok_or_else(|| ConnectionError::Decode(format!("search returned {}", value)))?;

        names
            .iter()
            .map(|name| {
                let name = name
                    .as_str()
                    .ok_or_else(|| ConnectionError::Decode(format!("bean name {}", name)))?;
                name.parse::<ObjectName>()
                    .with_context(|| format!("Invalid bean name {}", name))
            })
            .collect()
    }

    fn attribute_names(&self, bean: &ObjectName) -> Result<Vec<String>> {
        let value = self.request(&json!({ "type": "list", "path": list_path(bean) }))?;
        Ok(value
            .get("attr")
            .and_then(Value::as_object)
            .map(|attributes| attributes.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read_attribute(&self, bean: &ObjectName, attribute: &str) -> Result<AttributeValue> {
        let value = self.request(&json!({
            "type": "read",
            "mbean": bean.as_str(),
            "attribute": attribute,
        }))?;
        Ok(decode_value(value))
    }
}

/// `list` paths are `/` separated; `!` escapes `/` and itself.
fn list_path(bean: &ObjectName) -> String {
    let escape = |part: &str| part.replace('!', "!!").replace('/', "!/");
    let (domain, properties) = bean.as_str().split_once(':').unwrap_or((bean.as_str(), ""));
    format!("{}/{}", escape(domain), escape(properties))
}

pub fn decode_value(value: Value) -> AttributeValue {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(long) => AttributeValue::long(long),
            None => AttributeValue::double(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => AttributeValue::text(text),
        Value::Bool(flag) => AttributeValue::Scalar(Scalar::Bool(flag)),
        Value::Null => AttributeValue::text("null"),
        Value::Array(items) => {
            let rows = !items.is_empty() && items.iter().all(Value::is_object);
            let items = items.into_iter().map(decode_value).collect();
            if rows {
                AttributeValue::Tabular(items)
            } else {
                AttributeValue::Array(items)
            }
        }
        Value::Object(fields) => AttributeValue::Composite(
            fields
                .into_iter()
                .map(|(field, value)| (field, decode_value(value)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}
