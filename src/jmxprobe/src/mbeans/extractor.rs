use tracing::debug;

use crate::mbeans::connection::ManagementConnection;
use crate::mbeans::object_name::ObjectName;
use crate::mbeans::selection::Selection;
use crate::mbeans::value::AttributeValue;

/// One flattened value, named after the attribute it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub bean: ObjectName,
    pub name: String,
    pub value: AttributeValue,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub leaves: Vec<Leaf>,
    /// Attributes whose name passed the filter, whether or not they could be
    /// read.
    pub matched_attributes: usize,
}

/// Reads every selected attribute and flattens the values.
///
/// Nothing in here is fatal: a bean that cannot be described or an
/// attribute that cannot be read is logged and skipped.
pub fn extract(connection: &dyn ManagementConnection, selection: &Selection) -> Extraction {
    let mut extraction = Extraction::default();

    for (bean, filter) in selection {
        let attributes = match connection.attribute_names(bean) {
            Ok(attributes) => attributes,
            Err(e) => {
                debug!("Failed to describe {}: {:#}", bean, e);
                continue;
            }
        };

        for attribute in attributes.iter().filter(|attribute| filter.matches(attribute)) {
            extraction.matched_attributes += 1;
            match connection.read_attribute(bean, attribute) {
                Ok(value) => flatten(bean, attribute, value, &mut extraction.leaves),
                Err(e) => debug!("Skipping {} of {}: {:#}", attribute, bean, e),
            }
        }
    }

    debug!(
        "{} attribute(s) matched, {} leaf value(s) read",
        extraction.matched_attributes,
        extraction.leaves.len()
    );
    extraction
}

/// Splits tables into rows and structured values into fields, one level
/// deep.
pub fn flatten(bean: &ObjectName, attribute: &str, value: AttributeValue, leaves: &mut Vec<Leaf>) {
    let leaf = |name: String, value: AttributeValue| Leaf {
        bean: bean.clone(),
        name,
        value,
    };

    match value {
        AttributeValue::Tabular(rows) => leaves.extend(
            rows.into_iter()
                .enumerate()
                .map(|(index, row)| leaf(format!("{}.{}", attribute, index), row)),
        ),
        AttributeValue::Composite(fields) => leaves.extend(
            fields
                .into_iter()
                .map(|(field, value)| leaf(format!("{}.{}", attribute, field), value)),
        ),
        value => leaves.push(leaf(attribute.to_string(), value)),
    }
}
