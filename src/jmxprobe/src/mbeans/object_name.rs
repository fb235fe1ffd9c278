use std::fmt;
use std::str::FromStr;

/// Canonical name of a management bean: `domain:key=value[,key=value]*`.
///
/// Names compare by their string form, which is also the order the catalog
/// reports them in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectName(String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ObjectNameError {
    #[error("missing domain separator in {0:?}")]
    MissingDomain(String),
    #[error("empty domain in {0:?}")]
    EmptyDomain(String),
    #[error("no key=value property in {0:?}")]
    NoProperty(String),
    #[error("malformed property {property:?} in {name:?}")]
    MalformedProperty { name: String, property: String },
}

impl ObjectName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectName {
    type Err = ObjectNameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let (domain, properties) = name
            .split_once(':')
            .ok_or_else(|| ObjectNameError::MissingDomain(name.to_string()))?;
        if domain.is_empty() {
            return Err(ObjectNameError::EmptyDomain(name.to_string()));
        }
        if properties.is_empty() {
            return Err(ObjectNameError::NoProperty(name.to_string()));
        }
        // quoted values may contain commas, so only the overall shape is checked
        for property in split_properties(properties) {
            match property.split_once('=') {
                Some((key, _)) if !key.is_empty() => {}
                _ => {
                    return Err(ObjectNameError::MalformedProperty {
                        name: name.to_string(),
                        property: property.to_string(),
                    })
                }
            }
        }
        Ok(Self(name.to_string()))
    }
}

fn split_properties(properties: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (index, c) in properties.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&properties[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&properties[start..]);
    parts
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::single("java.lang:type=Memory")]
    #[case::several("java.lang:type=GarbageCollector,name=G1 Young Generation")]
    #[case::quoted("kafka.server:type=app-info,id=\"a,b\"")]
    #[case::other_domain("jolokia:type=Config")]
    fn test_valid_names(#[case] name: &str) {
        let parsed: ObjectName = name.parse().unwrap();
        assert_eq!(parsed.as_str(), name);
    }

    #[rstest]
    #[case::no_colon("java.lang", ObjectNameError::MissingDomain("java.lang".into()))]
    #[case::empty_domain(":type=Memory", ObjectNameError::EmptyDomain(":type=Memory".into()))]
    #[case::no_property("java.lang:", ObjectNameError::NoProperty("java.lang:".into()))]
    fn test_invalid_names(#[case] name: &str, #[case] expected: ObjectNameError) {
        assert_eq!(name.parse::<ObjectName>().unwrap_err(), expected);
    }

    #[test]
    fn test_malformed_property() {
        let error = "java.lang:type".parse::<ObjectName>().unwrap_err();
        assert!(matches!(error, ObjectNameError::MalformedProperty { .. }));
    }

    #[test]
    fn test_names_order_by_string_form() {
        let mut names: Vec<ObjectName> = [
            "java.lang:type=Threading",
            "JMImplementation:type=MBeanServerDelegate",
            "java.lang:type=GarbageCollector,name=PS Scavenge",
        ]
        .iter()
        .map(|name| name.parse().unwrap())
        .collect();
        names.sort();

        assert_eq!(
            names.iter().map(ObjectName::as_str).collect::<Vec<_>>(),
            vec![
                "JMImplementation:type=MBeanServerDelegate",
                "java.lang:type=GarbageCollector,name=PS Scavenge",
                "java.lang:type=Threading",
            ]
        );
    }
}
