use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Long(i64),
    Double(f64),
    Text(String),
    Bool(bool),
}

impl Scalar {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Long(_) | Scalar::Double(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Long(value) => write!(f, "{}", value),
            // `{:?}` keeps the fractional part of whole numbers: 3.0, not 3
            Scalar::Double(value) => write!(f, "{:?}", value),
            Scalar::Text(value) => f.write_str(value),
            Scalar::Bool(value) => write!(f, "{}", value),
        }
    }
}

/// What reading an attribute can yield.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Scalar(Scalar),
    Array(Vec<AttributeValue>),
    /// Rows of a table, in the order the endpoint reported them.
    Tabular(Vec<AttributeValue>),
    /// Fields of a structured value, ordered by field name.
    Composite(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn long(value: i64) -> Self {
        AttributeValue::Scalar(Scalar::Long(value))
    }

    pub fn double(value: f64) -> Self {
        AttributeValue::Scalar(Scalar::Double(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        AttributeValue::Scalar(Scalar::Text(value.into()))
    }

    pub fn is_numeric_scalar(&self) -> bool {
        matches!(self, AttributeValue::Scalar(scalar) if scalar.is_numeric())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::long(Scalar::Long(-12), "-12")]
    #[case::whole_double(Scalar::Double(3.0), "3.0")]
    #[case::double(Scalar::Double(0.25), "0.25")]
    #[case::text(Scalar::Text("G1 Old Gen".into()), "G1 Old Gen")]
    #[case::boolean(Scalar::Bool(true), "true")]
    fn test_scalar_display(#[case] scalar: Scalar, #[case] expected: &str) {
        assert_eq!(scalar.to_string(), expected);
    }

    #[rstest]
    #[case::long(AttributeValue::long(1), true)]
    #[case::double(AttributeValue::double(1.5), true)]
    #[case::text(AttributeValue::text("1"), false)]
    #[case::boolean(AttributeValue::Scalar(Scalar::Bool(false)), false)]
    #[case::array(AttributeValue::Array(vec![AttributeValue::long(1)]), false)]
    fn test_numeric_scalar(#[case] value: AttributeValue, #[case] expected: bool) {
        assert_eq!(value.is_numeric_scalar(), expected);
    }
}
