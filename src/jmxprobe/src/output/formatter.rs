use itertools::Itertools;
use std::fmt;
use std::io::{self, Write};

use crate::mbeans::{AttributeValue, Leaf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Append the bean name to every line.
    pub long: bool,
    /// Prefix every line with the epoch seconds of the pass.
    pub timestamp: bool,
}

/// Only numbers are reported: numeric scalars, and non-empty arrays made of
/// numeric scalars only.
pub fn is_reportable(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::Scalar(scalar) => scalar.is_numeric(),
        AttributeValue::Array(items) => {
            !items.is_empty() && items.iter().all(AttributeValue::is_numeric_scalar)
        }
        AttributeValue::Tabular(_) | AttributeValue::Composite(_) => false,
    }
}

/// One output line, without its newline.
pub struct OutputLine<'a> {
    pub timestamp: Option<i64>,
    pub leaf: &'a Leaf,
    pub long: bool,
}

impl fmt::Display for OutputLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(timestamp) = self.timestamp {
            write!(f, "{}\t", timestamp)?;
        }
        match &self.leaf.value {
            AttributeValue::Array(items) => write!(
                f,
                "{}",
                items
                    .iter()
                    .filter_map(|item| match item {
                        AttributeValue::Scalar(scalar) => Some(scalar),
                        _ => None,
                    })
                    .join("\t")
            )?,
            AttributeValue::Scalar(scalar) => write!(f, "{}\t{}", self.leaf.name, scalar)?,
            // never reportable, see `is_reportable`
            AttributeValue::Tabular(_) | AttributeValue::Composite(_) => {
                write!(f, "{}", self.leaf.name)?
            }
        }
        if self.long {
            write!(f, "\t{}", self.leaf.bean)?;
        }
        Ok(())
    }
}

/// Writes the reportable leaves, flushing after every line so that a reader
/// at the other end of a pipe sees each value as soon as it is read.
/// Returns how many lines were written.
pub fn write_leaves(
    out: &mut dyn Write,
    leaves: &[Leaf],
    options: OutputOptions,
    now: i64,
) -> io::Result<usize> {
    let timestamp = options.timestamp.then_some(now);
    let mut written = 0;
    for leaf in leaves.iter().filter(|leaf| is_reportable(&leaf.value)) {
        let line = OutputLine {
            timestamp,
            leaf,
            long: options.long,
        };
        writeln!(out, "{}", line)?;
        out.flush()?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mbeans::{ObjectName, Scalar};
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn leaf(name: &str, value: AttributeValue) -> Leaf {
        Leaf {
            bean: "d:type=X".parse::<ObjectName>().unwrap(),
            name: name.to_string(),
            value,
        }
    }

    #[rstest]
    #[case::long(AttributeValue::long(3), true)]
    #[case::double(AttributeValue::double(0.5), true)]
    #[case::numbers(AttributeValue::Array(vec![AttributeValue::long(1), AttributeValue::double(2.5)]), true)]
    #[case::text(AttributeValue::text("3"), false)]
    #[case::boolean(AttributeValue::Scalar(Scalar::Bool(true)), false)]
    #[case::texts(AttributeValue::Array(vec![AttributeValue::text("a")]), false)]
    #[case::mixed(AttributeValue::Array(vec![AttributeValue::long(1), AttributeValue::text("a")]), false)]
    #[case::empty_array(AttributeValue::Array(vec![]), false)]
    #[case::composite(AttributeValue::Composite(BTreeMap::new()), false)]
    #[case::tabular(AttributeValue::Tabular(vec![AttributeValue::long(1)]), false)]
    fn test_is_reportable(#[case] value: AttributeValue, #[case] expected: bool) {
        assert_eq!(is_reportable(&value), expected);
    }

    #[rstest]
    #[case::plain(OutputOptions::default(), "Foo\t3\n")]
    #[case::long(OutputOptions { long: true, timestamp: false }, "Foo\t3\td:type=X\n")]
    #[case::timestamp(OutputOptions { long: false, timestamp: true }, "1700000000\tFoo\t3\n")]
    #[case::long_timestamp(OutputOptions { long: true, timestamp: true }, "1700000000\tFoo\t3\td:type=X\n")]
    fn test_scalar_lines(#[case] options: OutputOptions, #[case] expected: &str) {
        let mut out: Vec<u8> = Vec::new();
        let written = write_leaves(&mut out, &[leaf("Foo", AttributeValue::long(3))], options, 1_700_000_000).unwrap();

        assert_eq!(written, 1);
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_array_line_has_no_leaf_name() {
        let mut out: Vec<u8> = Vec::new();
        let values = AttributeValue::Array(vec![
            AttributeValue::long(1),
            AttributeValue::double(2.0),
            AttributeValue::long(3),
        ]);
        write_leaves(&mut out, &[leaf("Values", values)], OutputOptions::default(), 0).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1\t2.0\t3\n");
    }

    #[test]
    fn test_non_numeric_leaves_are_dropped() {
        let leaves = [
            leaf("Name", AttributeValue::text("G1 Old Gen")),
            leaf("Valid", AttributeValue::Scalar(Scalar::Bool(true))),
            leaf("CollectionCount", AttributeValue::long(12)),
        ];
        let mut out: Vec<u8> = Vec::new();
        let written = write_leaves(&mut out, &leaves, OutputOptions::default(), 0).unwrap();

        assert_eq!(written, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "CollectionCount\t12\n");
    }
}
