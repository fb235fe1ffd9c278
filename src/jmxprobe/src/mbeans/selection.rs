use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{compile_pattern, ProbeError};
use crate::mbeans::object_name::ObjectName;

/// A bean name regexp and the optional attribute regexp that follows it on
/// the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternPair {
    pub bean: String,
    pub attribute: Option<String>,
}

impl PatternPair {
    pub fn new(bean: impl Into<String>, attribute: Option<&str>) -> Self {
        Self {
            bean: bean.into(),
            attribute: attribute.map(str::to_string),
        }
    }

    /// Groups the arguments following the process selector two by two; an
    /// odd trailing argument is a bean regexp without attribute regexp.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Vec<PatternPair> {
        args.chunks(2)
            .map(|pair| {
                let attribute = pair.get(1).map(|attribute| attribute.as_ref());
                PatternPair::new(pair[0].as_ref(), attribute)
            })
            .collect()
    }
}

/// Which attributes of a selected bean to read.
#[derive(Debug, Clone)]
pub enum AttributeFilter {
    All,
    Matching(Regex),
}

impl AttributeFilter {
    pub fn matches(&self, attribute: &str) -> bool {
        match self {
            AttributeFilter::All => true,
            AttributeFilter::Matching(pattern) => pattern.is_match(attribute),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeFilter::All => None,
            AttributeFilter::Matching(pattern) => Some(pattern.as_str()),
        }
    }
}

impl PartialEq for AttributeFilter {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for AttributeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("*"))
    }
}

/// The beans to read from, each with its attribute filter. Built once and
/// reused by every pass.
pub type Selection = BTreeMap<ObjectName, AttributeFilter>;

/// Applies the pairs in order to the catalog. A bean matched by several
/// pairs keeps the filter of the last one.
pub fn select_beans(pairs: &[PatternPair], catalog: &[ObjectName]) -> Result<Selection, ProbeError> {
    let mut selection = Selection::new();
    for pair in pairs {
        let bean_pattern = compile_pattern(&pair.bean)?;
        let filter = match &pair.attribute {
            Some(attribute) => AttributeFilter::Matching(compile_pattern(attribute)?),
            None => AttributeFilter::All,
        };

        for bean in catalog.iter().filter(|bean| bean_pattern.is_match(bean.as_str())) {
            selection.insert(bean.clone(), filter.clone());
        }
    }
    Ok(selection)
}
