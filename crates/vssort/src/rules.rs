//! Sort rules and sort key extraction

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::xml::model::{Element, Node};

/// Tags reordered in a `.vssettings` file and the attributes that name them
pub const VSSETTINGS_RULES: &[(&str, &[&str])] = &[
    ("PropertyValue", &["name"]),
    ("ToolsOptionsCategory", &["name"]),
    ("ToolsOptionsSubCategory", &["name"]),
    ("Category", &["name", "GUID"]),
];

/// A tag and the candidate attributes tried in order for its sort key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortRule {
    pub tag: String,
    pub keys: Vec<String>,
}

impl SortRule {
    pub fn new<I, S>(tag: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag: tag.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for SortRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.tag, self.keys.join(","))
    }
}

/// Parses `Tag=attr1,attr2`
impl FromStr for SortRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, keys) = s
            .split_once('=')
            .ok_or_else(|| format!("expected TAG=ATTR[,ATTR...], got '{s}'"))?;
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(format!("missing tag name in '{s}'"));
        }
        let keys: Vec<String> = keys
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToString::to_string)
            .collect();
        if keys.is_empty() {
            return Err(format!("no attributes given for '{tag}'"));
        }
        Ok(Self::new(tag, keys))
    }
}

/// Table of sortable tags, read-only once built
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortRules {
    rules: IndexMap<String, Vec<String>>,
}

impl Default for SortRules {
    fn default() -> Self {
        Self::vssettings()
    }
}

impl SortRules {
    /// No sortable tags; sorting becomes a no-op
    pub fn empty() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }

    /// The rules for Visual Studio settings files
    pub fn vssettings() -> Self {
        VSSETTINGS_RULES
            .iter()
            .map(|(tag, keys)| SortRule::new(*tag, keys.iter().copied()))
            .fold(Self::empty(), Self::with_rule)
    }

    /// Add a rule, replacing any existing rule for the same tag
    pub fn with_rule(mut self, rule: SortRule) -> Self {
        self.rules.insert(rule.tag, rule.keys);
        self
    }

    pub fn is_sortable_tag(&self, tag: &str) -> bool {
        self.rules.contains_key(tag)
    }

    pub fn is_sortable(&self, node: &Node) -> bool {
        node.as_element()
            .is_some_and(|element| self.is_sortable_tag(&element.name))
    }

    /// Sort key for `element`, or `None` when its tag is not sortable.
    ///
    /// The key is the value of the first candidate attribute present, taken
    /// verbatim. An element carrying none of them gets `""` and so sorts
    /// ahead of its named siblings.
    pub fn key<'a>(&self, element: &'a Element) -> Option<&'a str> {
        let candidates = self.rules.get(&element.name)?;
        let key = candidates
            .iter()
            .find_map(|attr| element.attribute(attr))
            .unwrap_or_default();
        Some(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = SortRule> + '_ {
        self.rules
            .iter()
            .map(|(tag, keys)| SortRule::new(tag.as_str(), keys.iter().map(String::as_str)))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
