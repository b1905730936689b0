//! Free-form rule strings accepted on the command line and in config files

use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

const ATTR_MARKER: &str = "::attr(";

/// A named field extraction rule: `name=CSS[::attr(x)]`
///
/// The CSS part is kept as text here; it is compiled (and its syntax checked)
/// by [`crate::crawler::Extractor::new`] during validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct SelectorRule {
    /// Output field name
    pub name: String,

    /// CSS selector with the attribute marker stripped
    pub css: String,

    /// Attribute to read instead of the element text
    pub attribute: Option<String>,
}

impl SelectorRule {
    pub fn new(name: impl Into<String>, css: impl Into<String>) -> Self {
        let (css, attribute) = split_attribute(&css.into());
        Self {
            name: name.into(),
            css,
            attribute,
        }
    }
}

/// Splits a trailing `::attr(name)` marker off a selector
fn split_attribute(selector: &str) -> (String, Option<String>) {
    if let Some(body) = selector.strip_suffix(')') {
        if let Some(idx) = body.rfind(ATTR_MARKER) {
            let attr = &body[idx + ATTR_MARKER.len()..];
            if !attr.is_empty() && !attr.contains(')') {
                return (body[..idx].trim().to_string(), Some(attr.trim().to_string()));
            }
        }
    }
    (selector.to_string(), None)
}

impl FromStr for SelectorRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, css) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidSelectorRule(s.to_string()))?;

        let name = name.trim();
        let css = css.trim();
        if name.is_empty() || css.is_empty() {
            return Err(ConfigError::InvalidSelectorRule(s.to_string()));
        }

        Ok(Self::new(name, css))
    }
}

impl TryFrom<String> for SelectorRule {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for SelectorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{}={}::attr({})", self.name, self.css, attr),
            None => write!(f, "{}={}", self.name, self.css),
        }
    }
}

/// An extra request header: `Name: Value`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

impl FromStr for HeaderPair {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidHeader(s.to_string()))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::InvalidHeader(s.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl TryFrom<String> for HeaderPair {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
