//! Field extraction from HTML
//!
//! Rules are compiled once at startup; a malformed CSS selector is a
//! configuration error, never a per-page one.

use crate::config::SelectorRule;
use crate::output::{utc_timestamp, Record, TIMESTAMP_KEY};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Separator between the values of a field that matched several elements
pub const VALUE_SEPARATOR: &str = "|";

#[derive(Debug, Clone)]
struct CompiledRule {
    name: String,
    selector: Selector,
    attribute: Option<String>,
}

/// Applies the configured selector rules to fetched pages
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Vec<CompiledRule>,
}

impl Extractor {
    /// Compiles every rule's CSS selector
    ///
    /// # Returns
    ///
    /// * `Ok(Extractor)` - All selectors compiled
    /// * `Err(ConfigError::InvalidCss)` - The first rule whose selector is malformed
    pub fn new(rules: &[SelectorRule]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let selector =
                    Selector::parse(&rule.css).map_err(|e| ConfigError::InvalidCss {
                        name: rule.name.clone(),
                        message: e.to_string(),
                    })?;
                Ok(CompiledRule {
                    name: rule.name.clone(),
                    selector,
                    attribute: rule.attribute.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { rules })
    }

    /// Builds the record for one page
    ///
    /// Every configured field is present in the result; a selector that
    /// matches nothing yields an empty string.
    pub fn extract(&self, url: &str, html: &str, include_timestamp: bool) -> Record {
        let document = Html::parse_document(html);

        let mut record = Record::new(url);
        if include_timestamp {
            record.insert(TIMESTAMP_KEY, utc_timestamp());
        }

        for rule in &self.rules {
            let values: Vec<String> = document
                .select(&rule.selector)
                .map(|element| match &rule.attribute {
                    Some(attr) => element.value().attr(attr).unwrap_or("").to_string(),
                    None => stripped_text(element),
                })
                .filter(|value| !value.is_empty())
                .collect();

            record.insert(rule.name.clone(), values.join(VALUE_SEPARATOR));
        }

        record
    }
}

/// Concatenates the element's text nodes, each trimmed, skipping blank ones
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}
