//! Output records
//!
//! One record is produced per attempted URL. Keys keep their insertion order
//! (`url`, `timestamp`, then fields or `error`) so JSON-Lines output reads the
//! way the rules were written.

use crate::crawler::FetchFailure;
use chrono::Utc;
use serde::ser::{Serialize, SerializeMap, Serializer};

pub const URL_KEY: &str = "url";
pub const TIMESTAMP_KEY: &str = "timestamp";
pub const ERROR_KEY: &str = "error";

/// Current UTC time, second precision, ISO-8601 with a `Z` suffix
pub fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// A flat mapping from field name to a single string value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Creates a record holding only the `url` key
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            fields: vec![(URL_KEY.to_string(), url.into())],
        }
    }

    /// Creates the record for a URL that produced no content
    pub fn failed(url: impl Into<String>, failure: &FetchFailure, include_timestamp: bool) -> Self {
        let mut record = Self::new(url);
        if include_timestamp {
            record.insert(TIMESTAMP_KEY, utc_timestamp());
        }
        record.insert(ERROR_KEY, failure.to_string());
        record
    }

    /// Sets a field, replacing its value in place if the key already exists
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn url(&self) -> &str {
        self.get(URL_KEY).unwrap_or("")
    }

    /// The error classification, if this is an error record
    pub fn error(&self) -> Option<&str> {
        self.get(ERROR_KEY)
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
