//! Text telemetry lines
//!
//! A line is a sequence of tab-separated `key:value` pairs. Pairs whose value
//! does not parse as a number are kept in the raw text but not in `fields`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line received in text mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Line without its terminator
    pub text: String,
    /// Numeric `key:value` pairs; later duplicates win
    pub fields: BTreeMap<String, f64>,
}

impl TextLine {
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let fields = parse_fields(&text);
        Self { text, fields }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.fields.get(key).copied()
    }
}

/// Parse tab-separated `key:value` pairs.
pub fn parse_fields(line: &str) -> BTreeMap<String, f64> {
    let mut fields = BTreeMap::new();
    for part in line.split('\t') {
        let Some((key, value)) = part.split_once(':') else {
            continue;
        };
        if let Ok(parsed) = value.trim().parse::<f64>() {
            fields.insert(key.to_string(), parsed);
        }
    }
    fields
}
