// src/contract/extra.rs

//! Extra input fields a plugin asks for beyond login and password.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SyncError};

fn default_pattern() -> String {
    ".*".to_string()
}

/// Description of one extra field of a portal or credential form.
///
/// ```toml
/// [[plugin.demo.credential_format]]
/// code = "canteen"
/// name = "Canteen number"
/// pattern = "[0-9]{4}"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraFormat {
    /// Key the value is stored under.
    pub code: String,
    /// Human readable label.
    pub name: String,
    /// Regex the whole value has to match.
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Allowed values; empty means free text.
    #[serde(default, alias = "values_list")]
    pub values_list: Vec<String>,
}

impl ExtraFormat {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            pattern: default_pattern(),
            description: None,
            values_list: Vec::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.values_list = values.into_iter().map(Into::into).collect();
        self
    }

    /// Compile the pattern anchored at both ends.
    pub fn compiled_pattern(&self) -> Result<Regex> {
        Regex::new(&format!("^(?:{})$", self.pattern)).map_err(|e| {
            SyncError::ConfigError(format!(
                "extra format '{}' has invalid pattern '{}': {e}",
                self.code, self.pattern
            ))
        })
    }

    /// Check a user supplied value against the pattern and the value list.
    pub fn validate(&self, value: &str) -> Result<bool> {
        if !self.compiled_pattern()?.is_match(value) {
            return Ok(false);
        }
        Ok(self.values_list.is_empty() || self.values_list.iter().any(|v| v == value))
    }

    pub fn list_to_json(formats: &[ExtraFormat]) -> Result<String> {
        Ok(serde_json::to_string_pretty(formats)?)
    }

    pub fn list_from_json(json: &str) -> Result<Vec<ExtraFormat>> {
        Ok(serde_json::from_str(json)?)
    }
}
