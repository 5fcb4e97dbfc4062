//! # Request Parameters
//!
//! A listing reads its state from two origins: structured tokens in the URL path and posted
//! form fields. [`ParameterSource`] merges them with a fixed precedence (URL first, then posted
//! fields, then the caller's default) and is the only place filters, sorting and paging read
//! raw input from.

pub mod url;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use url::{PAGE_PARAM, PathUrl};

/// A raw parameter value: a single string or a list of strings from a multi-valued form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

impl ParamValue {
    /// The value as a string slice, `None` for lists
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::List(_) => None,
        }
    }

    /// Blank values (empty string, a literal `0`, an empty list) count as unset
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Single(value) => value.is_empty() || value == "0",
            Self::List(values) => values.is_empty(),
        }
    }

    /// Every contained string, one for a single value
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::List(values) => values.as_slice(),
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Posted form fields, read-only once the request is parsed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields(HashMap<String, ParamValue>);

impl FormFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Build fields from a JSON object body.
    ///
    /// Strings, numbers and booleans become single values; arrays of those become lists.
    /// Nulls, nested objects and non-object bodies are ignored.
    #[must_use]
    pub fn from_json(body: &serde_json::Value) -> Self {
        let Some(object) = body.as_object() else {
            return Self::default();
        };

        let fields = object
            .iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    serde_json::Value::Array(items) => {
                        ParamValue::List(items.iter().filter_map(json_scalar).collect())
                    }
                    other => ParamValue::Single(json_scalar(other)?),
                };
                Some((name.clone(), value))
            })
            .collect();

        Self(fields)
    }
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl<K, V> FromIterator<(K, V)> for FormFields
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Merged view over the listing URL and the posted fields of one request
#[derive(Debug, Clone, Default)]
pub struct ParameterSource {
    url: PathUrl,
    posted: FormFields,
}

impl ParameterSource {
    #[must_use]
    pub fn new(url: PathUrl, posted: FormFields) -> Self {
        Self { url, posted }
    }

    /// Source backed by a URL alone
    #[must_use]
    pub fn from_url(url: PathUrl) -> Self {
        Self::new(url, FormFields::default())
    }

    /// URL value if present, else the posted value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.url
            .get(name)
            .map(ParamValue::from)
            .or_else(|| self.posted.get(name).cloned())
    }

    /// Like [`ParameterSource::get`], falling back to `default`
    #[must_use]
    pub fn get_or(&self, name: &str, default: impl Into<ParamValue>) -> ParamValue {
        self.get(name).unwrap_or_else(|| default.into())
    }

    #[must_use]
    pub fn url(&self) -> &PathUrl {
        &self.url
    }

    #[must_use]
    pub fn posted(&self) -> &FormFields {
        &self.posted
    }

    /// Independent copy of the URL for building derived links
    #[must_use]
    pub fn clone_url(&self) -> PathUrl {
        self.url.clone()
    }

    /// Explicit mutation of the canonical URL, reserved for the context's own setters
    pub(crate) fn url_mut(&mut self) -> &mut PathUrl {
        &mut self.url
    }
}
