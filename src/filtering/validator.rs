//! Value validation for filters.
//!
//! The kind of check is chosen when the filter is configured, never inferred from the stored
//! value later: a regular expression, a predicate, or nothing. An enumerated option set can be
//! layered on top of any of them.

use indexmap::IndexMap;
use regex::Regex;
use std::{fmt, sync::Arc};

use crate::params::ParamValue;

/// Predicate signature for [`Validator::Predicate`]
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Syntactic check applied to each raw value
#[derive(Clone, Default)]
pub enum Validator {
    /// Accept anything
    #[default]
    None,
    /// The value must match the expression
    Pattern(Regex),
    /// The predicate's answer is authoritative
    Predicate(Predicate),
}

impl Validator {
    /// Wrap a compiled expression
    #[must_use]
    pub fn pattern(regex: Regex) -> Self {
        Self::Pattern(regex)
    }

    /// Wrap a predicate closure
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Digits only, the usual check for numeric ids and ranges
    #[must_use]
    pub fn numeric() -> Self {
        Self::predicate(|value| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            Self::None => true,
            Self::Pattern(regex) => regex.is_match(value),
            Self::Predicate(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Enumerated values a filter may take, keyed like a `<select>` list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    entries: IndexMap<String, String>,
    match_values: bool,
}

impl FilterOptions {
    /// Options matched by key
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            match_values: false,
        }
    }

    /// Options given as a plain list, matched by value
    pub fn values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.into()))
            .collect();
        Self {
            entries,
            match_values: true,
        }
    }

    /// Match against option values instead of keys
    #[must_use]
    pub fn match_values(mut self, match_values: bool) -> Self {
        self.match_values = match_values;
        self
    }

    #[must_use]
    pub fn matches_values(&self) -> bool {
        self.match_values
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn contains(&self, value: &str) -> bool {
        if self.match_values {
            self.entries.values().any(|v| v == value)
        } else {
            self.entries.contains_key(value)
        }
    }
}

/// Full validation rule of one filter
#[derive(Debug, Clone, Default)]
pub(crate) struct ValueCheck {
    pub(crate) validator: Validator,
    pub(crate) options: Option<FilterOptions>,
    pub(crate) max_length: Option<usize>,
}

impl ValueCheck {
    /// Validate a raw value; lists validate element-wise
    pub(crate) fn validate(&self, value: &ParamValue) -> bool {
        match value {
            ParamValue::Single(value) => self.validate_str(value),
            ParamValue::List(values) => values.iter().all(|v| self.validate_str(v)),
        }
    }

    pub(crate) fn validate_str(&self, value: &str) -> bool {
        if self.max_length.is_some_and(|max| value.len() > max) {
            return false;
        }

        if let Some(options) = self.options.as_ref().filter(|o| !o.is_empty())
            && (value.is_empty() || !options.contains(value))
        {
            return false;
        }

        self.validator.accepts(value)
    }
}
