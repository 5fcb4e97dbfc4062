//! Structured path URLs of the form `/segment/segment/key:value/key:value/`.
//!
//! Listing state lives in the path rather than in the query string, so a listing URL is a plain
//! sequence of path segments followed by an ordered set of `key:value` tokens. Keys are unique;
//! setting an existing key replaces its value in place and keeps its position.

use axum::{extract::FromRequestParts, http::request::Parts};
use indexmap::IndexMap;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::{convert::Infallible, fmt};

/// Reserved parameter holding the 1-based page number
pub const PAGE_PARAM: &str = "page";

/// Characters escaped inside a segment, key or value
const TOKEN: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, TOKEN).to_string()
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// A listing URL: path segments plus ordered `key:value` parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathUrl {
    segments: Vec<String>,
    params: IndexMap<String, String>,
}

impl PathUrl {
    /// Create a URL from plain path segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            params: IndexMap::new(),
        }
    }

    /// Parse a request path such as `/hello/name:123/id_from:10/`.
    ///
    /// Anything after `?` or `#` is ignored. A token containing `:` with a non-empty key becomes a
    /// parameter, every other token is a path segment. Tokens are percent-decoded.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut url = Self::default();

        for token in path.split('/').filter(|t| !t.is_empty()) {
            match token.split_once(':') {
                Some((key, value)) if !key.is_empty() => {
                    url.params.insert(decode(key), decode(value));
                }
                _ => url.segments.push(decode(token)),
            }
        }

        url
    }

    /// Builder-style parameter setter
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Path segments preceding the parameters
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Parameter value by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Parameter value by name, or `default` when absent
    #[must_use]
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Parameters in URL order
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set a parameter; an existing key keeps its position
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.params.shift_remove(name);
        self
    }

    /// Drop every parameter, keeping the path segments
    pub fn strip_parameters(&mut self) -> &mut Self {
        self.params.clear();
        self
    }

    /// Current page number; absent, malformed or non-positive values mean page 1
    #[must_use]
    pub fn page(&self) -> u64 {
        self.get(PAGE_PARAM)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(|page| u64::try_from(page).ok())
            .filter(|&page| page > 0)
            .unwrap_or(1)
    }

    /// Canonical text form, always starting and ending with `/`
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::from("/");
        for segment in &self.segments {
            out.push_str(&encode(segment));
            out.push('/');
        }
        for (key, value) in &self.params {
            out.push_str(&encode(key));
            out.push(':');
            out.push_str(&encode(value));
            out.push('/');
        }
        out
    }
}

impl fmt::Display for PathUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Extracts the listing URL from the raw request path.
///
/// The path is read before any query-string handling so colons inside tokens survive.
impl<S> FromRequestParts<S> for PathUrl
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::parse(parts.uri.path()))
    }
}
