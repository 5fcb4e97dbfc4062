use indexmap::{IndexMap, map::Entry};

use super::conditions::quote_key;
use crate::{
    core::{context::QueryContext, traits::RecordSource},
    errors::{NavigatorError, Result},
    models::OrderClause,
    params::{ParameterSource, PathUrl},
};

/// Reserved parameter holding the sort token
pub const ORDER_BY_PARAM: &str = "orderby";

/// Prefix marking a descending sort token
pub const DESCENDING_MARKER: char = '_';

/// Capitalize the first character of a column name
fn capitalize(column: &str) -> String {
    let mut chars = column.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// A sortable column offered by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortColumn {
    column: String,
    name: Option<String>,
    sql: Option<String>,
    ascending: bool,
    name_asc: Option<String>,
    name_desc: Option<String>,
}

impl SortColumn {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            name: None,
            sql: None,
            ascending: true,
            name_asc: None,
            name_desc: None,
        }
    }

    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Display label, defaulting to the capitalized column
    #[must_use]
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| capitalize(&self.column))
    }

    pub fn set_name(&mut self, name: Option<String>) -> &mut Self {
        self.name = name;
        self
    }

    /// Per-direction label templates; `{name}` is replaced by the display label
    pub fn set_name_templates(&mut self, ascending: Option<String>, descending: Option<String>) -> &mut Self {
        self.name_asc = ascending;
        self.name_desc = descending;
        self
    }

    /// Label for the given direction, or the column's own direction
    #[must_use]
    pub fn display_name(&self, ascending: Option<bool>) -> String {
        let template = if ascending.unwrap_or(self.ascending) {
            self.name_asc.as_deref()
        } else {
            self.name_desc.as_deref()
        };

        match template {
            Some(template) => template.replace("{name}", &self.name()),
            None => self.name(),
        }
    }

    /// Ordering expression, defaulting to the quoted column
    #[must_use]
    pub fn sql_expression(&self) -> String {
        self.sql.clone().unwrap_or_else(|| quote_key(&self.column))
    }

    pub fn set_sql(&mut self, sql: Option<String>) -> &mut Self {
        self.sql = sql;
        self
    }

    #[must_use]
    pub fn ascending(&self) -> bool {
        self.ascending
    }

    pub fn set_ascending(&mut self, ascending: bool) -> &mut Self {
        self.ascending = ascending;
        self
    }

    /// Copy of this column pointing in `ascending` direction
    #[must_use]
    pub fn with_direction(&self, ascending: bool) -> Self {
        let mut column = self.clone();
        column.ascending = ascending;
        column
    }

    #[must_use]
    pub fn order_clause(&self) -> OrderClause {
        match &self.sql {
            Some(sql) => OrderClause::new(sql.clone(), self.ascending),
            None => OrderClause::column(self.column.clone(), self.ascending),
        }
    }

    /// `expression ASC|DESC`
    #[must_use]
    pub fn as_sql_clause(&self) -> String {
        self.order_clause().to_string()
    }

    /// Bare column when ascending, marker-prefixed column when descending
    #[must_use]
    pub fn as_url_token(&self, ascending: Option<bool>) -> String {
        if ascending.unwrap_or(self.ascending) {
            self.column.clone()
        } else {
            format!("{DESCENDING_MARKER}{}", self.column)
        }
    }

    /// `base` with the sort parameter set to this column's token
    #[must_use]
    pub fn as_url_on(&self, mut base: PathUrl, ascending: Option<bool>) -> PathUrl {
        base.set(ORDER_BY_PARAM, self.as_url_token(ascending));
        base
    }

    /// Clean listing URL sorted by this column, for sort-toggle links.
    ///
    /// The default ordering is never written into the URL.
    #[must_use]
    pub fn as_listing_url<S: RecordSource>(&self, ctx: &QueryContext<S>, ascending: Option<bool>) -> PathUrl {
        let ascending = ascending.unwrap_or(self.ascending);
        let mut url = ctx.clean_url();
        if ctx.sort_catalog().is_default(&self.column, ascending) {
            url.remove(ORDER_BY_PARAM);
            url
        } else {
            self.as_url_on(url, Some(ascending))
        }
    }
}

/// The sortable columns of a listing, with default and explicit selections
#[derive(Debug, Clone, Default)]
pub struct SortCatalog {
    options: IndexMap<String, SortColumn>,
    default: Option<(String, bool)>,
    explicit: Option<(String, bool)>,
}

impl SortCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a sort option; a replaced option keeps its catalog position
    pub fn register(&mut self, column: &str, name: Option<&str>, sql: Option<&str>) -> &mut SortColumn {
        let mut option = SortColumn::new(column);
        option.set_name(name.map(str::to_string));
        option.set_sql(sql.map(str::to_string));

        match self.options.entry(column.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(option);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(option),
        }
    }

    /// Registered options in registration order
    pub fn options(&self) -> impl Iterator<Item = &SortColumn> {
        self.options.values()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.options.contains_key(column)
    }

    /// Decode a sort token into `(column, ascending)`.
    ///
    /// One leading marker is stripped when the remainder is a registered column; otherwise the
    /// whole token is the column and the direction is ascending.
    #[must_use]
    pub fn resolve_from_url(&self, token: &str) -> (String, bool) {
        if let Some(rest) = token.strip_prefix(DESCENDING_MARKER)
            && self.contains(rest)
        {
            return (rest.to_string(), false);
        }
        (token.to_string(), true)
    }

    /// Direct lookup by token; unregistered columns are an error
    pub fn get(&self, token: &str) -> Result<SortColumn> {
        let (column, ascending) = self.resolve_from_url(token);
        self.options
            .get(&column)
            .map(|option| option.with_direction(ascending))
            .ok_or_else(|| NavigatorError::no_such_sort_option(column))
    }

    /// Ordering used when nothing else is selected
    pub fn set_default(&mut self, column: &str, ascending: bool) -> Result<()> {
        if !self.contains(column) {
            return Err(NavigatorError::no_such_sort_option(column));
        }
        self.default = Some((column.to_string(), ascending));
        Ok(())
    }

    /// Ordering chosen by the caller rather than the URL
    pub fn set_explicit(&mut self, column: &str, ascending: bool) -> Result<()> {
        if !self.contains(column) {
            return Err(NavigatorError::no_such_sort_option(column));
        }
        self.explicit = Some((column.to_string(), ascending));
        Ok(())
    }

    fn selection(&self, selection: Option<&(String, bool)>) -> Option<SortColumn> {
        let (column, ascending) = selection?;
        self.options
            .get(column)
            .map(|option| option.with_direction(*ascending))
    }

    #[must_use]
    pub fn default_selection(&self) -> Option<SortColumn> {
        self.selection(self.default.as_ref())
    }

    #[must_use]
    pub fn explicit_selection(&self) -> Option<SortColumn> {
        self.selection(self.explicit.as_ref())
    }

    /// Whether `(column, ascending)` is the default ordering
    #[must_use]
    pub fn is_default(&self, column: &str, ascending: bool) -> bool {
        self.default
            .as_ref()
            .is_some_and(|(c, asc)| c == column && *asc == ascending)
    }

    /// Current ordering: a registered URL token, then the explicit selection, then the default
    #[must_use]
    pub fn current(&self, params: &ParameterSource) -> Option<SortColumn> {
        if let Some(token) = params.get(ORDER_BY_PARAM) {
            if let Some(token) = token.as_str() {
                let (column, ascending) = self.resolve_from_url(token);
                if let Some(option) = self.options.get(&column) {
                    return Some(option.with_direction(ascending));
                }
            }
            tracing::debug!(token = ?token, "Ignoring unknown sort token");
        }

        self.explicit_selection().or_else(|| self.default_selection())
    }
}
