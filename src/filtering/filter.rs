use std::{fmt, sync::Arc};

use super::{
    conditions::{Condition, ConditionSet},
    range::RangeOptions,
    search::SearchOptions,
    validator::{FilterOptions, ValueCheck, Validator},
};
use crate::{
    core::{context::QueryContext, traits::RecordSource},
    errors::{NavigatorError, Result},
    params::{ParamValue, ParameterSource, PathUrl},
};

/// Override that fully replaces a filter's default condition generation.
///
/// It receives the filter-facing view of the query context and the filter itself, and is
/// expected to add its conditions through [`FilterContext::add_condition`].
pub type FilterCallable = Arc<dyn Fn(&mut FilterContext<'_>, &Filter) + Send + Sync>;

/// What a filter's callable and default processing see of the query context
pub struct FilterContext<'a> {
    params: &'a ParameterSource,
    conditions: &'a mut ConditionSet,
}

impl<'a> FilterContext<'a> {
    pub(crate) fn new(params: &'a ParameterSource, conditions: &'a mut ConditionSet) -> Self {
        Self { params, conditions }
    }

    /// Raw parameter from the URL or the posted fields
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<ParamValue> {
        self.params.get(name)
    }

    #[must_use]
    pub fn parameters(&self) -> &ParameterSource {
        self.params
    }

    /// Add a condition, positional when `key` is `None`
    pub fn add_condition(&mut self, condition: impl Into<Condition>, key: Option<&str>) -> &mut Self {
        self.conditions.add(condition, key);
        self
    }

    /// Conditions added so far during this pass
    #[must_use]
    pub fn conditions(&self) -> &ConditionSet {
        self.conditions
    }
}

/// Variant-specific behaviour of a filter
#[derive(Debug, Clone)]
pub enum FilterKind {
    /// `field = value` for a valid, non-blank value
    Equal,
    /// Lower and upper bounds read from `<column>_from` / `<column>_to`
    Range(RangeOptions),
    /// Sanitized term substituted into a pattern template
    PatternSearch(SearchOptions),
    /// Whatever the callable produces
    Custom,
}

/// A request-parameter filter registered on a [`QueryContext`]
#[derive(Clone)]
pub struct Filter {
    column: String,
    field: Option<String>,
    check: ValueCheck,
    callable: Option<FilterCallable>,
    kind: FilterKind,
}

impl Filter {
    fn with_kind(column: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            column: column.into(),
            field: None,
            check: ValueCheck::default(),
            callable: None,
            kind,
        }
    }

    /// Equality filter on `column`
    pub fn equal(column: impl Into<String>) -> Self {
        Self::with_kind(column, FilterKind::Equal)
    }

    /// Range filter reading `<column>_from` and `<column>_to`
    pub fn range(column: impl Into<String>, options: RangeOptions) -> Self {
        Self::with_kind(column, FilterKind::Range(options))
    }

    /// Pattern search filter on `column`
    pub fn pattern_search(column: impl Into<String>, options: SearchOptions) -> Self {
        Self::with_kind(column, FilterKind::PatternSearch(options))
    }

    /// Custom filter; registration fails unless a callable is attached
    pub fn custom(column: impl Into<String>) -> Self {
        Self::with_kind(column, FilterKind::Custom)
    }

    /// Backing-store field, when it differs from the column
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.check.validator = validator;
        self
    }

    /// Restrict values to an enumerated option set
    #[must_use]
    pub fn options(mut self, options: FilterOptions) -> Self {
        self.check.options = Some(options);
        self
    }

    /// Raw values longer than `max` never validate
    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.check.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn callable<F>(mut self, callable: F) -> Self
    where
        F: Fn(&mut FilterContext<'_>, &Filter) + Send + Sync + 'static,
    {
        self.callable = Some(Arc::new(callable));
        self
    }

    /// Replace or remove the callable of an already registered filter.
    ///
    /// # Errors
    ///
    /// `InvalidFilterCallable` when removing the callable of a custom filter; the filter is
    /// left unchanged.
    pub fn set_callable(&mut self, callable: Option<FilterCallable>) -> Result<&mut Self> {
        if callable.is_none() && matches!(self.kind, FilterKind::Custom) {
            return Err(NavigatorError::invalid_filter_callable(self.column.clone()));
        }
        self.callable = callable;
        Ok(self)
    }

    pub fn set_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.field = Some(field.into());
        self
    }

    pub fn set_validator(&mut self, validator: Validator) -> &mut Self {
        self.check.validator = validator;
        self
    }

    pub fn set_options(&mut self, options: Option<FilterOptions>) -> &mut Self {
        self.check.options = options;
        self
    }

    /// External parameter name
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Backing-store field name, defaulting to the column
    #[must_use]
    pub fn field_name(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.column)
    }

    #[must_use]
    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut FilterKind {
        &mut self.kind
    }

    #[must_use]
    pub fn filter_options(&self) -> Option<&FilterOptions> {
        self.check.options.as_ref()
    }

    #[must_use]
    pub fn has_callable(&self) -> bool {
        self.callable.is_some()
    }

    pub(crate) fn has_max_length(&self) -> bool {
        self.check.max_length.is_some()
    }

    /// A custom filter without a callable has nothing to produce
    pub(crate) fn is_well_formed(&self) -> bool {
        !matches!(self.kind, FilterKind::Custom) || self.callable.is_some()
    }

    /// Check a raw value; lists must validate element-wise
    #[must_use]
    pub fn validate(&self, value: &ParamValue) -> bool {
        self.check.validate(value)
    }

    #[must_use]
    pub fn validate_str(&self, value: &str) -> bool {
        self.check.validate_str(value)
    }

    /// Raw value of `name` if it validates, `None` otherwise
    pub(crate) fn clean_parameter(&self, params: &ParameterSource, name: &str) -> Option<ParamValue> {
        let value = params.get(name)?;
        if self.validate(&value) {
            Some(value)
        } else {
            tracing::debug!(filter = %self.column, parameter = %name, "Rejected filter value");
            None
        }
    }

    /// The filter's current value, only when it passes validation
    #[must_use]
    pub fn clean_value(&self, params: &ParameterSource) -> Option<ParamValue> {
        self.clean_parameter(params, &self.column)
    }

    /// URL parameters that reproduce this filter's current valid state.
    ///
    /// Blank values and lists are left out; path tokens carry single values only.
    #[must_use]
    pub fn url_parameters(&self, params: &ParameterSource) -> Vec<(String, String)> {
        let columns = match &self.kind {
            FilterKind::Range(_) => vec![
                RangeOptions::column_from(&self.column),
                RangeOptions::column_to(&self.column),
            ],
            _ => vec![self.column.clone()],
        };

        columns
            .into_iter()
            .filter_map(|column| {
                let value = self.clean_parameter(params, &column)?;
                if value.is_blank() {
                    return None;
                }
                let value = value.as_str()?.to_string();
                Some((column, value))
            })
            .collect()
    }

    /// Clean listing URL with this filter's column set to `value`
    #[must_use]
    pub fn as_url<S: RecordSource>(&self, ctx: &QueryContext<S>, value: &str) -> PathUrl {
        let mut url = ctx.clean_url();
        url.set(self.column.clone(), value);
        url
    }

    /// Add this filter's conditions for the current parameters
    pub fn process(&self, ctx: &mut FilterContext<'_>) {
        if let Some(callable) = &self.callable {
            callable(ctx, self);
            return;
        }

        match &self.kind {
            FilterKind::Equal => self.process_equal(ctx),
            FilterKind::Range(options) => options.process(self, ctx),
            FilterKind::PatternSearch(options) => options.process(self, ctx),
            FilterKind::Custom => {}
        }
    }

    fn process_equal(&self, ctx: &mut FilterContext<'_>) {
        let Some(value) = self.clean_value(ctx.parameters()) else {
            return;
        };
        if value.is_blank() {
            return;
        }

        let field = self.field_name();
        ctx.add_condition(Condition::equals(field, value), Some(field));
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("column", &self.column)
            .field("field", &self.field_name())
            .field("kind", &self.kind)
            .field("check", &self.check)
            .field("callable", &self.callable.is_some())
            .finish()
    }
}
