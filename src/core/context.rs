//! # Query Context
//!
//! [`QueryContext`] owns everything one listing request needs: the parameter source, the
//! registered filters, the sort catalog, the default conditions and the page window. It turns
//! them into a [`ListQuery`] and, once bound to a [`RecordSource`], drives counting and fetching.
//!
//! A context serves exactly one request. Derived URLs (page links, sort links, filter links)
//! are always built from a copy of the request URL, so reading them never changes the context.
//!
//! ```rust,ignore
//! let mut ctx: QueryContext<EntitySource<post::Entity>> = QueryContext::new(params);
//! ctx.add_filter_equal("status");
//! ctx.add_order_by("created", Some("Created"), None);
//! ctx.set_default_order_by("created", false)?;
//! ctx.set_page_size(Some(20));
//! ctx.set_record_type(EntitySource::new(db))?;
//!
//! let total = ctx.get_total(false).await?;
//! let posts = ctx.get_items().await?;
//! ```

use axum::http::HeaderMap;
use indexmap::{IndexMap, map::Entry};
use std::any::type_name;

use super::traits::{RecordSource, Unbound};
use crate::{
    errors::{NavigatorError, Result},
    filtering::{
        Condition, ConditionSet, Filter, FilterContext, Paginator, RangeOptions,
        SearchOptions, SortCatalog, SortColumn, sort::ORDER_BY_PARAM,
    },
    models::{ListQuery, ListingConfig, OrderClause, PageSummary},
    params::{PAGE_PARAM, ParamValue, ParameterSource, PathUrl},
};

/// Request-scoped listing state
#[derive(Debug)]
pub struct QueryContext<S: RecordSource = Unbound> {
    params: ParameterSource,
    config: ListingConfig,
    filters: IndexMap<String, Filter>,
    sorting: SortCatalog,
    defaults: ConditionSet,
    paginator: Paginator,
    source: Option<S>,
}

impl<S: RecordSource> QueryContext<S> {
    /// Context with the default configuration
    #[must_use]
    pub fn new(params: ParameterSource) -> Self {
        Self::with_config(params, ListingConfig::default())
    }

    #[must_use]
    pub fn with_config(params: ParameterSource, config: ListingConfig) -> Self {
        let paginator = Paginator::new(params.url().page(), config.page_size);
        Self {
            params,
            config,
            filters: IndexMap::new(),
            sorting: SortCatalog::new(),
            defaults: ConditionSet::new(),
            paginator,
            source: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ListingConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    /// Raw parameter, URL first, then posted fields
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<ParamValue> {
        self.params.get(name)
    }

    #[must_use]
    pub fn parameters(&self) -> &ParameterSource {
        &self.params
    }

    /// The request URL as received, apart from explicit page changes
    #[must_use]
    pub fn url(&self) -> &PathUrl {
        self.params.url()
    }

    #[must_use]
    pub fn clone_url(&self) -> PathUrl {
        self.params.clone_url()
    }

    // ------------------------------------------------------------------
    // Record binding
    // ------------------------------------------------------------------

    /// Bind the record type that counts and fetches for this listing.
    ///
    /// # Errors
    ///
    /// `InvalidRecordType` when `source` lacks the configured count or find operation.
    pub fn set_record_type(&mut self, source: S) -> Result<&mut Self> {
        let (count, find) = (&self.config.count_operation, &self.config.find_operation);
        if !source.provides(count) || !source.provides(find) {
            return Err(NavigatorError::invalid_record_type(type_name::<S>()));
        }

        self.source = Some(source);
        Ok(self)
    }

    #[must_use]
    pub fn record_type(&self) -> Option<&S> {
        self.source.as_ref()
    }

    fn check_operation(&self, operation: &str) -> Result<()> {
        match &self.source {
            Some(source) if !source.provides(operation) => {
                Err(NavigatorError::invalid_record_type(type_name::<S>()))
            }
            _ => Ok(()),
        }
    }

    /// Rename the counting operation; a bound record type must provide it.
    ///
    /// # Errors
    ///
    /// `InvalidRecordType` when the bound record type lacks `operation`.
    pub fn set_count_operation(&mut self, operation: impl Into<String>) -> Result<&mut Self> {
        let operation = operation.into();
        self.check_operation(&operation)?;
        self.config.count_operation = operation;
        Ok(self)
    }

    /// Rename the fetching operation; a bound record type must provide it.
    ///
    /// # Errors
    ///
    /// `InvalidRecordType` when the bound record type lacks `operation`.
    pub fn set_find_operation(&mut self, operation: impl Into<String>) -> Result<&mut Self> {
        let operation = operation.into();
        self.check_operation(&operation)?;
        self.config.find_operation = operation;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    fn insert_filter(&mut self, mut filter: Filter) -> &mut Filter {
        if !filter.has_max_length() {
            filter = filter.max_length(self.config.max_value_length);
        }

        match self.filters.entry(filter.column().to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(filter);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(filter),
        }
    }

    /// Register a filter, replacing any filter on the same column.
    ///
    /// # Errors
    ///
    /// `InvalidFilterCallable` for a custom filter without a callable.
    pub fn add_filter(&mut self, filter: Filter) -> Result<&mut Filter> {
        if !filter.is_well_formed() {
            return Err(NavigatorError::invalid_filter_callable(filter.column()));
        }
        Ok(self.insert_filter(filter))
    }

    pub fn add_filter_equal(&mut self, column: &str) -> &mut Filter {
        self.insert_filter(Filter::equal(column))
    }

    pub fn add_filter_range(&mut self, column: &str, options: RangeOptions) -> &mut Filter {
        self.insert_filter(Filter::range(column, options))
    }

    pub fn add_filter_pattern_search(&mut self, column: &str, options: SearchOptions) -> &mut Filter {
        self.insert_filter(Filter::pattern_search(column, options))
    }

    /// Register a filter whose conditions come entirely from `callable`
    pub fn add_filter_custom<F>(&mut self, column: &str, callable: F) -> &mut Filter
    where
        F: Fn(&mut FilterContext<'_>, &Filter) + Send + Sync + 'static,
    {
        self.insert_filter(Filter::custom(column).callable(callable))
    }

    /// Registered filter by column.
    ///
    /// # Errors
    ///
    /// `NoSuchFilter` when nothing is registered on `column`.
    pub fn filter(&self, column: &str) -> Result<&Filter> {
        self.filters
            .get(column)
            .ok_or_else(|| NavigatorError::no_such_filter(column))
    }

    /// # Errors
    ///
    /// `NoSuchFilter` when nothing is registered on `column`.
    pub fn filter_mut(&mut self, column: &str) -> Result<&mut Filter> {
        self.filters
            .get_mut(column)
            .ok_or_else(|| NavigatorError::no_such_filter(column))
    }

    /// Registered filters in registration order
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.values()
    }

    /// Validated current value of a registered filter.
    ///
    /// # Errors
    ///
    /// `NoSuchFilter` when nothing is registered on `column`.
    pub fn clean_value(&self, column: &str) -> Result<Option<ParamValue>> {
        Ok(self.filter(column)?.clean_value(&self.params))
    }

    /// Link to the clean listing with `column` set to `value`.
    ///
    /// # Errors
    ///
    /// `NoSuchFilter` when nothing is registered on `column`.
    pub fn filter_url(&self, column: &str, value: &str) -> Result<PathUrl> {
        Ok(self.filter(column)?.as_url(self, value))
    }

    // ------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------

    /// Add a condition that applies whatever the filters produce
    pub fn add_default_condition(&mut self, condition: impl Into<Condition>, key: Option<&str>) -> &mut Self {
        self.defaults.add(condition, key);
        self
    }

    /// Replace every default condition
    pub fn set_default_conditions(&mut self, conditions: ConditionSet) -> &mut Self {
        self.defaults = conditions;
        self
    }

    #[must_use]
    pub fn default_conditions(&self) -> &ConditionSet {
        &self.defaults
    }

    /// Run every filter against the current parameters and merge the result into the defaults.
    ///
    /// Rebuilt from scratch on each call.
    #[must_use]
    pub fn process_filters(&self) -> ConditionSet {
        let mut produced = ConditionSet::new();
        {
            let mut ctx = FilterContext::new(&self.params, &mut produced);
            for filter in self.filters.values() {
                filter.process(&mut ctx);
            }
        }

        if produced.is_empty() {
            self.defaults.clone()
        } else {
            self.defaults.merged(&produced)
        }
    }

    // ------------------------------------------------------------------
    // Sorting
    // ------------------------------------------------------------------

    /// Offer `column` for sorting; `sql` defaults to the quoted column
    pub fn add_order_by(&mut self, column: &str, name: Option<&str>, sql: Option<&str>) -> &mut SortColumn {
        self.sorting.register(column, name, sql)
    }

    /// Sort options in registration order
    pub fn order_by_options(&self) -> impl Iterator<Item = &SortColumn> {
        self.sorting.options()
    }

    #[must_use]
    pub fn sort_catalog(&self) -> &SortCatalog {
        &self.sorting
    }

    /// Sort option by token (`column` or `_column`).
    ///
    /// # Errors
    ///
    /// `NoSuchSortOption` when the decoded column is not registered.
    pub fn sort_option(&self, token: &str) -> Result<SortColumn> {
        self.sorting.get(token)
    }

    /// Select the ordering explicitly; a valid `orderby` URL parameter still wins.
    ///
    /// # Errors
    ///
    /// `NoSuchSortOption` when `column` is not registered.
    pub fn set_order_by(&mut self, column: &str, ascending: bool) -> Result<&mut Self> {
        self.sorting.set_explicit(column, ascending)?;
        Ok(self)
    }

    /// Ordering used when nothing else is selected; never written into URLs.
    ///
    /// # Errors
    ///
    /// `NoSuchSortOption` when `column` is not registered.
    pub fn set_default_order_by(&mut self, column: &str, ascending: bool) -> Result<&mut Self> {
        self.sorting.set_default(column, ascending)?;
        Ok(self)
    }

    #[must_use]
    pub fn default_order_by(&self) -> Option<SortColumn> {
        self.sorting.default_selection()
    }

    /// Current ordering: URL, then explicit selection, then default
    #[must_use]
    pub fn order_by(&self) -> Option<SortColumn> {
        self.sorting.current(&self.params)
    }

    #[must_use]
    pub fn order_clause(&self) -> Option<OrderClause> {
        self.order_by().map(|option| option.order_clause())
    }

    /// Sort-toggle link for `column`, in the option's direction unless `ascending` is given.
    ///
    /// # Errors
    ///
    /// `NoSuchSortOption` when the decoded column is not registered.
    pub fn sort_url(&self, token: &str, ascending: Option<bool>) -> Result<PathUrl> {
        Ok(self.sort_option(token)?.as_listing_url(self, ascending))
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    #[must_use]
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    #[must_use]
    pub fn page(&self) -> u64 {
        self.paginator.page()
    }

    /// Move to `page`, also rewriting the request URL
    pub fn set_page(&mut self, page: u64) -> &mut Self {
        self.paginator.set_page(page);
        let page = self.paginator.page();
        self.params.url_mut().set(PAGE_PARAM, page.to_string());
        self
    }

    #[must_use]
    pub fn page_size(&self) -> Option<u64> {
        self.paginator.page_size()
    }

    pub fn set_page_size(&mut self, page_size: Option<u64>) -> &mut Self {
        self.paginator.set_page_size(page_size);
        self
    }

    /// Seed the total without counting
    pub fn set_total(&mut self, total: Option<u64>) -> &mut Self {
        self.paginator.set_total(total);
        self
    }

    /// Cached total, if known
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.paginator.total()
    }

    /// Total number of matching records.
    ///
    /// Counts through the bound record type on first use or when `refresh` is set; a zero count
    /// makes the listing non-searchable. Without a binding the seeded total is returned.
    ///
    /// # Errors
    ///
    /// Failures of the count operation, unmodified.
    pub async fn get_total(&mut self, refresh: bool) -> Result<u64> {
        if !self.paginator.searchable() {
            return Ok(0);
        }

        if refresh || self.paginator.total().is_none() {
            if let Some(source) = &self.source {
                let conditions = self.process_filters();
                let operation = &self.config.count_operation;
                tracing::debug!(%operation, conditions = %conditions, "Counting listing records");

                let total = source.count(operation, &conditions).await?;
                self.paginator.record_count(total);
                if total == 0 {
                    tracing::debug!("No records match, listing is no longer searchable");
                }
            }
        }

        Ok(self.paginator.total().unwrap_or(0))
    }

    #[must_use]
    pub fn searchable(&self) -> bool {
        self.paginator.searchable()
    }

    pub fn set_searchable(&mut self, searchable: bool) -> &mut Self {
        self.paginator.set_searchable(searchable);
        self
    }

    /// Number of pages from the cached total
    #[must_use]
    pub fn total_pages(&self) -> Option<u64> {
        self.paginator.total_pages()
    }

    #[must_use]
    pub fn first_page(&self) -> u64 {
        self.paginator.first_page()
    }

    #[must_use]
    pub fn last_page(&self) -> Option<u64> {
        self.paginator.last_page()
    }

    #[must_use]
    pub fn next_page(&self) -> Option<u64> {
        self.paginator.next_page()
    }

    #[must_use]
    pub fn prev_page(&self) -> Option<u64> {
        self.paginator.prev_page()
    }

    /// Clean listing URL on `page`, or on the current page
    #[must_use]
    pub fn page_url(&self, page: Option<u64>) -> PathUrl {
        let mut url = self.clean_url();
        url.set(PAGE_PARAM, page.unwrap_or_else(|| self.page()).to_string());
        url
    }

    #[must_use]
    pub fn first_page_url(&self) -> PathUrl {
        self.page_url(Some(self.first_page()))
    }

    #[must_use]
    pub fn last_page_url(&self) -> Option<PathUrl> {
        self.last_page().map(|page| self.page_url(Some(page)))
    }

    #[must_use]
    pub fn next_page_url(&self) -> Option<PathUrl> {
        self.next_page().map(|page| self.page_url(Some(page)))
    }

    #[must_use]
    pub fn prev_page_url(&self) -> Option<PathUrl> {
        self.prev_page().map(|page| self.page_url(Some(page)))
    }

    /// Canonical listing URL.
    ///
    /// Every parameter is dropped, then each filter's valid, non-blank values are put back in
    /// registration order, followed by the sort token when it differs from the default.
    #[must_use]
    pub fn clean_url(&self) -> PathUrl {
        let mut url = self.params.clone_url();
        url.strip_parameters();

        for filter in self.filters.values() {
            for (name, value) in filter.url_parameters(&self.params) {
                url.set(name, value);
            }
        }

        if let Some(current) = self.order_by()
            && !self.sorting.is_default(current.column(), current.ascending())
        {
            url.set(ORDER_BY_PARAM, current.as_url_token(None));
        }

        url
    }

    /// `Content-Range` header for the current page
    #[must_use]
    pub fn content_range(&self, resource: &str) -> HeaderMap {
        self.paginator.content_range(resource)
    }

    /// Page numbers and links for API responses, from the cached total
    #[must_use]
    pub fn page_summary(&self) -> PageSummary {
        PageSummary {
            page: self.page(),
            page_size: self.page_size(),
            total: self.total(),
            total_pages: self.total_pages(),
            first_page: self.first_page(),
            prev_page: self.prev_page(),
            next_page: self.next_page(),
            last_page: self.last_page(),
            first_url: self.first_page_url().serialize(),
            prev_url: self.prev_page_url().map(|url| url.serialize()),
            next_url: self.next_page_url().map(|url| url.serialize()),
            last_url: self.last_page_url().map(|url| url.serialize()),
        }
    }

    // ------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------

    /// Final query for the current request
    #[must_use]
    pub fn query_spec(&self) -> ListQuery {
        ListQuery {
            conditions: self.process_filters(),
            order: self.order_clause(),
            limit: self.paginator.limit(),
            offset: self.paginator.offset(),
            page: self.page(),
        }
    }

    /// Records of the current page.
    ///
    /// A non-searchable listing returns no records without querying.
    ///
    /// # Errors
    ///
    /// `NoTargetType` without a bound record type; failures of the find operation, unmodified.
    pub async fn get_items(&self) -> Result<Vec<S::Record>> {
        if !self.paginator.searchable() {
            tracing::debug!("Listing is not searchable, skipping fetch");
            return Ok(Vec::new());
        }

        let Some(source) = &self.source else {
            return Err(NavigatorError::no_target_type());
        };

        let query = self.query_spec();
        let operation = &self.config.find_operation;
        tracing::debug!(%operation, page = query.page, "Fetching listing records");

        Ok(source.find(operation, &query).await?)
    }
}
