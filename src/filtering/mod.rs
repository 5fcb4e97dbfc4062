//! # Filtering, Sorting & Pagination
//!
//! This module turns untrusted listing parameters into validated query fragments. Every value
//! read from a URL or a posted form is checked by the filter it belongs to before it reaches a
//! condition or a generated link; invalid values are dropped, never reported.
//!
//! ## Main Components
//!
//! - **[`Filter`]**: one request parameter mapped to conditions (`Equal`, `Range`,
//!   `PatternSearch`, `Custom`)
//! - **[`Validator`] / [`FilterOptions`]**: what a filter accepts
//! - **[`ConditionSet`]**: ordered, keyed conditions with SQL and Sea-ORM rendering
//! - **[`SortCatalog`] / [`SortColumn`]**: sortable columns and the `orderby` token encoding
//! - **[`Paginator`]**: page window, page navigation and `Content-Range`
//!
//! ## URL Examples
//!
//! ```rust,ignore
//! // Equality
//! GET /users/status:active/
//!
//! // Range, both sides optional
//! GET /users/id_from:10/id_to:20/
//!
//! // Pattern search, non-alphabet runs collapse into wildcards
//! GET /users/addr:main street/
//!
//! // Descending sort on page 3
//! GET /users/orderby:_created/page:3/
//! ```

pub mod conditions;
pub mod filter;
pub mod pagination;
pub mod range;
pub mod search;
pub mod sort;
pub mod validator;

// Re-export commonly used items
pub use conditions::{Comparison, Condition, ConditionKey, ConditionSet, quote_key, quote_value};
pub use filter::{Filter, FilterCallable, FilterContext, FilterKind};
pub use pagination::{Paginator, calculate_content_range};
pub use range::{RangeOptions, RangeSide};
pub use search::{Cleaner, DEFAULT_TEMPLATE, SearchOptions};
pub use sort::{DESCENDING_MARKER, ORDER_BY_PARAM, SortCatalog, SortColumn};
pub use validator::{FilterOptions, Predicate, Validator};
