//! # crudnav
//!
//! Listing navigation for Sea-ORM backed services: turn untrusted listing URL parameters into a
//! validated filter, sort and pagination plan, then count and fetch through a bound
//! record type.
//!
//! Listing state lives in structured path URLs such as
//! `/users/status:active/id_from:10/orderby:_created/page:2/`. Every value is validated by the
//! filter it belongs to; invalid input is silently left out of both the query and the links
//! generated for the page.
//!
//! ## Example
//!
//! ```rust,ignore
//! use crudnav::{EntitySource, ParameterSource, PathUrl, QueryContext, RangeOptions, Validator};
//!
//! async fn list_users(url: PathUrl, db: DatabaseConnection) -> Result<Json<Vec<user::Model>>, NavigatorError> {
//!     let mut ctx: QueryContext<EntitySource<user::Entity>> =
//!         QueryContext::new(ParameterSource::from_url(url));
//!
//!     ctx.add_filter_equal("status");
//!     ctx.add_filter_range("id", RangeOptions::default()).set_validator(Validator::numeric());
//!     ctx.add_order_by("created", Some("Created"), None);
//!     ctx.set_default_order_by("created", false)?;
//!     ctx.set_page_size(Some(20));
//!     ctx.set_record_type(EntitySource::new(db))?;
//!
//!     ctx.get_total(false).await?;
//!     Ok(Json(ctx.get_items().await?))
//! }
//! ```

pub mod core;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod params;

pub use crate::core::{COUNT_OPERATION, EntitySource, FIND_OPERATION, QueryContext, RecordSource, Unbound};
pub use errors::{ErrorKind, NavigatorError, Result};
pub use filtering::{
    Cleaner, Comparison, Condition, ConditionSet, Filter, FilterContext, FilterKind, FilterOptions, Paginator,
    RangeOptions, SearchOptions, SortCatalog, SortColumn, Validator,
};
pub use models::{ListQuery, ListingConfig, OrderClause, PageSummary};
pub use params::{FormFields, PAGE_PARAM, ParamValue, ParameterSource, PathUrl};
