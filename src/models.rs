use sea_orm::{
    Order,
    sea_query::{Alias, Expr, SimpleExpr},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::filtering::{ConditionSet, quote_key};

/// Ordering expression and direction of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub expression: String,
    /// Plain column the expression stands for, quoted by the backend when set
    pub column: Option<String>,
    pub ascending: bool,
}

impl OrderClause {
    /// Ordering by a free-form SQL expression
    pub fn new(expression: impl Into<String>, ascending: bool) -> Self {
        Self {
            expression: expression.into(),
            column: None,
            ascending,
        }
    }

    /// Ordering by a plain column
    pub fn column(column: impl Into<String>, ascending: bool) -> Self {
        let column = column.into();
        Self {
            expression: quote_key(&column),
            column: Some(column),
            ascending,
        }
    }

    #[must_use]
    pub fn order(&self) -> Order {
        if self.ascending { Order::Asc } else { Order::Desc }
    }

    /// Sea-ORM expression: a column reference, or the custom SQL expression
    #[must_use]
    pub fn to_expr(&self) -> SimpleExpr {
        match &self.column {
            Some(column) => Expr::col(Alias::new(column)).into(),
            None => SimpleExpr::Custom(self.expression.clone()),
        }
    }
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.ascending { "ASC" } else { "DESC" };
        write!(f, "{} {direction}", self.expression)
    }
}

/// Final query handed to the data-access layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Merged default and filter conditions
    pub conditions: ConditionSet,
    /// Current ordering, if any is registered
    pub order: Option<OrderClause>,
    /// Page size; `None` fetches everything
    pub limit: Option<u64>,
    /// Rows skipped before the current page
    pub offset: u64,
    /// 1-based page number
    pub page: u64,
}

/// Listing configuration.
///
/// Deserializable from application config; absent fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Rows per page; `None` shows everything on one page
    pub page_size: Option<u64>,
    /// Name of the counting operation of the bound record type
    pub count_operation: String,
    /// Name of the fetching operation of the bound record type
    pub find_operation: String,
    /// Raw filter values longer than this never validate
    pub max_value_length: usize,
}

/// Default maximum length of a raw filter value
pub const MAX_VALUE_LENGTH: usize = 10_000;

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: None,
            count_operation: crate::core::traits::COUNT_OPERATION.to_string(),
            find_operation: crate::core::traits::FIND_OPERATION.to_string(),
            max_value_length: MAX_VALUE_LENGTH,
        }
    }
}

/// Page navigation summary for API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageSummary {
    /// Current page, 1-based
    #[schema(example = 3)]
    pub page: u64,
    #[schema(example = 10)]
    pub page_size: Option<u64>,
    /// Total matching rows, if counted
    #[schema(example = 56)]
    pub total: Option<u64>,
    #[schema(example = 6)]
    pub total_pages: Option<u64>,
    pub first_page: u64,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
    pub last_page: Option<u64>,
    /// Links to the pages above, in path form
    #[schema(example = "/users/")]
    pub first_url: String,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub last_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_rendering() {
        let clause = OrderClause::new("count(*)", false);
        assert_eq!(clause.to_string(), "count(*) DESC");
        assert_eq!(clause.order(), Order::Desc);
        assert_eq!(OrderClause::column("id", true).to_string(), "`id` ASC");
    }

    #[test]
    fn test_column_order_is_not_custom_sql() {
        assert!(matches!(OrderClause::column("id", true).to_expr(), SimpleExpr::Column(_)));
        assert!(matches!(OrderClause::new("count(*)", true).to_expr(), SimpleExpr::Custom(_)));
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: ListingConfig = serde_json::from_value(serde_json::json!({ "page_size": 20 })).unwrap();
        assert_eq!(config.page_size, Some(20));
        assert_eq!(config.count_operation, "Count");
        assert_eq!(config.find_operation, "Find");
        assert_eq!(config.max_value_length, MAX_VALUE_LENGTH);
    }
}
