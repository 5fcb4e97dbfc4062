mod common;

use common::{params, post_entity};
use crudnav::{QueryContext, RangeOptions, SearchOptions, Validator};
use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryOrder, QueryTrait, Statement, Value};

fn statement(ctx: &QueryContext, backend: DbBackend) -> Statement {
    let query = ctx.query_spec();
    let mut select = post_entity::Entity::find().filter(query.conditions.to_condition());
    if let Some(order) = &query.order {
        select = select.order_by(order.to_expr(), order.order());
    }
    select.build(backend)
}

fn values(statement: &Statement) -> Vec<Value> {
    statement.values.clone().map(|values| values.0).unwrap_or_default()
}

// ============================================================================
// Bound range values
// ============================================================================

#[test]
fn test_range_bound_with_backslash_quote_is_bound_on_mysql() {
    let mut ctx: QueryContext = QueryContext::new(params("/posts/id_from:x%5C%27%20OR%201=1%20--%20/"));
    ctx.add_filter_range("id", RangeOptions::default());

    let statement = statement(&ctx, DbBackend::MySql);

    assert!(statement.sql.ends_with("WHERE `id` >= ?"), "{}", statement.sql);
    assert!(!statement.sql.contains("OR 1=1"), "{}", statement.sql);
    assert_eq!(
        values(&statement),
        [Value::String(Some(Box::new("x\\' OR 1=1 -- ".to_string())))]
    );
}

#[test]
fn test_numeric_bounds_bind_as_integers() {
    let mut ctx: QueryContext = QueryContext::new(params("/posts/views_from:5/views_to:50/"));
    ctx.add_filter_range("views", RangeOptions::default().less_or_equal(false))
        .set_validator(Validator::numeric());

    let statement = statement(&ctx, DbBackend::Sqlite);

    assert!(statement.sql.contains(r#""views" >= ?"#), "{}", statement.sql);
    assert!(statement.sql.contains(r#""views" < ?"#), "{}", statement.sql);
    assert_eq!(values(&statement), [Value::BigInt(Some(5)), Value::BigInt(Some(50))]);
}

// ============================================================================
// Backend identifier quoting
// ============================================================================

#[test]
fn test_default_listing_is_valid_postgres() {
    let mut ctx: QueryContext = QueryContext::new(params("/posts/views_from:5/title:abc/"));
    ctx.add_filter_range("views", RangeOptions::default())
        .set_validator(Validator::numeric());
    ctx.add_filter_pattern_search("title", SearchOptions::default());
    ctx.add_order_by("id", None, None);
    ctx.set_default_order_by("id", true).unwrap();

    let statement = statement(&ctx, DbBackend::Postgres);

    assert!(!statement.sql.contains('`'), "{}", statement.sql);
    assert!(statement.sql.contains(r#""views" >= $1"#), "{}", statement.sql);
    assert!(statement.sql.contains(r#""title" LIKE $2"#), "{}", statement.sql);
    assert!(statement.sql.ends_with(r#"ORDER BY "id" ASC"#), "{}", statement.sql);
    assert_eq!(
        values(&statement),
        [
            Value::BigInt(Some(5)),
            Value::String(Some(Box::new("abc%".to_string())))
        ]
    );
}

#[test]
fn test_custom_sort_expression_is_kept_verbatim() {
    let mut ctx: QueryContext = QueryContext::new(params("/posts/"));
    ctx.add_order_by("title", None, Some("lower(title)"));
    ctx.set_default_order_by("title", false).unwrap();

    let statement = statement(&ctx, DbBackend::Postgres);
    assert!(statement.sql.ends_with("ORDER BY lower(title) DESC"), "{}", statement.sql);
}
