mod common;

use common::{init_tracing, params, post_entity, seed_posts, setup_test_db};
use crudnav::{EntitySource, QueryContext, RangeOptions, SearchOptions, Validator};
use regex::Regex;

type PostListing = QueryContext<EntitySource<post_entity::Entity>>;

async fn listing(uri: &str) -> PostListing {
    init_tracing();
    let db = setup_test_db().await.expect("Failed to setup test database");
    seed_posts(&db, 25).await.expect("Failed to seed posts");

    let mut ctx: PostListing = QueryContext::new(params(uri));
    ctx.add_filter_equal("status")
        .set_validator(Validator::pattern(Regex::new("^[a-z]+$").unwrap()));
    ctx.add_filter_range("views", RangeOptions::default())
        .set_validator(Validator::numeric());
    ctx.add_filter_range("created", RangeOptions::default().date(true))
        .set_field("created_at");
    ctx.add_filter_pattern_search("title", SearchOptions::default().template("{field} LIKE '{term}%'"));
    ctx.add_order_by("id", Some("ID"), None);
    ctx.add_order_by("views", Some("Views"), None);
    ctx.set_default_order_by("id", true).unwrap();
    ctx.set_record_type(EntitySource::new(db)).unwrap();
    ctx
}

fn ids(posts: &[post_entity::Model]) -> Vec<i32> {
    posts.iter().map(|post| post.id).collect()
}

#[tokio::test]
async fn test_count_and_first_page() {
    let mut ctx = listing("/posts/").await;
    ctx.set_page_size(Some(10));

    assert_eq!(ctx.get_total(false).await.unwrap(), 25);
    assert_eq!(ctx.total_pages(), Some(3));

    let posts = ctx.get_items().await.unwrap();
    assert_eq!(ids(&posts), (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_last_page_with_descending_sort() {
    let mut ctx = listing("/posts/orderby:_views/page:3/").await;
    ctx.set_page_size(Some(10));

    let posts = ctx.get_items().await.unwrap();
    assert_eq!(ids(&posts), [5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn test_equal_filter_binds_value() {
    let mut ctx = listing("/posts/status:draft/").await;

    assert_eq!(ctx.get_total(false).await.unwrap(), 8);
    let posts = ctx.get_items().await.unwrap();
    assert!(posts.iter().all(|post| post.status == "draft"));
}

#[tokio::test]
async fn test_range_filter() {
    let ctx = listing("/posts/views_from:50/views_to:80/").await;
    let posts = ctx.get_items().await.unwrap();
    assert_eq!(ids(&posts), [5, 6, 7, 8]);
}

#[tokio::test]
async fn test_date_range_covers_whole_day() {
    let ctx = listing("/posts/created_from:2024-03-03/created_to:04.03.2024/").await;
    let posts = ctx.get_items().await.unwrap();
    assert_eq!(ids(&posts), [3, 4]);
}

#[tokio::test]
async fn test_pattern_search() {
    let ctx = listing("/posts/title:Post number 1/").await;
    let posts = ctx.get_items().await.unwrap();
    // Runs of spaces become wildcards, so "Post number 21" matches too
    let mut expected = vec![1];
    expected.extend(10..=19);
    expected.push(21);
    assert_eq!(ids(&posts), expected);
}

#[tokio::test]
async fn test_invalid_values_are_ignored() {
    let mut ctx = listing("/posts/status:DRAFT/views_from:lots/").await;
    assert_eq!(ctx.get_total(false).await.unwrap(), 25);
}

#[tokio::test]
async fn test_no_match_short_circuits() {
    let mut ctx = listing("/posts/status:archived/").await;

    assert_eq!(ctx.get_total(false).await.unwrap(), 0);
    assert!(!ctx.searchable());
    assert!(ctx.get_items().await.unwrap().is_empty());
}
