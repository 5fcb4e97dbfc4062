use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_RANGE},
    response::IntoResponse,
    routing::get,
};
use crudnav::{NavigatorError, PageSummary, ParameterSource, PathUrl, QueryContext};
use tower::ServiceExt;

async fn list_handler(url: PathUrl) -> Result<impl IntoResponse, NavigatorError> {
    let mut ctx: QueryContext = QueryContext::new(ParameterSource::from_url(url));
    ctx.add_filter_equal("status");
    ctx.add_order_by("id", None, None);
    ctx.set_default_order_by("id", true)?;
    ctx.set_page_size(Some(10)).set_total(Some(56));

    let headers = ctx.content_range("users");
    Ok((headers, Json(ctx.page_summary())))
}

async fn broken_handler(url: PathUrl) -> Result<Json<Vec<()>>, NavigatorError> {
    let ctx: QueryContext = QueryContext::new(ParameterSource::from_url(url));
    Ok(Json(ctx.get_items().await?))
}

fn app() -> Router {
    Router::new()
        .route("/users/{*rest}", get(list_handler))
        .route("/broken/", get(broken_handler))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_listing_handler_reads_path_parameters() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/users/status:open/orderby:_id/page:2/junk:x/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_RANGE).unwrap(), "users 10-19/56");

    let summary = body_json(response).await;
    assert_eq!(summary["page"], 2);
    assert_eq!(summary["next_url"], "/users/status:open/orderby:_id/page:3/");
    assert_eq!(summary["prev_url"], "/users/status:open/orderby:_id/page:1/");
}

#[tokio::test]
async fn test_misuse_maps_to_server_error() {
    let response = app()
        .oneshot(Request::builder().uri("/broken/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], 30);
}

#[test]
fn test_page_summary_schema_is_registered() {
    use utoipa::PartialSchema;

    let schema = serde_json::to_value(PageSummary::schema()).unwrap();
    assert!(schema["properties"]["total_pages"].is_object(), "{schema}");
}
