//! Request pipeline tests driven through the assembled router.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

mod common;

async fn router_with(config: public_api::AppConfig) -> Router {
    common::bootstrap(config).await.router()
}

async fn router() -> Router {
    router_with(common::test_config()).await
}

async fn token_for(router: &Router, user: &str) -> String {
    let response = router.clone().oneshot(common::authenticate_request(user)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["result"], true);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_probe() {
    let response = router().await.oneshot(common::get("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(common::body_json(response).await, json!({ "status": "Healthy" }));
}

#[tokio::test]
async fn test_unknown_path_is_a_problem() {
    let response = router().await.oneshot(common::get("/api/nothing-here")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/problem+json");
    let request_id = response.headers()["x-request-id"].to_str().unwrap().to_string();
    let body = common::body_json(response).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["code"], "route_not_found");
    assert_eq!(body["requestId"], request_id.as_str());
}

#[tokio::test]
async fn test_wrong_method_lists_allowed_methods() {
    let request = Request::builder()
        .method(Method::PATCH)
        .uri("/api/catalog-items/1")
        .body(Body::empty())
        .unwrap();
    let response = router().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET, DELETE");
}

#[tokio::test]
async fn test_seeded_catalog_is_served() {
    let router = router().await;

    let response = router.clone().oneshot(common::get("/api/catalog-brands")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["catalogBrands"].as_array().unwrap().len(), 5);

    let response = router
        .oneshot(common::get("/api/catalog-items?pageSize=5&pageIndex=0"))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["catalogItems"].as_array().unwrap().len(), 5);
    assert_eq!(body["pageCount"], 3);
}

#[tokio::test]
async fn test_missing_item_is_not_found() {
    let response = router().await.oneshot(common::get("/api/catalog-items/999")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::body_json(response).await["code"], "not_found");
}

#[tokio::test]
async fn test_cors_preflight_from_web_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/catalog-items")
        .header(header::ORIGIN, common::WEB_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())
        .unwrap();
    let response = router().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], common::WEB_ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "authorization,content-type");
}

#[tokio::test]
async fn test_cors_headers_and_rejection() {
    let router = router().await;

    let allowed = Request::builder()
        .uri("/api/catalog-types")
        .header(header::ORIGIN, common::WEB_ORIGIN)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(allowed).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], common::WEB_ORIGIN);

    let rejected = Request::builder()
        .uri("/api/catalog-types")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(rejected).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(common::body_json(response).await["code"], "cors_origin_rejected");
}

#[tokio::test]
async fn test_catalog_writes_require_admin_role() {
    let router = router().await;
    let item = json!({
        "catalogBrandId": 1,
        "catalogTypeId": 1,
        "description": "Stainless steel",
        "name": "Ferris Travel Mug",
        "price": 14.5
    });

    let response = router
        .clone()
        .oneshot(common::json_request("POST", "/api/catalog-items", item.clone(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let response = router
        .clone()
        .oneshot(common::json_request("POST", "/api/catalog-items", item.clone(), Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::WWW_AUTHENTICATE],
        "Bearer error=\"invalid_token\""
    );

    let demo = token_for(&router, common::DEMO_USER).await;
    let response = router
        .clone()
        .oneshot(common::json_request("POST", "/api/catalog-items", item.clone(), Some(&demo)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = token_for(&router, common::ADMIN_USER).await;
    let response = router
        .clone()
        .oneshot(common::json_request("POST", "/api/catalog-items", item.clone(), Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();

    let response = router.clone().oneshot(common::get(&location)).await.unwrap();
    assert_eq!(common::body_json(response).await["catalogItem"]["name"], "Ferris Travel Mug");

    let response = router
        .oneshot(common::json_request("POST", "/api/catalog-items", item, Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_failed_sign_in_is_not_an_error() {
    let request = common::json_request(
        "POST",
        "/api/authenticate",
        json!({ "username": common::DEMO_USER, "password": "wrong" }),
        None,
    );
    let response = router().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["result"], false);
    assert_eq!(body["token"], "");
}

#[tokio::test]
async fn test_insecure_requests_are_redirected_when_https_is_configured() {
    let mut config = common::test_config();
    config.listener.https_port = Some(5443);
    config.listener.trust_forwarded_proto = true;
    let router = router_with(config).await;

    let request = Request::builder()
        .uri("/api/catalog-brands?x=1")
        .header(header::HOST, "localhost:5099")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://localhost:5443/api/catalog-brands?x=1"
    );

    let forwarded = Request::builder()
        .uri("/api/catalog-brands")
        .header(header::HOST, "localhost:5099")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    assert_eq!(router.oneshot(forwarded).await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_proto_is_untrusted_by_default() {
    let mut config = common::test_config();
    config.listener.https_port = Some(5443);
    let request = Request::builder()
        .uri("/api/catalog-brands")
        .header(header::HOST, "localhost:5099")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    let response = router_with(config).await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = common::test_config();
    config.listener.max_body_bytes = 16;
    let response = router_with(config)
        .await
        .oneshot(common::authenticate_request(common::DEMO_USER))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_openapi_document() {
    let response = router().await.oneshot(common::get("/swagger/v1/swagger.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let document = common::body_json(response).await;
    assert_eq!(document["info"]["title"], "PublicApi");
    let item = &document["paths"]["/api/catalog-items/{catalogItemId}"];
    assert_eq!(item["get"]["operationId"], "GetCatalogItemById");
    assert!(item["delete"]["security"].is_array());
}
