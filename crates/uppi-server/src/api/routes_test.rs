use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;
use uppi_consolidator::{ConsolidatorConfig, Validator};
use uppi_core::SourceAnalysis;
use uuid::Uuid;

fn test_app(pool: PgPool) -> Router {
    let consolidator = Consolidator::new(
        PgStore::new(pool.clone()),
        Validator::new(HttpProbe::with_defaults().expect("http probe")),
        ConsolidatorConfig::default(),
    );
    build_app(AppState {
        pool,
        consolidator: Arc::new(consolidator),
    })
}

/// An analysis with no website so validation never leaves the process.
async fn seed_analysis(pool: &PgPool, company_name: &str, employees: i64) -> Uuid {
    let analysis = SourceAnalysis {
        id: Uuid::new_v4(),
        company_name: company_name.to_string(),
        website_url: None,
        industry: Some("Software".to_string()),
        employee_count: Some(employees),
        revenue_estimate: None,
        headquarters: Some("Austin, TX".to_string()),
        founded_year: None,
        description: None,
        analysis_payload: serde_json::json!({}),
        created_at: Utc::now(),
    };
    uppi_db::insert_source_analysis(pool, &analysis)
        .await
        .expect("insert analysis");
    analysis.id
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn consolidate(pool: &PgPool, analysis_id: Uuid) -> serde_json::Value {
    let (status, json) = send(
        test_app(pool.clone()),
        post_json(
            "/api/v1/consolidate",
            &serde_json::json!({ "analysisId": analysis_id, "userId": "user-7" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "consolidate failed: {json}");
    json
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_unknown_code_maps_to_internal_error() {
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn cors_preflight_allows_only_content_type_and_request_id() {
    let app = Router::new()
        .route("/api/v1/profiles", get(|| async { "ok" }))
        .layer(build_cors());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/profiles")
                .header(header::ORIGIN, "https://dashboard.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    let allowed = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .and_then(|v| v.to_str().ok())
        .expect("allow-headers on preflight")
        .to_ascii_lowercase();
    assert!(allowed.contains("content-type"));
    assert!(allowed.contains("x-request-id"));
    assert!(!allowed.contains("authorization"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_ok_and_echoes_request_id(pool: PgPool) {
    let response = test_app(pool)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-health")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn consolidate_creates_profile_in_camel_case(pool: PgPool) {
    let analysis_id = seed_analysis(&pool, "Acme Corp.", 40).await;

    let json = consolidate(&pool, analysis_id).await;

    assert_eq!(json["success"], true);
    assert_eq!(json["isNewProfile"], true);
    assert!(json["masterProfileId"].is_string());
    assert_eq!(json["consolidatedData"]["normalized_name"], "acme");
    assert_eq!(json["consolidatedData"]["employee_count"], 40);
}

#[sqlx::test(migrations = "../../migrations")]
async fn second_analysis_merges_into_existing_profile(pool: PgPool) {
    let first = consolidate(&pool, seed_analysis(&pool, "Acme Corp.", 40).await).await;
    let second = consolidate(&pool, seed_analysis(&pool, "ACME, Inc", 120).await).await;

    assert_eq!(second["isNewProfile"], false);
    assert_eq!(second["masterProfileId"], first["masterProfileId"]);
    assert_eq!(second["consolidatedData"]["employee_count"], 120);
}

#[sqlx::test(migrations = "../../migrations")]
async fn consolidate_unknown_analysis_is_a_failure(pool: PgPool) {
    let (status, json) = send(
        test_app(pool),
        post_json(
            "/api/v1/consolidate",
            &serde_json::json!({ "analysisId": Uuid::new_v4() }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .expect("error string")
        .contains("not found"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn consolidate_rejects_malformed_body(pool: PgPool) {
    let (status, json) = send(
        test_app(pool),
        post_json(
            "/api/v1/consolidate",
            &serde_json::json!({ "analysisId": "nope" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_profile_is_not_found(pool: PgPool) {
    let (status, json) = send(
        test_app(pool),
        get_request(&format!("/api/v1/profiles/{}", Uuid::new_v4())),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn malformed_profile_id_is_bad_request(pool: PgPool) {
    let (status, json) = send(test_app(pool), get_request("/api/v1/profiles/abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[sqlx::test(migrations = "../../migrations")]
async fn profiles_list_honours_limit(pool: PgPool) {
    consolidate(&pool, seed_analysis(&pool, "Acme", 10).await).await;
    consolidate(&pool, seed_analysis(&pool, "Globex", 10).await).await;

    let (status, json) = send(test_app(pool), get_request("/api/v1/profiles?limit=1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().expect("data array").len(), 1);
    assert!(json["meta"]["request_id"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn audit_trails_are_listed_after_consolidation(pool: PgPool) {
    let created = consolidate(&pool, seed_analysis(&pool, "Acme", 10).await).await;
    let id = created["masterProfileId"].as_str().expect("id").to_string();

    let (status, logs) = send(
        test_app(pool.clone()),
        get_request(&format!("/api/v1/profiles/{id}/merge-logs")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs["data"].as_array().expect("data array");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["merge_type"], "new_profile");
    assert_eq!(logs[0]["triggered_by"], "user-7");

    let (status, validations) = send(
        test_app(pool.clone()),
        get_request(&format!("/api/v1/profiles/{id}/validations")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!validations["data"].as_array().expect("data array").is_empty());

    let (status, history) = send(
        test_app(pool),
        get_request(&format!("/api/v1/profiles/{id}/confidence-history")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!history["data"].as_array().expect("data array").is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn revalidate_returns_fresh_status_and_scores(pool: PgPool) {
    let created = consolidate(&pool, seed_analysis(&pool, "Acme", 10).await).await;
    let id = created["masterProfileId"].as_str().expect("id").to_string();

    let (status, json) = send(
        test_app(pool),
        post_json(
            &format!("/api/v1/profiles/{id}/validate"),
            &serde_json::json!({}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["validation_status"], "validated");
    assert_eq!(json["data"]["records"].as_array().expect("records").len(), 2);
    let score = json["data"]["overall_confidence_score"]
        .as_f64()
        .expect("score");
    assert!((0.0..=100.0).contains(&score));
}

#[sqlx::test(migrations = "../../migrations")]
async fn revalidate_unknown_profile_is_not_found(pool: PgPool) {
    let (status, _) = send(
        test_app(pool),
        post_json(
            &format!("/api/v1/profiles/{}/validate", Uuid::new_v4()),
            &serde_json::json!({}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
