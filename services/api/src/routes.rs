use crate::infra::AppState;
use agency_locator::error::AppError;
use agency_locator::workflows::addresses::{
    AddressMatcher, AddressParser, ComponentKind, StructuredAddress,
};
use agency_locator::workflows::allocation::{AllocationOutcome, AllocationPipeline};
use agency_locator::workflows::ingest::InputTables;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct CompareRequest {
    pub(crate) a: String,
    pub(crate) b: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompareResponse {
    pub(crate) is_match: bool,
    pub(crate) reconcile: BTreeSet<ComponentKind>,
    pub(crate) parsed_a: StructuredAddress,
    pub(crate) parsed_b: StructuredAddress,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllocationRequest {
    pub(crate) links_csv: String,
    pub(crate) hq_csv: String,
    pub(crate) services_csv: String,
    #[serde(default)]
    pub(crate) threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AllocationResponse {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) threshold: f64,
    pub(crate) consolidation: String,
    #[serde(flatten)]
    pub(crate) outcome: AllocationOutcome,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/addresses/compare", post(compare_endpoint))
        .route("/api/v1/allocation", post(allocation_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn compare_endpoint(Json(payload): Json<CompareRequest>) -> Json<CompareResponse> {
    let matcher = AddressMatcher::default();
    let comparison = matcher.compare(&payload.a, &payload.b);

    Json(CompareResponse {
        is_match: comparison.is_match,
        reconcile: comparison.reconcile,
        parsed_a: matcher.parser().parse(&payload.a),
        parsed_b: matcher.parser().parse(&payload.b),
    })
}

pub(crate) async fn allocation_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AllocationRequest>,
) -> Result<Json<AllocationResponse>, AppError> {
    let AllocationRequest {
        links_csv,
        hq_csv,
        services_csv,
        threshold,
    } = payload;

    let mut config = state.pipeline;
    if let Some(threshold) = threshold {
        if !threshold.is_finite() {
            return Err(AppError::InvalidRequest(format!(
                "threshold must be a finite number, got {threshold}"
            )));
        }
        config.link_score_threshold = threshold;
    }

    let tables = InputTables::from_readers(
        links_csv.as_bytes(),
        hq_csv.as_bytes(),
        services_csv.as_bytes(),
    )?;
    let pipeline = AllocationPipeline::from_config(&config);
    let (pipeline, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = pipeline.run(tables);
        (pipeline, outcome)
    })
    .await
    .map_err(|err| AppError::Task(err.to_string()))?;

    let threshold = pipeline.linkage().threshold();
    info!(
        resolved_rows = outcome.summary.resolved_rows,
        threshold,
        "served allocation request"
    );

    Ok(Json(AllocationResponse {
        generated_at: Utc::now(),
        threshold,
        consolidation: pipeline.deduplicator().strategy().to_string(),
        outcome,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::state_for_tests;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const LINKS: &str = "ClusterID,VendorID,LinkScore\n7,V1,0.9\n7,S1,0.9\n";
    const HQ: &str = "VendorID,VendorName,Amount,Address,City,State,Zip,Longitude,Latitude\n\
V1,Helping Hands,100,1 Main St,Chicago,IL,60601,-87.62,41.88\n";
    const SERVICES: &str = "OrgID,VendorID,Address,City,State,ZipCode\n\
O1,S1,1 Main St,Chicago,IL,60601\n\
O2,S1,2 Main St,Chicago,IL,60601\n";

    fn app(ready: bool) -> Router {
        router().layer(Extension(state_for_tests(ready)))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    fn post_json(uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&payload).expect("serialize payload"),
            ))
            .expect("request")
    }

    #[tokio::test]
    async fn readiness_reflects_startup_state() {
        let response = app(false)
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn compare_reports_decision_and_reconcile_set() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/addresses/compare",
                json!({ "a": "123 Main St", "b": "123 Main Street" }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        assert_eq!(payload["is_match"], json!(true));
        assert_eq!(payload["reconcile"], json!(["StreetNamePostType"]));
        assert_eq!(payload["parsed_b"]["StreetNamePostType"], json!("Street"));
    }

    #[tokio::test]
    async fn allocation_returns_divided_locations() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/allocation",
                json!({ "links_csv": LINKS, "hq_csv": HQ, "services_csv": SERVICES }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        assert_eq!(payload["consolidation"], json!("union-find"));
        assert_eq!(payload["summary"]["resolved_rows"], json!(2));
        let locations = payload["locations"].as_array().expect("locations array");
        assert!(locations
            .iter()
            .all(|location| location["DollarsPerLocation"] == json!(50.0)));
        assert!(payload.get("generated_at").is_some());
    }

    #[tokio::test]
    async fn allocation_threshold_override_drops_weak_links() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/allocation",
                json!({
                    "links_csv": LINKS,
                    "hq_csv": HQ,
                    "services_csv": SERVICES,
                    "threshold": 0.95
                }),
            ))
            .await
            .expect("router dispatch");

        let payload = json_body(response).await;
        assert_eq!(payload["threshold"], json!(0.95));
        assert_eq!(payload["summary"]["resolved_rows"], json!(1));
        assert_eq!(payload["locations"][0]["IsHQFlag"], json!(1));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn allocation_on_the_blocking_pool_reports_the_settings_it_ran_with() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/allocation",
                json!({ "links_csv": LINKS, "hq_csv": HQ, "services_csv": SERVICES }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await;
        assert_eq!(payload["threshold"], json!(0.34));
        assert_eq!(payload["summary"]["total_amount_out"], json!(100.0));
    }

    #[tokio::test]
    async fn malformed_tables_are_bad_requests() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/allocation",
                json!({
                    "links_csv": "ClusterID,VendorID\n7,V1\n",
                    "hq_csv": HQ,
                    "services_csv": SERVICES
                }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let payload = json_body(response).await;
        let message = payload["error"].as_str().expect("error message");
        assert!(message.contains("LinkScore"));
    }
}
