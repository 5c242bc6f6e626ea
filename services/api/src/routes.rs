use crate::infra::{analyze_payload, suggest_payload, transform_payload, AppState};
use crate::report::ScoredAnalysis;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;
use unslop::error::AppError;
use unslop::prompt::{Suggestions, TransformResult, Vocabulary};

pub(crate) fn app_router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/prompts/analyze", post(analyze_endpoint))
        .route("/api/v1/prompts/transform", post(transform_endpoint))
        .route("/api/v1/prompts/suggest", post(suggest_endpoint))
        .route("/api/v1/modifiers", get(modifiers_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
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

pub(crate) async fn analyze_endpoint(
    Json(payload): Json<Value>,
) -> Result<Json<ScoredAnalysis>, AppError> {
    let scored = analyze_payload(&payload)?;
    info!(
        score = scored.analysis.score,
        issues = scored.analysis.issue_count,
        "prompt analyzed"
    );
    Ok(Json(scored))
}

pub(crate) async fn transform_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<TransformResult>, AppError> {
    let result = transform_payload(&payload, &state.defaults)?;
    info!(
        original_score = result.original_score,
        new_score = result.new_score,
        "prompt transformed"
    );
    Ok(Json(result))
}

pub(crate) async fn suggest_endpoint(
    Json(payload): Json<Value>,
) -> Result<Json<Suggestions>, AppError> {
    Ok(Json(suggest_payload(&payload)?))
}

pub(crate) async fn modifiers_endpoint() -> Json<BTreeMap<String, Vec<&'static str>>> {
    Json(Vocabulary::standard().listing(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;
    use unslop::config::PromptDefaults;
    use unslop::prompt::Style;

    const REFERENCE_PROMPT: &str = "a beautiful woman in a coffee shop, 8k, trending on artstation";

    fn state(ready: bool, defaults: PromptDefaults) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            defaults,
        }
    }

    fn router(defaults: PromptDefaults) -> Router {
        app_router().layer(Extension(state(true, defaults)))
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> Response {
        router
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("route executes")
    }

    async fn read_json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn analyze_endpoint_scores_reference_prompt() {
        let Json(body) = analyze_endpoint(Json(json!({ "prompt": REFERENCE_PROMPT })))
            .await
            .expect("analysis succeeds");

        assert_eq!(body.analysis.score, 85);
        assert_eq!(body.analysis.issue_count, 6);
    }

    #[tokio::test]
    async fn analyze_route_rejects_missing_prompt() {
        let response = post_json(
            router(PromptDefaults::default()),
            "/api/v1/prompts/analyze",
            json!({ "text": "a dog" }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json_body(response).await;
        assert_eq!(body["error"], "invalid input: prompt is required");
    }

    #[tokio::test]
    async fn analyze_route_rejects_non_string_prompt() {
        let response = post_json(
            router(PromptDefaults::default()),
            "/api/v1/prompts/analyze",
            json!({ "prompt": ["a", "dog"] }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transform_route_applies_server_defaults() {
        let defaults = PromptDefaults {
            style: Style::Phone,
            ..PromptDefaults::default()
        };
        let response = post_json(
            router(defaults),
            "/api/v1/prompts/transform",
            json!({ "prompt": "a red bicycle leaning on a wall", "seed": 3 }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["modifiers_added"][0], "shot on a smartphone");
        let new_score = body["new_score"].as_u64().expect("new score");
        let original_score = body["original_score"].as_u64().expect("original score");
        assert!(new_score <= original_score);
    }

    #[tokio::test]
    async fn transform_route_ignores_mistyped_options() {
        let response = post_json(
            router(PromptDefaults::default()),
            "/api/v1/prompts/transform",
            json!({ "prompt": "a red bicycle", "style": 42, "preserve_original": "yes" }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        let first = body["modifiers_added"][0].as_str().expect("modifier");
        assert!(first.starts_with("shot on "), "{first}");
    }

    #[tokio::test]
    async fn transform_route_rejects_blank_prompt() {
        let response = post_json(
            router(PromptDefaults::default()),
            "/api/v1/prompts/transform",
            json!({ "prompt": "   " }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn suggest_route_returns_groups() {
        let response = post_json(
            router(PromptDefaults::default()),
            "/api/v1/prompts/suggest",
            json!({ "prompt": REFERENCE_PROMPT }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["score"], 85);
        assert_eq!(body["modifiers"]["cameras"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["modifiers"]["human_details"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn modifiers_endpoint_lists_every_category() {
        let Json(listing) = modifiers_endpoint().await;
        assert!(listing.contains_key("cameras.film"));
        assert!(listing.contains_key("human_details"));
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let response = readiness_endpoint(Extension(state(false, PromptDefaults::default())))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
