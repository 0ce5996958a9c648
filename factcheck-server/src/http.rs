//! Factcheck HTTP REST API
//!
//! Axum-based HTTP server exposing the fact resource.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function taking the store and returning `(StatusCode, Value)`. The
//! inner functions are directly testable without axum dispatch machinery.
//!
//! Endpoints:
//! - GET    /health            — health check with store status
//! - GET    /version           — server version info
//! - GET    /facts             — list all facts
//! - POST   /facts             — create a fact
//! - GET    /facts/random      — one shaped fact, chosen uniformly
//! - GET    /facts/qid/:qid    — shaped facts whose entity ends with `qid`
//! - POST   /facts/accept      — record positive feedback
//! - POST   /facts/reject      — record negative feedback
//! - GET    /facts/:id         — retrieve
//! - PUT    /facts/:id         — replace
//! - PATCH  /facts/:id         — partial update
//! - DELETE /facts/:id         — destroy

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, FromRequest, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use factcheck_core::{shape_fact, FactError, FactStore, FactcheckConfig, Feedback};
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

pub const NOT_FOUND_DETAIL: &str = "Not found.";
pub const INVALID_FACT_ID_DETAIL: &str = "Invalid Fact ID.";

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn FactStore>,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/facts", get(list_handler).post(create_handler))
        .route("/facts/random", get(random_handler))
        .route("/facts/qid/:qid", get(qid_handler))
        .route("/facts/accept", post(accept_handler))
        .route("/facts/reject", post(reject_handler))
        .route(
            "/facts/:id",
            get(retrieve_handler)
                .put(replace_handler)
                .patch(partial_update_handler)
                .delete(destroy_handler),
        )
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    store: Arc<dyn FactStore>,
    config: FactcheckConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { store });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Factcheck HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

/// Which verdict a feedback request records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

impl Verdict {
    fn value(self) -> bool {
        matches!(self, Verdict::Accept)
    }

    fn message(self) -> &'static str {
        match self {
            Verdict::Accept => "Fact Accepted successfully",
            Verdict::Reject => "Fact Rejected successfully",
        }
    }
}

// ============================================================================
// Error mapping
// ============================================================================

fn detail(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Value) {
    (status, json!({ "detail": msg.into() }))
}

fn not_found() -> (StatusCode, Value) {
    detail(StatusCode::NOT_FOUND, NOT_FOUND_DETAIL)
}

/// Error mapping for the plain CRUD endpoints.
pub fn error_response(err: FactError) -> (StatusCode, Value) {
    match err {
        FactError::NotFound => not_found(),
        FactError::Validation(errors) => (StatusCode::BAD_REQUEST, json!(errors)),
        FactError::InvalidInput(msg) => detail(StatusCode::BAD_REQUEST, msg),
        other => {
            tracing::error!(error = %other, "Request failed");
            detail(StatusCode::INTERNAL_SERVER_ERROR, "A server error occurred.")
        }
    }
}

/// Catch-all boundary for the QID, random and feedback endpoints: any failure
/// is reported as 404, except a rejected `fact_id` (400) and pool exhaustion,
/// which stays a 5xx.
pub fn collapse_to_not_found(err: FactError) -> (StatusCode, Value) {
    match err {
        FactError::InvalidInput(_) => detail(StatusCode::BAD_REQUEST, INVALID_FACT_ID_DETAIL),
        e if e.is_resource_exhaustion() => {
            tracing::error!(error = %e, "Store unavailable");
            detail(StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable.")
        }
        FactError::NotFound => not_found(),
        e => {
            tracing::warn!(error = %e, "Lookup failed, reporting as not found");
            not_found()
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> (StatusCode, Value) {
    let status = match rejection.status() {
        StatusCode::UNSUPPORTED_MEDIA_TYPE => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    detail(status, format!("JSON parse error - {}", rejection.body_text()))
}

/// Read an accept/reject body. Form-encoded bodies become a JSON object of
/// strings; an empty body reads as `{}` so a missing `fact_id` is reported as
/// such. Anything else must parse as JSON, whatever its content type.
pub async fn read_feedback_body(req: Request) -> std::result::Result<Value, (StatusCode, Value)> {
    let is_form = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(req, &())
            .await
            .map_err(|r| detail(StatusCode::BAD_REQUEST, r.body_text()))?;
        return Ok(json!(fields));
    }

    let bytes = Bytes::from_request(req, &())
        .await
        .map_err(|r| detail(StatusCode::BAD_REQUEST, r.body_text()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| detail(StatusCode::BAD_REQUEST, format!("JSON parse error - {}", e)))
}

/// Path ids that are not integers never match a record.
fn parse_path_id(raw: &str) -> std::result::Result<i64, FactError> {
    raw.parse::<i64>().map_err(|_| FactError::NotFound)
}

/// Extract `fact_id` from a feedback body.
///
/// Absent, null, false, zero, the empty string and empty containers are
/// invalid. Integers and integer strings are accepted; anything else cannot
/// name a record and is reported as not found.
pub fn parse_fact_id(body: &Value) -> std::result::Result<i64, FactError> {
    let invalid = || FactError::InvalidInput(INVALID_FACT_ID_DETAIL.to_string());

    let raw = match body.as_object().and_then(|obj| obj.get("fact_id")) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Err(invalid()),
        Some(v) => v,
    };

    match raw {
        Value::String(s) if s.is_empty() => Err(invalid()),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| FactError::NotFound),
        Value::Number(n) if n.as_f64() == Some(0.0) => Err(invalid()),
        Value::Number(n) => n.as_i64().ok_or(FactError::NotFound),
        Value::Array(a) if a.is_empty() => Err(invalid()),
        Value::Object(o) if o.is_empty() => Err(invalid()),
        _ => Err(FactError::NotFound),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> std::result::Result<Value, FactError> {
    serde_json::to_value(value).map_err(|e| FactError::Other(e.to_string()))
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check — pings the store and returns (status_code, json_body).
pub async fn health_inner(store: &dyn FactStore) -> (StatusCode, Value) {
    match store.health().await {
        Ok(backend) => (
            StatusCode::OK,
            json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "backend": backend,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "api": "facts/1",
    })
}

pub async fn list_inner(store: &dyn FactStore) -> (StatusCode, Value) {
    match store.list().await.and_then(|facts| to_json(&facts)) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => error_response(e),
    }
}

pub async fn create_inner(store: &dyn FactStore, body: Value) -> (StatusCode, Value) {
    let new_fact = match factcheck_core::validate::validate_new_fact(&body) {
        Ok(f) => f,
        Err(e) => return error_response(e),
    };

    match store.create(new_fact).await.and_then(|f| to_json(&f)) {
        Ok(body) => (StatusCode::CREATED, body),
        Err(e) => error_response(e),
    }
}

pub async fn retrieve_inner(store: &dyn FactStore, id: &str) -> (StatusCode, Value) {
    let result = async {
        let id = parse_path_id(id)?;
        to_json(&store.get(id).await?)
    }
    .await;

    match result {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => error_response(e),
    }
}

/// Inner update — full replace when `partial` is false (PUT), patch otherwise.
pub async fn update_inner(
    store: &dyn FactStore,
    id: &str,
    body: Value,
    partial: bool,
) -> (StatusCode, Value) {
    let result = async {
        let id = parse_path_id(id)?;
        let patch = if partial {
            factcheck_core::validate::validate_fact_patch(&body)?
        } else {
            factcheck_core::validate::validate_fact_replace(&body)?
        };
        to_json(&store.update(id, patch).await?)
    }
    .await;

    match result {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => error_response(e),
    }
}

pub async fn destroy_inner(store: &dyn FactStore, id: &str) -> (StatusCode, Value) {
    let result = async {
        let id = parse_path_id(id)?;
        store.delete(id).await
    }
    .await;

    match result {
        Ok(()) => (StatusCode::NO_CONTENT, Value::Null),
        Err(e) => error_response(e),
    }
}

/// Inner QID lookup — zero matches is an empty array, not an error.
pub async fn qid_inner(store: &dyn FactStore, qid: &str) -> (StatusCode, Value) {
    let result = async {
        let facts = store.filter_entity_suffix(qid).await?;
        let shaped: Vec<_> = facts.iter().map(shape_fact).collect();
        to_json(&shaped)
    }
    .await;

    match result {
        Ok(body) => {
            tracing::debug!(qid, count = body.as_array().map_or(0, |a| a.len()), "QID lookup");
            (StatusCode::OK, body)
        }
        Err(e) => collapse_to_not_found(e),
    }
}

pub async fn random_inner(store: &dyn FactStore) -> (StatusCode, Value) {
    let result = async {
        let ids = store.list_ids().await?;
        let id = {
            let mut rng = rand::thread_rng();
            ids.choose(&mut rng).copied()
        }
        .ok_or(FactError::NotFound)?;
        let fact = store.get(id).await?;
        to_json(&shape_fact(&fact))
    }
    .await;

    match result {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => collapse_to_not_found(e),
    }
}

/// Inner accept/reject — overwrites the fact's feedback with the verdict and
/// the current time.
pub async fn feedback_inner(
    store: &dyn FactStore,
    body: Value,
    verdict: Verdict,
) -> (StatusCode, Value) {
    let result = async {
        let id = parse_fact_id(&body)?;
        let feedback = Feedback::now(verdict.value());
        store.set_feedback(id, feedback.to_json()).await?;
        Ok::<_, FactError>(id)
    }
    .await;

    match result {
        Ok(id) => {
            tracing::info!(id, accepted = verdict.value(), "Recorded fact feedback");
            (StatusCode::OK, json!({ "message": verdict.message() }))
        }
        Err(e) => collapse_to_not_found(e),
    }
}

pub async fn accept_inner(store: &dyn FactStore, body: Value) -> (StatusCode, Value) {
    feedback_inner(store, body, Verdict::Accept).await
}

pub async fn reject_inner(store: &dyn FactStore, body: Value) -> (StatusCode, Value) {
    feedback_inner(store, body, Verdict::Reject).await
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

fn respond((status, body): (StatusCode, Value)) -> Response {
    if status == StatusCode::NO_CONTENT {
        status.into_response()
    } else {
        (status, Json(body)).into_response()
    }
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> Response {
    respond(health_inner(state.store.as_ref()).await)
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn list_handler(State(state): State<Arc<HttpState>>) -> Response {
    respond(list_inner(state.store.as_ref()).await)
}

pub async fn create_handler(
    State(state): State<Arc<HttpState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(body)) => respond(create_inner(state.store.as_ref(), body).await),
        Err(rejection) => respond(rejection_response(rejection)),
    }
}

pub async fn retrieve_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> Response {
    respond(retrieve_inner(state.store.as_ref(), &id).await)
}

pub async fn replace_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(body)) => respond(update_inner(state.store.as_ref(), &id, body, false).await),
        Err(rejection) => respond(rejection_response(rejection)),
    }
}

pub async fn partial_update_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(body)) => respond(update_inner(state.store.as_ref(), &id, body, true).await),
        Err(rejection) => respond(rejection_response(rejection)),
    }
}

pub async fn destroy_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> Response {
    respond(destroy_inner(state.store.as_ref(), &id).await)
}

pub async fn qid_handler(
    State(state): State<Arc<HttpState>>,
    Path(qid): Path<String>,
) -> Response {
    respond(qid_inner(state.store.as_ref(), &qid).await)
}

pub async fn random_handler(State(state): State<Arc<HttpState>>) -> Response {
    respond(random_inner(state.store.as_ref()).await)
}

pub async fn accept_handler(State(state): State<Arc<HttpState>>, req: Request) -> Response {
    match read_feedback_body(req).await {
        Ok(body) => respond(accept_inner(state.store.as_ref(), body).await),
        Err(err) => respond(err),
    }
}

pub async fn reject_handler(State(state): State<Arc<HttpState>>, req: Request) -> Response {
    match read_feedback_body(req).await {
        Ok(body) => respond(reject_inner(state.store.as_ref(), body).await),
        Err(err) => respond(err),
    }
}

// ============================================================================
// Unit Tests — call inner functions directly against the in-memory store
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use factcheck_core::MemoryFactStore;

    fn fact_body(entity: &str) -> Value {
        json!({
            "wikidata_property": "P69",
            "wikidata_entity": entity,
            "data_value": "St John's College",
            "evidence_highlight": {"text": "educated at St John's", "startIdx": 12, "endIdx": 33},
            "meta_information": {"question": "Where was Douglas Adams educated?"},
            "references": [
                {"type": "string", "value": "He was educated at St John's College, Cambridge."},
                {"type": "url", "value": "https://en.wikipedia.org/wiki/Douglas_Adams"}
            ]
        })
    }

    async fn seeded_store(entities: &[&str]) -> MemoryFactStore {
        let store = MemoryFactStore::new();
        for entity in entities {
            let (status, _) = create_inner(&store, fact_body(entity)).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        store
    }

    // ========================================================================
    // version / health
    // ========================================================================
    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["api"], "facts/1");
    }

    #[tokio::test]
    async fn test_health_inner_memory_store() {
        let store = MemoryFactStore::new();
        let (status, body) = health_inner(&store).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend"], "in-memory");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    // ========================================================================
    // fact_id parsing
    // ========================================================================
    #[test]
    fn test_parse_fact_id_invalid_values() {
        for body in [
            json!({}),
            json!({"fact_id": null}),
            json!({"fact_id": ""}),
            json!({"fact_id": 0}),
            json!({"fact_id": false}),
            json!({"fact_id": []}),
            json!("not an object"),
        ] {
            assert!(
                matches!(parse_fact_id(&body), Err(FactError::InvalidInput(_))),
                "expected invalid for {}",
                body
            );
        }
    }

    #[test]
    fn test_parse_fact_id_accepts_integers_and_numeric_strings() {
        assert_eq!(parse_fact_id(&json!({"fact_id": 7})).unwrap(), 7);
        assert_eq!(parse_fact_id(&json!({"fact_id": "7"})).unwrap(), 7);
    }

    #[test]
    fn test_parse_fact_id_unresolvable_is_not_found() {
        for body in [
            json!({"fact_id": "abc"}),
            json!({"fact_id": "  "}),
            json!({"fact_id": 1.5}),
            json!({"fact_id": true}),
        ] {
            assert!(
                matches!(parse_fact_id(&body), Err(FactError::NotFound)),
                "expected not found for {}",
                body
            );
        }
    }

    // ========================================================================
    // CRUD
    // ========================================================================
    #[tokio::test]
    async fn test_create_then_list_and_retrieve() {
        let store = MemoryFactStore::new();
        let (status, created) = create_inner(&store, fact_body("http://www.wikidata.org/entity/Q42")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert!(created["feedback"].is_null());

        let (status, list) = list_inner(&store).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, one) = retrieve_inner(&store, "1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["wikidata_property"], "P69");
    }

    #[tokio::test]
    async fn test_create_validation_error_is_400() {
        let store = MemoryFactStore::new();
        let mut body = fact_body("Q1");
        body["wikidata_property"] = json!("");
        let (status, errors) = create_inner(&store, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(errors["wikidata_property"][0], "This field may not be blank.");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_missing_and_non_integer_ids() {
        let store = MemoryFactStore::new();
        for id in ["1", "abc", "-"] {
            let (status, body) = retrieve_inner(&store, id).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["detail"], NOT_FOUND_DETAIL);
        }
    }

    #[tokio::test]
    async fn test_patch_updates_only_supplied_fields() {
        let store = seeded_store(&["http://www.wikidata.org/entity/Q42"]).await;
        let (status, body) = update_inner(&store, "1", json!({"data_value": 42}), true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data_value"], 42);
        assert_eq!(body["wikidata_property"], "P69");
    }

    #[tokio::test]
    async fn test_put_requires_full_body() {
        let store = seeded_store(&["Q42"]).await;
        let (status, body) = update_inner(&store, "1", json!({"data_value": 42}), false).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["wikidata_entity"][0], "This field is required.");
    }

    #[tokio::test]
    async fn test_put_replaces_record() {
        let store = seeded_store(&["Q42"]).await;
        let mut replacement = fact_body("http://www.wikidata.org/entity/Q1");
        replacement["wikidata_property"] = json!("P31");
        let (status, body) = update_inner(&store, "1", replacement, false).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["wikidata_property"], "P31");
        assert_eq!(body["wikidata_entity"], "http://www.wikidata.org/entity/Q1");
    }

    #[tokio::test]
    async fn test_put_without_feedback_keeps_verdict() {
        let store = seeded_store(&["http://www.wikidata.org/entity/Q42"]).await;
        let (status, _) = accept_inner(&store, json!({"fact_id": 1})).await;
        assert_eq!(status, StatusCode::OK);
        let before = store.get(1).await.unwrap().feedback;
        assert!(before.is_some());

        let mut replacement = fact_body("http://www.wikidata.org/entity/Q42");
        replacement["data_value"] = json!("Brentwood School");
        let (status, body) = update_inner(&store, "1", replacement, false).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data_value"], "Brentwood School");

        assert_eq!(store.get(1).await.unwrap().feedback, before);
    }

    #[tokio::test]
    async fn test_put_with_null_feedback_clears_verdict() {
        let store = seeded_store(&["Q42"]).await;
        accept_inner(&store, json!({"fact_id": 1})).await;

        let mut replacement = fact_body("Q42");
        replacement["feedback"] = Value::Null;
        let (status, _) = update_inner(&store, "1", replacement, false).await;
        assert_eq!(status, StatusCode::OK);
        assert!(store.get(1).await.unwrap().feedback.is_none());
    }

    #[tokio::test]
    async fn test_whitespace_fact_id_is_404() {
        let store = seeded_store(&["Q42"]).await;
        let (status, body) = accept_inner(&store, json!({"fact_id": "  "})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], NOT_FOUND_DETAIL);
    }

    // ========================================================================
    // feedback body reading
    // ========================================================================
    fn feedback_request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/facts/accept");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        builder.body(axum::body::Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_read_feedback_body_empty_is_empty_object() {
        let body = read_feedback_body(feedback_request(None, "")).await.unwrap();
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_read_feedback_body_form_encoded() {
        let req = feedback_request(Some("application/x-www-form-urlencoded"), "fact_id=1");
        let body = read_feedback_body(req).await.unwrap();
        assert_eq!(body, json!({"fact_id": "1"}));
        assert_eq!(parse_fact_id(&body).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_read_feedback_body_json_without_content_type() {
        let body = read_feedback_body(feedback_request(None, r#"{"fact_id": 3}"#))
            .await
            .unwrap();
        assert_eq!(body["fact_id"], 3);
    }

    #[tokio::test]
    async fn test_read_feedback_body_malformed_json_is_400() {
        let (status, body) = read_feedback_body(feedback_request(Some("application/json"), "{nope"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("JSON parse error"));
    }

    #[tokio::test]
    async fn test_destroy_then_retrieve_is_404() {
        let store = seeded_store(&["Q42"]).await;
        let (status, _) = destroy_inner(&store, "1").await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = retrieve_inner(&store, "1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = destroy_inner(&store, "1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ========================================================================
    // QID lookup
    // ========================================================================
    #[tokio::test]
    async fn test_qid_zero_matches_is_empty_array() {
        let store = seeded_store(&["http://www.wikidata.org/entity/Q42"]).await;
        let (status, body) = qid_inner(&store, "Q7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_qid_single_match_is_shaped() {
        let store = seeded_store(&[
            "http://www.wikidata.org/entity/Q42",
            "http://www.wikidata.org/entity/Q5",
        ])
        .await;
        let (status, body) = qid_inner(&store, "Q42").await;
        assert_eq!(status, StatusCode::OK);

        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        let shaped = &items[0];
        assert_eq!(shaped["wikidataLink"], "http://www.wikidata.org/entity/Q42");
        assert_eq!(shaped["property"], "P69");
        assert_eq!(shaped["question"], "Where was Douglas Adams educated?");
        assert_eq!(shaped["wikipediaLink"], "https://en.wikipedia.org/wiki/Douglas_Adams");
        assert_eq!(shaped["evidence"], "He was educated at St John's College, Cambridge.");
        assert_eq!(shaped["startIdx"], 12);
        assert_eq!(shaped["endIdx"], 33);
        assert_eq!(shaped["object"], "St John's College");
    }

    // ========================================================================
    // random
    // ========================================================================
    #[tokio::test]
    async fn test_random_on_empty_store_is_404() {
        let store = MemoryFactStore::new();
        let (status, body) = random_inner(&store).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], NOT_FOUND_DETAIL);
    }

    #[tokio::test]
    async fn test_random_returns_a_stored_fact() {
        let store = seeded_store(&["Q1", "Q2", "Q3"]).await;
        for _ in 0..10 {
            let (status, body) = random_inner(&store).await;
            assert_eq!(status, StatusCode::OK);
            let id = body["id"].as_i64().unwrap();
            assert!((1..=3).contains(&id));
            assert!(body["wikidataLink"].is_string());
        }
    }

    // ========================================================================
    // accept / reject
    // ========================================================================
    #[tokio::test]
    async fn test_accept_without_fact_id_is_400_and_no_mutation() {
        let store = seeded_store(&["Q42"]).await;
        let (status, body) = accept_inner(&store, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], INVALID_FACT_ID_DETAIL);
        assert!(store.get(1).await.unwrap().feedback.is_none());
    }

    #[tokio::test]
    async fn test_accept_unknown_fact_is_404_and_no_mutation() {
        let store = seeded_store(&["Q42"]).await;
        let (status, body) = accept_inner(&store, json!({"fact_id": 99})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], NOT_FOUND_DETAIL);
        assert!(store.get(1).await.unwrap().feedback.is_none());
    }

    #[tokio::test]
    async fn test_accept_sets_true_with_parseable_date() {
        let store = seeded_store(&["Q42"]).await;
        let (status, body) = accept_inner(&store, json!({"fact_id": 1})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Fact Accepted successfully");

        let feedback = store.get(1).await.unwrap().feedback.unwrap();
        assert_eq!(feedback["value"], true);
        let date = feedback["date"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(date).is_ok());
    }

    #[tokio::test]
    async fn test_reject_sets_false_and_overwrites() {
        let store = seeded_store(&["Q42"]).await;
        accept_inner(&store, json!({"fact_id": "1"})).await;
        let (status, body) = reject_inner(&store, json!({"fact_id": "1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Fact Rejected successfully");

        let feedback = store.get(1).await.unwrap().feedback.unwrap();
        assert_eq!(feedback["value"], false);
    }

    // ========================================================================
    // error mapping
    // ========================================================================
    #[test]
    fn test_collapse_keeps_pool_exhaustion_as_5xx() {
        let (status, _) = collapse_to_not_found(FactError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = collapse_to_not_found(FactError::Database(sqlx::Error::RowNotFound));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], NOT_FOUND_DETAIL);

        let (status, _) = collapse_to_not_found(FactError::Other("boom".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_response_crud_mapping() {
        assert_eq!(error_response(FactError::NotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(
            error_response(FactError::Other("boom".to_string())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
