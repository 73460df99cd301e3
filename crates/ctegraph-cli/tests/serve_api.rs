//! Tests for the serve mode API handlers.
//!
//! These drive the router with `oneshot` against a real coordinator, without
//! binding a port.

#![cfg(feature = "serve")]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ctegraph_cli::server::{build_router, AppState, ServerConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app(config: ServerConfig) -> Router {
    build_router(Arc::new(AppState::start(config)), 3000)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn get_graph(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(Request::get("/api/graph").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// Poll `/api/graph` until `done` holds.
async fn wait_for_graph(app: &Router, done: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..200 {
        let graph = get_graph(app).await;
        if done(&graph) {
            return graph;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("graph never reached the expected state");
}

#[tokio::test]
async fn health_returns_ok_status() {
    let app = test_app(ServerConfig::default());

    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn graph_is_empty_before_first_query() {
    let app = test_app(ServerConfig::default());

    let graph = get_graph(&app).await;
    assert_eq!(graph["revision"], 0);
    assert_eq!(graph["nodes"], json!([]));
    assert_eq!(graph["lastError"], Value::Null);
}

#[tokio::test]
async fn query_is_published_and_fitted() {
    let app = test_app(ServerConfig::default());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/query",
            json!({ "sql": "WITH b AS (SELECT * FROM a) SELECT * FROM b" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let graph = wait_for_graph(&app, |graph| graph["fittedRevision"] == 1).await;
    assert_eq!(graph["revision"], 1);
    let ids: Vec<&str> = graph["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["b", "a", "(main)"]);
    assert_eq!(graph["edges"][1]["id"], "b->(main)");
}

#[tokio::test]
async fn failed_query_keeps_previous_graph() {
    let app = test_app(ServerConfig {
        initial_sql: Some("SELECT * FROM t".to_string()),
        ..ServerConfig::default()
    });
    wait_for_graph(&app, |graph| graph["revision"] == 1).await;

    app.clone()
        .oneshot(post_json("/api/query", json!({ "sql": "SELECT * FROM" })))
        .await
        .unwrap();

    let graph = wait_for_graph(&app, |graph| graph["lastError"].is_string()).await;
    assert!(graph["lastError"]
        .as_str()
        .unwrap()
        .starts_with("Parse error"));
    assert_eq!(graph["revision"], 1);
    assert_eq!(graph["nodes"][0]["id"], "(main)");
    assert_eq!(graph["nodes"][1]["id"], "t");
}

#[tokio::test]
async fn lineage_builds_synchronously() {
    let app = test_app(ServerConfig::default());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/lineage",
            json!({ "sql": "SELECT * FROM x JOIN y ON x.id = y.id" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(json["edges"][0]["id"], "x->(main)");
    assert_eq!(json["edges"][1]["id"], "y->(main)");

    // The coordinator's graph is untouched.
    assert_eq!(get_graph(&app).await["revision"], 0);
}

#[tokio::test]
async fn lineage_reports_unsupported_queries() {
    let app = test_app(ServerConfig::default());

    let response = app
        .oneshot(post_json(
            "/api/lineage",
            json!({ "sql": "WITH v AS (VALUES (1)) SELECT * FROM v" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["error"], "unexpected query body kind: values");
}

#[tokio::test]
async fn malformed_request_is_rejected() {
    let app = test_app(ServerConfig::default());

    let response = app
        .oneshot(post_json("/api/query", json!({ "text": "SELECT 1" })))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
