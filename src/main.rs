use anyhow::Result;
use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

mod config;
mod error;
mod logging;
mod models;
mod routes;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;
    let addr = config.socket_addr();

    // Build our application state
    let state = Arc::new(AppState::new(config));

    let app = app(state);

    // Run it
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .merge(routes::routes())
        .merge(routes::insights::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Application state
#[derive(Clone)]
pub struct AppState {
    config: config::Config,
}

impl AppState {
    fn new(config: config::Config) -> Self {
        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(Arc::new(AppState::new(config::Config {
            max_body_bytes: 1024,
            max_rows: 5,
            ..config::Config::default()
        })))
    }

    fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn send(request: Request<Body>) -> (StatusCode, Vec<u8>) {
        tokio_test::block_on(async {
            let response = test_app().oneshot(request).await.unwrap();
            let status = response.status();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, body.to_vec())
        })
    }

    fn send_json(request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(request);
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_health_check() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(request);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[test]
    fn test_summary_over_the_wire() {
        let body = json!({
            "fileName": "q1.csv",
            "rows": [{"region": "North", "sales": 10}, {"region": "South", "sales": 30}]
        });
        let (status, response) = send_json(post_json("/insights/summary", body.to_string()));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["fileName"], "q1.csv");
        assert_eq!(response["status"], "ready");
        assert_eq!(response["summary"]["totalRows"], 2);
        assert_eq!(response["summary"]["insights"][0]["column"], "sales");
        assert_eq!(response["summary"]["insights"][0]["median"], 30.0);
    }

    #[test]
    fn test_malformed_json_is_a_bad_request() {
        let (status, response) = send_json(post_json("/insights/summary", r#"{"rows": [{"a": 1}"#));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response["error"].is_string());
    }

    #[test]
    fn test_rows_must_be_flat_objects() {
        for body in [r#"{"rows": [1, 2]}"#, r#"{"rows": [{"a": [1, 2]}]}"#, r#"{"rows": [{"a": {"b": 1}}]}"#] {
            let (status, response) = send_json(post_json("/insights/summary", body));
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert!(response["error"].is_string());
        }
    }

    #[test]
    fn test_row_limit_is_a_bad_request() {
        let rows: Vec<Value> = (0..6).map(|i| json!({ "n": i })).collect();
        let body = json!({ "rows": rows });
        let (status, response) = send_json(post_json("/insights/summary", body.to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response["error"].as_str().unwrap().contains("at most 5"));
    }

    #[test]
    fn test_body_over_limit_is_rejected() {
        let body = json!({ "rows": [{ "notes": "x".repeat(2048) }] });
        let (status, response) = send_json(post_json("/insights/summary", body.to_string()));
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response["error"].is_string());
    }

    #[test]
    fn test_chart_over_the_wire() {
        let body = json!({
            "rows": [{"month": "Jan", "sales": 3}, {"month": "Feb", "sales": 5}],
            "chart": {"chartType": "bar", "xAxis": "month", "yAxis": "sales"}
        });
        let (status, response) = send_json(post_json("/insights/chart", body.to_string()));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["chartType"], "bar");
        assert_eq!(response["data"]["points"][1]["name"], "Feb");
        assert_eq!(response["data"]["points"][1]["value"], 5.0);
    }
}
