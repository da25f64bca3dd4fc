use crate::metrics::Metrics;
use crate::state::State as ProbeState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct HttpAppState {
    pub metrics: Arc<Metrics>,
    pub state: Arc<RwLock<ProbeState>>,
}

pub fn build_router(metrics: Arc<Metrics>, state: Arc<RwLock<ProbeState>>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .route("/api/state", get(state_handler))
        .with_state(HttpAppState { metrics, state })
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler(State(state): State<HttpAppState>) -> Response {
    state.metrics.inc_scrape_count();
    match state.metrics.encode_metrics() {
        Ok(encoded) => {
            let mut response = Response::new(Body::from(encoded));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to encode metrics: {err}"),
        )
            .into_response(),
    }
}

async fn state_handler(State(state): State<HttpAppState>) -> impl IntoResponse {
    let guard = state.state.read().await;
    Json(guard.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::checks::CheckName;
    use crate::error::CheckError;
    use crate::scheduler::{CheckReport, RunOutcome};
    use axum::body::to_bytes;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn state_after_round() -> ProbeState {
        let mut state = ProbeState::new(10);
        state.apply_reports(
            20,
            &[CheckReport {
                asset: Asset::new(7, "zfs-07"),
                check: CheckName::Memory,
                started_at_unix: 15,
                duration: Duration::from_millis(40),
                outcome: RunOutcome::Failed(CheckError::Config(
                    "missing username or password in asset config".to_string(),
                )),
            }],
        );
        state
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let metrics = Metrics::new().expect("metrics init");
        let state = Arc::new(RwLock::new(ProbeState::new(0)));
        let app = build_router(metrics, state);

        let (status, body) = get_body(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn metrics_render_after_round() {
        let metrics = Metrics::new().expect("metrics init");
        let snapshot = state_after_round();
        metrics.update_from_state(&snapshot, 0);
        let app = build_router(metrics.clone(), Arc::new(RwLock::new(snapshot)));

        let (status, text) = get_body(app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("zfsprobe_uptime_seconds"));
        assert!(text.contains(r#"zfsprobe_check_up{asset="zfs-07",check="memory"} 0"#));
        assert!(text.contains("zfsprobe_scrape_count_total 1"));
    }

    #[tokio::test]
    async fn api_state_returns_json() {
        let metrics = Metrics::new().expect("metrics init");
        let state = Arc::new(RwLock::new(state_after_round()));
        let app = build_router(metrics, state);

        let (status, text) = get_body(app, "/api/state").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["rounds"], 1);
        let memory = &json["assets"]["zfs-07"]["memory"];
        assert_eq!(memory["ok"], false);
        assert_eq!(memory["outcome"], "config");
        assert!(memory["output"].is_null());
    }
}
