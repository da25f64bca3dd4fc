use crate::token_cache::SESSION_HEADER;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use reqwest::{Method, Url};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Scripted appliance: logins hand out `token-1`, `token-2`, ... and GETs are
/// answered from a table keyed by URL path.
#[derive(Default)]
pub struct FakeTransport {
    login_delay: Duration,
    login_failure: Mutex<Option<(u16, String)>>,
    omit_session: Mutex<bool>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    path_gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    routes: Mutex<HashMap<String, Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    logins: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub fn fail_login(&self, status: u16, reason: &str) {
        *self.login_failure.lock().unwrap() = Some((status, reason.to_string()));
    }

    pub fn omit_session_header(&self) {
        *self.omit_session.lock().unwrap() = true;
    }

    /// Logins to `host` wait for a permit on `gate`.
    pub fn gate_login(&self, host: &str, gate: Arc<Semaphore>) {
        self.gates.lock().unwrap().insert(host.to_string(), gate);
    }

    /// GETs of `path` wait for a permit on `gate` before answering.
    pub fn gate_path(&self, path: &str, gate: Arc<Semaphore>) {
        self.path_gates.lock().unwrap().insert(path.to_string(), gate);
    }

    pub fn respond(&self, path: &str, body: serde_json::Value) {
        self.respond_with(path, 200, "OK", body);
    }

    pub fn respond_with(&self, path: &str, status: u16, reason: &str, body: serde_json::Value) {
        let resp = HttpResponse {
            status,
            reason: reason.to_string(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        };
        self.routes.lock().unwrap().insert(path.to_string(), Ok(resp));
    }

    pub fn fail_with(&self, path: &str, err: TransportError) {
        self.routes.lock().unwrap().insert(path.to_string(), Err(err));
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn login(&self, request: &HttpRequest) -> HttpResponse {
        let gate = self.gates.lock().unwrap().get(&host_of(&request.url)).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }

        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((status, reason)) = self.login_failure.lock().unwrap().clone() {
            return HttpResponse {
                status,
                reason,
                ..HttpResponse::default()
            };
        }

        let mut headers = Vec::new();
        if !*self.omit_session.lock().unwrap() {
            headers.push((SESSION_HEADER.to_lowercase(), format!("token-{n}")));
        }
        HttpResponse {
            status: 201,
            reason: "Created".to_string(),
            headers,
            body: String::new(),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let path = path_of(&request.url);
        if request.method == Method::POST && path.starts_with("/api/access/") {
            return Ok(self.login(&request).await);
        }

        let gate = self.path_gates.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }
        let route = self.routes.lock().unwrap().get(&path).cloned();
        route.unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 404,
                reason: "Not Found".to_string(),
                ..HttpResponse::default()
            })
        })
    }
}

fn host_of(url: &str) -> String {
    let url = Url::parse(url).expect("absolute request url");
    url.host_str().unwrap_or_default().to_string()
}

fn path_of(url: &str) -> String {
    let url = Url::parse(url).expect("absolute request url");
    url.path().to_string()
}
