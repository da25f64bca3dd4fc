use crate::asset::Endpoint;
use crate::error::UpstreamError;
use crate::token_cache::SESSION_HEADER;
use crate::transport::{HttpRequest, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        api: &str,
        resource: &str,
        token: &str,
    ) -> Result<T, UpstreamError> {
        let url = endpoint.url(api, resource);
        debug!(%url, "GET");

        let request = HttpRequest::get(url.clone()).header(SESSION_HEADER, token);
        let resp = match self.transport.send(request).await {
            Ok(resp) => resp,
            Err(source) => return Err(UpstreamError::Transport { url, source }),
        };

        if !resp.is_success() {
            return Err(UpstreamError::Status {
                url,
                status: resp.status,
                reason: resp.reason,
            });
        }

        serde_json::from_str(&resp.body).map_err(|err| UpstreamError::Decode {
            resource: url,
            message: err.to_string(),
        })
    }
}
