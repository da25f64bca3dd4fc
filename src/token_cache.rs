use crate::asset::{Asset, AssetId, Credentials, Endpoint};
use crate::error::{AuthError, CheckError};
use crate::transport::{HttpRequest, Transport};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Sessions usually expire after 15 minutes; tokens are refreshed after 12.
pub const TOKEN_TTL: Duration = Duration::from_secs(720);

pub const AUTH_USER_HEADER: &str = "X-Auth-User";
pub const AUTH_KEY_HEADER: &str = "X-Auth-Key";
pub const SESSION_HEADER: &str = "X-Auth-Session";

#[derive(Debug, Clone)]
struct TokenRecord {
    token: String,
    issued_at: Instant,
}

impl TokenRecord {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.issued_at) < ttl
    }
}

/// Session tokens keyed by asset, with at most one login in flight per asset.
pub struct TokenCache {
    transport: Arc<dyn Transport>,
    ttl: Duration,
    records: Arc<DashMap<AssetId, TokenRecord>>,
    locks: DashMap<AssetId, Arc<Mutex<()>>>,
}

impl TokenCache {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_ttl(transport, TOKEN_TTL)
    }

    pub fn with_ttl(transport: Arc<dyn Transport>, ttl: Duration) -> Self {
        Self {
            transport,
            ttl,
            records: Arc::new(DashMap::new()),
            locks: DashMap::new(),
        }
    }

    pub async fn acquire(
        &self,
        asset: &Asset,
        credentials: &Credentials,
        endpoint: &Endpoint,
    ) -> Result<String, CheckError> {
        let (username, password) = credentials.require()?;

        if let Some(token) = self.lookup(asset.id) {
            return Ok(token);
        }

        let lock = self.lock_for(asset.id);
        let guard = lock.lock_owned().await;

        if let Some(token) = self.lookup(asset.id) {
            debug!(asset_id = asset.id, "token refreshed while waiting");
            return Ok(token);
        }

        // The login owns the lock guard. If this caller is dropped the task
        // still finishes, stores its token and only then unlocks.
        let transport = Arc::clone(&self.transport);
        let records = Arc::clone(&self.records);
        let asset_id = asset.id;
        let url = endpoint.login_url();
        let login = tokio::spawn(async move {
            let _guard = guard;
            let token = login(transport.as_ref(), url, username, password).await?;
            records.insert(
                asset_id,
                TokenRecord {
                    token: token.clone(),
                    issued_at: Instant::now(),
                },
            );
            Ok::<_, AuthError>(token)
        });

        match login.await {
            Ok(result) => {
                let token = result?;
                info!(asset_id, asset = %asset.name, "session token refreshed");
                Ok(token)
            }
            Err(err) => Err(AuthError::Interrupted(err.to_string()).into()),
        }
    }

    /// No-op when a newer login has already replaced `token`.
    pub fn invalidate(&self, asset_id: AssetId, token: &str) {
        if self
            .records
            .remove_if(&asset_id, |_, record| record.token == token)
            .is_some()
        {
            debug!(asset_id, "session token invalidated");
        }
        // A lock still referenced elsewhere belongs to a login in progress.
        self.locks
            .remove_if(&asset_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn lookup(&self, asset_id: AssetId) -> Option<String> {
        let now = Instant::now();
        self.records
            .get(&asset_id)
            .filter(|record| record.is_fresh(self.ttl, now))
            .map(|record| record.token.clone())
    }

    fn lock_for(&self, asset_id: AssetId) -> Arc<Mutex<()>> {
        let entry = self.locks.entry(asset_id).or_default();
        Arc::clone(entry.value())
    }
}

async fn login(
    transport: &dyn Transport,
    url: String,
    username: String,
    password: String,
) -> Result<String, AuthError> {
    debug!(%url, "POST");
    let request = HttpRequest::post(url)
        .header(AUTH_USER_HEADER, username)
        .header(AUTH_KEY_HEADER, password);

    let resp = transport
        .send(request)
        .await
        .map_err(AuthError::Transport)?;

    if !resp.is_success() {
        warn!(status = resp.status, reason = %resp.reason, "login rejected");
        return Err(AuthError::Status {
            status: resp.status,
            reason: resp.reason,
        });
    }

    resp.header(SESSION_HEADER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(AuthError::MissingSession)
}
