use crate::normalize::CheckOutput;
use crate::transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("incomplete result: {reason}")]
    Incomplete {
        reason: String,
        partial: CheckOutput,
    },
}

impl CheckError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(_) => "auth",
            Self::Upstream(_) => "upstream",
            Self::Incomplete { .. } => "incomplete",
        }
    }

    pub fn partial(&self) -> Option<&CheckOutput> {
        match self {
            Self::Incomplete { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("response status code: {status}. reason: {reason}")]
    Status { status: u16, reason: String },
    #[error("missing `X-Auth-Session` token in response")]
    MissingSession,
    #[error(transparent)]
    Transport(TransportError),
    #[error("login task did not complete: {0}")]
    Interrupted(String),
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("GET {url}: response status code: {status}. reason: {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },
    #[error("GET {url}: {source}")]
    Transport {
        url: String,
        source: TransportError,
    },
    #[error("{resource}: invalid payload: {message}")]
    Decode { resource: String, message: String },
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
