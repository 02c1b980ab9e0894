use std::time::Duration;

use http::HeaderValue;
use url::Url;

use crate::{error::ClientError, types::WindowCapacity};

const DEFAULT_USER_AGENT: &str = concat!("tracelogs-sdk/", env!("CARGO_PKG_VERSION"));

/// Configuration for a [`LogsClient`](crate::LogsClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) auth_base_url: Url,
    pub(crate) logs_base_url: Url,
    pub(crate) window_capacity: WindowCapacity,
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) user_agent: HeaderValue,
}

impl ClientConfig {
    /// Create a new [`ClientConfig`] for the given service base URLs.
    pub fn new(auth_base_url: &str, logs_base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            auth_base_url: parse_base_url(auth_base_url)?,
            logs_base_url: parse_base_url(logs_base_url)?,
            window_capacity: WindowCapacity::default(),
            request_timeout: None,
            user_agent: HeaderValue::from_static(DEFAULT_USER_AGENT),
        })
    }

    /// Set the longest span a single log-export request may cover.
    ///
    /// Defaults to 90 minutes.
    pub fn with_window_capacity(self, window_capacity: WindowCapacity) -> Self {
        Self {
            window_capacity,
            ..self
        }
    }

    /// Set a timeout for every individual request.
    ///
    /// Unset by default, leaving timeouts to the transport.
    pub fn with_request_timeout(self, request_timeout: Duration) -> Self {
        Self {
            request_timeout: Some(request_timeout),
            ..self
        }
    }

    pub fn with_user_agent(self, user_agent: &str) -> Result<Self, http::header::InvalidHeaderValue> {
        Ok(Self {
            user_agent: HeaderValue::from_str(user_agent)?,
            ..self
        })
    }

    pub fn auth_base_url(&self) -> &Url {
        &self.auth_base_url
    }

    pub fn logs_base_url(&self) -> &Url {
        &self.logs_base_url
    }

    pub fn window_capacity(&self) -> WindowCapacity {
        self.window_capacity
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw.trim()).map_err(|e| ClientError::InvalidUrl(raw.to_owned(), e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Init(format!(
            "unsupported URL scheme '{}' in '{raw}'",
            url.scheme()
        )));
    }
    Ok(url)
}

/// Appends `path` to `base`, keeping any path prefix `base` already has.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, ClientError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| ClientError::InvalidUrl(joined, e))
}
