use std::fmt;

use secrecy::{ExposeSecret, SecretString};
pub use tracelogs_common::{
    types::{
        ValidationError,
        login::LoginInput,
        options::DownloadOptions,
        project::{DeploymentId, DeploymentIds, ProjectId},
        time::{Millis, TimeRange, WindowCapacity},
    },
    window::{LogWindow, split_into_windows},
};

/// Bearer credential gating authenticated log exports.
///
/// The value is sent verbatim as the `Authorization` header, so tokens
/// obtained through a credential login already carry the `Bearer ` prefix.
pub struct AuthToken(SecretString);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Token returned by a credential login, prefixed for use as a header.
    pub fn bearer(raw: &str) -> Self {
        Self::new(format!("{}{raw}", tracelogs_common::caps::BEARER_PREFIX))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for AuthToken {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

impl From<SecretString> for AuthToken {
    fn from(value: SecretString) -> Self {
        Self(value)
    }
}

/// One outbound log-export request covering a single window.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub project_id: ProjectId,
    pub deployment_ids: DeploymentIds,
    pub auth_token: Option<AuthToken>,
    pub window: LogWindow,
}

/// Outcome of a batch in which every window succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub windows: usize,
    pub bytes: u64,
}
