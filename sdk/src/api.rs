//! Wire format of the auth and log-export services, and the transport that
//! speaks it.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderValue, Method, Request, header};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{
    config::{ClientConfig, endpoint},
    error::ClientError,
    types::{DeploymentId, DownloadRequest, Millis},
};

const LOGIN_PATH: &str = "user/login";
const LOGS_PATH: &str = "logs/project";
const PROJECT_HEADER: &str = "project";
const AUTHORIZATION_HEADER: &str = "authorization";
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsRequestBody<'a> {
    pub deployments: Vec<DeploymentRef<'a>>,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub start_time: Millis,
    pub end_time: Millis,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRef<'a> {
    pub deployment_id: &'a DeploymentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Both,
}

impl<'a> From<&'a DownloadRequest> for LogsRequestBody<'a> {
    fn from(request: &'a DownloadRequest) -> Self {
        Self {
            deployments: request
                .deployment_ids
                .iter()
                .map(|deployment_id| DeploymentRef { deployment_id })
                .collect(),
            kind: LogKind::Both,
            start_time: request.window.start,
            end_time: request.window.end,
        }
    }
}

pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a SecretString,
}

impl Serialize for LoginRequest<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("LoginRequest", 2)?;
        state.serialize_field("email", self.email)?;
        state.serialize_field("password", self.password.expose_secret())?;
        state.end()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub data: LoginData,
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub token: String,
}

/// The two remote calls a download session makes.
#[async_trait]
pub trait LogsApi: Send + Sync {
    /// Exchange credentials for a raw token (without the `Bearer ` prefix).
    async fn login(&self, request: &LoginRequest<'_>) -> Result<String, ClientError>;

    /// Fetch the log archive for one window.
    async fn export_logs(&self, request: &DownloadRequest) -> Result<Bytes, ClientError>;
}

type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// [`LogsApi`] over HTTP(S).
#[derive(Clone)]
pub struct HttpApi {
    client: HttpsClient,
    login_url: Url,
    logs_url: Url,
    user_agent: HeaderValue,
    request_timeout: Option<std::time::Duration>,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let connector = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::aws_lc_rs::default_provider())
            .map_err(|e| ClientError::Init(e.to_string()))?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();

        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
            login_url: endpoint(&config.auth_base_url, LOGIN_PATH)?,
            logs_url: endpoint(&config.logs_base_url, LOGS_PATH)?,
            user_agent: config.user_agent.clone(),
            request_timeout: config.request_timeout,
        })
    }

    async fn post_json(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<Bytes, ClientError> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, self.user_agent.clone());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Full::new(Bytes::from(body)))
            .map_err(ClientError::Request)?;

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?
                .to_bytes();
            debug!(%url, %status, bytes = body.len(), "response received");

            if !status.is_success() {
                let end = body.len().min(MAX_ERROR_BODY_LEN);
                return Err(ClientError::Status {
                    status,
                    body: String::from_utf8_lossy(&body[..end]).into_owned(),
                });
            }
            Ok(body)
        };

        match self.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, exchange)
                .await
                .map_err(|_| ClientError::Timeout(timeout))?,
            None => exchange.await,
        }
    }
}

#[async_trait]
impl LogsApi for HttpApi {
    async fn login(&self, request: &LoginRequest<'_>) -> Result<String, ClientError> {
        let body = serde_json::to_vec(request).map_err(ClientError::Decode)?;
        let response = self.post_json(&self.login_url, &[], body).await?;
        let LoginResponse { data } =
            serde_json::from_slice(&response).map_err(ClientError::Decode)?;
        Ok(data.token)
    }

    async fn export_logs(&self, request: &DownloadRequest) -> Result<Bytes, ClientError> {
        let body = serde_json::to_vec(&LogsRequestBody::from(request))
            .map_err(ClientError::Decode)?;

        let mut headers = vec![(PROJECT_HEADER, request.project_id.as_str())];
        if let Some(token) = &request.auth_token {
            headers.push((AUTHORIZATION_HEADER, token.expose()));
        }

        self.post_json(&self.logs_url, &headers, body).await
    }
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi")
            .field("login_url", &self.login_url.as_str())
            .field("logs_url", &self.logs_url.as_str())
            .finish_non_exhaustive()
    }
}
