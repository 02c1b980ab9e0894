use tracing::{Instrument, info, info_span, warn};

use crate::{
    api::{HttpApi, LogsApi},
    auth,
    batch::fetch_all_windows,
    config::ClientConfig,
    error::{ClientError, DownloadError},
    prompt::Prompt,
    sink::FileSink,
    store::{KeyValueStore, TokenCache},
    types::{AuthToken, BatchReport, DownloadOptions, DownloadRequest, LogWindow, LoginInput, ProjectId},
};

/// Entry point for logging in and downloading trace logs.
#[derive(Debug, Clone)]
pub struct LogsClient<A = HttpApi> {
    config: ClientConfig,
    api: A,
}

impl LogsClient<HttpApi> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let api = HttpApi::new(&config)?;
        Ok(Self { config, api })
    }
}

impl<A: LogsApi> LogsClient<A> {
    /// Use a custom [`LogsApi`] instead of HTTP.
    pub fn with_api(config: ClientConfig, api: A) -> Self {
        Self { config, api }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn login<S: KeyValueStore>(
        &self,
        tokens: &TokenCache<S>,
        input: LoginInput,
    ) -> Result<AuthToken, ClientError> {
        auth::login(&self.api, tokens, input).await
    }

    /// Windows a download of `options` would request.
    pub fn plan(&self, options: &DownloadOptions) -> Vec<LogWindow> {
        options.range.windows(self.config.window_capacity)
    }

    /// Downloads the logs for `options`, one request per window.
    ///
    /// The cached token is read once up front and sent with every window.
    /// If the batch fails while a token was in use, the token is discarded
    /// and the error points back to the login prompt; without a token it
    /// points back to the options prompt.
    pub async fn download<S, K>(
        &self,
        project_id: &ProjectId,
        options: &DownloadOptions,
        tokens: &TokenCache<K>,
        sink: &S,
        filename: &str,
    ) -> Result<BatchReport, DownloadError>
    where
        S: FileSink + ?Sized,
        K: KeyValueStore,
    {
        let auth_token = tokens.get()?;
        let auth_in_use = auth_token.is_some();
        let windows = self.plan(options);

        let span = info_span!(
            "download",
            project = %project_id,
            range = %options.range,
            windows = windows.len(),
            auth_in_use,
        );

        let build_request = |window| DownloadRequest {
            project_id: project_id.clone(),
            deployment_ids: options.deployment_ids.clone(),
            auth_token: auth_token.clone(),
            window,
        };

        let outcome = fetch_all_windows(&windows, build_request, &self.api, sink, filename)
            .instrument(span)
            .await;

        match outcome {
            Ok(report) => {
                info!(windows = report.windows, bytes = report.bytes, "logs downloaded");
                Ok(report)
            }
            Err(source) => {
                let mut token_invalidated = false;
                if auth_in_use {
                    match tokens.clear() {
                        Ok(()) => token_invalidated = true,
                        Err(error) => warn!(%error, "failed to clear cached token"),
                    }
                }
                Err(DownloadError::Batch {
                    next: Prompt::after_batch(false, auth_in_use),
                    token_invalidated,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;

    use super::LogsClient;
    use crate::{
        api::{LoginRequest, LogsApi},
        config::ClientConfig,
        error::{ClientError, DownloadError},
        prompt::Prompt,
        sink::FileSink,
        store::{MemoryStore, TokenCache},
        types::{
            AuthToken, DeploymentIds, DownloadOptions, DownloadRequest, TimeRange, WindowCapacity,
        },
    };

    /// Answers every window, or fails all of them with `status`.
    struct FakeApi {
        status: Option<http::StatusCode>,
        seen: Mutex<Vec<DownloadRequest>>,
    }

    impl FakeApi {
        fn new(status: Option<http::StatusCode>) -> Self {
            Self {
                status,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LogsApi for FakeApi {
        async fn login(&self, _request: &LoginRequest<'_>) -> Result<String, ClientError> {
            Ok("fresh".to_owned())
        }

        async fn export_logs(&self, request: &DownloadRequest) -> Result<Bytes, ClientError> {
            self.seen.lock().push(request.clone());
            match self.status {
                Some(status) => Err(ClientError::Status {
                    status,
                    body: String::new(),
                }),
                None => Ok(Bytes::from_static(b"tar")),
            }
        }
    }

    #[derive(Default)]
    struct CountingSink {
        saves: AtomicUsize,
    }

    #[async_trait]
    impl FileSink for CountingSink {
        async fn save(&self, _blob: Bytes, _filename: &str) -> std::io::Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn client(api: FakeApi) -> LogsClient<FakeApi> {
        let config = ClientConfig::new("http://auth.test", "http://logs.test")
            .unwrap()
            .with_window_capacity(WindowCapacity::from_millis(90).unwrap());
        LogsClient::with_api(config, api)
    }

    fn options() -> DownloadOptions {
        DownloadOptions::new(
            TimeRange::new(0, 200).unwrap(),
            DeploymentIds::new(["dep-a".parse().unwrap()]).unwrap(),
        )
    }

    #[tokio::test]
    async fn every_window_carries_the_cached_token() {
        let client = client(FakeApi::new(None));
        let tokens = TokenCache::new(MemoryStore::default());
        tokens.set(&AuthToken::new("Bearer abc")).unwrap();
        let sink = CountingSink::default();

        let report = client
            .download(&"proj".parse().unwrap(), &options(), &tokens, &sink, "0.tar")
            .await
            .unwrap();

        assert_eq!(report.windows, 3);
        assert_eq!(sink.saves.load(Ordering::SeqCst), 3);

        let seen = client.api.seen.lock();
        let mut windows: Vec<(u64, u64)> =
            seen.iter().map(|r| (r.window.start, r.window.end)).collect();
        windows.sort();
        assert_eq!(windows, vec![(0, 90), (90, 180), (180, 270)]);
        assert!(seen.iter().all(|r| {
            r.project_id.as_str() == "proj"
                && r.auth_token.as_ref().map(AuthToken::expose) == Some("Bearer abc")
        }));
        assert!(tokens.get().unwrap().is_some());
    }

    #[tokio::test]
    async fn failure_with_token_invalidates_it() {
        let client = client(FakeApi::new(Some(http::StatusCode::UNAUTHORIZED)));
        let tokens = TokenCache::new(MemoryStore::default());
        tokens.set(&AuthToken::new("Bearer stale")).unwrap();

        let err = client
            .download(
                &"proj".parse().unwrap(),
                &options(),
                &tokens,
                &CountingSink::default(),
                "0.tar",
            )
            .await
            .unwrap_err();

        assert_matches!(
            err,
            DownloadError::Batch {
                next: Prompt::Login,
                token_invalidated: true,
                ..
            }
        );
        assert!(tokens.get().unwrap().is_none());
    }

    #[tokio::test]
    async fn failure_without_token_returns_to_options() {
        let client = client(FakeApi::new(Some(http::StatusCode::BAD_GATEWAY)));
        let tokens = TokenCache::new(MemoryStore::default());

        let err = client
            .download(
                &"proj".parse().unwrap(),
                &options(),
                &tokens,
                &CountingSink::default(),
                "0.tar",
            )
            .await
            .unwrap_err();

        assert_eq!(err.next_prompt(), Prompt::Options);
        assert_matches!(err, DownloadError::Batch { token_invalidated: false, ref source, .. }
            if source.failed == 3 && source.source.status() == Some(http::StatusCode::BAD_GATEWAY));
        assert!(client.api.seen.lock().iter().all(|r| r.auth_token.is_none()));
    }

    #[tokio::test]
    async fn login_then_download_uses_bearer_token() {
        let client = client(FakeApi::new(None));
        let tokens = TokenCache::new(MemoryStore::default());

        client
            .login(
                &tokens,
                crate::types::LoginInput::Credentials {
                    email: "dev@example.com".to_owned(),
                    password: secrecy::SecretString::from("pw".to_owned()),
                },
            )
            .await
            .unwrap();
        client
            .download(
                &"proj".parse().unwrap(),
                &options(),
                &tokens,
                &CountingSink::default(),
                "0.tar",
            )
            .await
            .unwrap();

        assert!(client.api.seen.lock().iter().all(|r| {
            r.auth_token.as_ref().map(AuthToken::expose) == Some("Bearer fresh")
        }));

        crate::auth::logout(&tokens).unwrap();
        assert!(tokens.get().unwrap().is_none());
    }

    #[test]
    fn plan_uses_configured_capacity() {
        let client = client(FakeApi::new(None));
        let windows = client.plan(&options());
        assert_eq!(windows.len(), 3);
        assert_eq!(windows.last().map(|w| w.end), Some(270));
    }
}
