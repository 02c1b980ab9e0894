use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use bytes::Bytes;
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::{Value, json};
use tracelogs_sdk::{
    LogsClient,
    api::{HttpApi, LoginRequest, LogsApi},
    config::ClientConfig,
    error::{ClientError, DownloadError},
    prompt::Prompt,
    sink::DirectorySink,
    store::{MemoryStore, TokenCache},
    types::{
        AuthToken, DeploymentIds, DownloadOptions, DownloadRequest, LogWindow, LoginInput,
        TimeRange, WindowCapacity,
    },
};

#[derive(Debug, Clone)]
struct Seen {
    project: Option<String>,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Server {
    seen: Arc<Mutex<Vec<Seen>>>,
    fail_status: Option<StatusCode>,
}

async fn export(
    State(server): State<Server>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let start = body["startTime"].as_u64().unwrap_or_default();
    server.seen.lock().push(Seen {
        project: header("project"),
        authorization: header("authorization"),
        body,
    });
    match server.fail_status {
        Some(status) => (status, Bytes::from_static(b"token expired")),
        None => (StatusCode::OK, Bytes::from(format!("archive-{start}"))),
    }
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] == "hunter2" {
        (
            StatusCode::OK,
            Json(json!({"data": {"token": "t0k3n", "user": {"email": body["email"]}}})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid credentials"})),
        )
    }
}

async fn spawn_server(server: Server) -> SocketAddr {
    let app = Router::new()
        .route("/api/logs/project", post(export))
        .route("/auth/user/login", post(login))
        .with_state(server);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::new(
        &format!("http://{addr}/auth"),
        &format!("http://{addr}/api/"),
    )
    .unwrap()
    .with_window_capacity(WindowCapacity::from_millis(90).unwrap())
}

fn options() -> DownloadOptions {
    DownloadOptions::new(
        TimeRange::new(0, 200).unwrap(),
        DeploymentIds::new(["dep-a".parse().unwrap(), "dep-b".parse().unwrap()]).unwrap(),
    )
}

#[tokio::test]
async fn export_sends_headers_and_body() {
    let server = Server::default();
    let addr = spawn_server(server.clone()).await;
    let api = HttpApi::new(&config(addr)).unwrap();

    let blob = api
        .export_logs(&DownloadRequest {
            project_id: "proj-1".parse().unwrap(),
            deployment_ids: options().deployment_ids,
            auth_token: Some(AuthToken::new("Bearer abc")),
            window: LogWindow { start: 90, end: 180 },
        })
        .await
        .unwrap();

    assert_eq!(blob, Bytes::from_static(b"archive-90"));
    let seen = server.seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].project.as_deref(), Some("proj-1"));
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer abc"));
    assert_eq!(
        seen[0].body,
        json!({
            "deployments": [{"deploymentId": "dep-a"}, {"deploymentId": "dep-b"}],
            "type": "both",
            "startTime": 90,
            "endTime": 180,
        })
    );
}

#[tokio::test]
async fn export_without_token_omits_authorization() {
    let server = Server::default();
    let addr = spawn_server(server.clone()).await;
    let api = HttpApi::new(&config(addr)).unwrap();

    api.export_logs(&DownloadRequest {
        project_id: "proj-1".parse().unwrap(),
        deployment_ids: options().deployment_ids,
        auth_token: None,
        window: LogWindow { start: 0, end: 90 },
    })
    .await
    .unwrap();

    assert_eq!(server.seen.lock()[0].authorization, None);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = Server {
        fail_status: Some(StatusCode::UNAUTHORIZED),
        ..Default::default()
    };
    let addr = spawn_server(server).await;
    let api = HttpApi::new(&config(addr)).unwrap();

    let err = api
        .export_logs(&DownloadRequest {
            project_id: "proj-1".parse().unwrap(),
            deployment_ids: options().deployment_ids,
            auth_token: None,
            window: LogWindow { start: 0, end: 90 },
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.to_string(), "Unauthorized (HTTP 401): token expired");
}

#[tokio::test]
async fn login_exchanges_credentials() {
    let addr = spawn_server(Server::default()).await;
    let api = HttpApi::new(&config(addr)).unwrap();
    let password = SecretString::from("hunter2".to_owned());

    let token = api
        .login(&LoginRequest {
            email: "dev@example.com",
            password: &password,
        })
        .await
        .unwrap();
    assert_eq!(token, "t0k3n");

    let wrong = SecretString::from("nope".to_owned());
    let err = api
        .login(&LoginRequest {
            email: "dev@example.com",
            password: &wrong,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn login_then_download_to_directory() {
    let server = Server::default();
    let addr = spawn_server(server.clone()).await;
    let client = LogsClient::new(config(addr)).unwrap();
    let tokens = TokenCache::new(MemoryStore::default());
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path());

    client
        .login(
            &tokens,
            LoginInput::Credentials {
                email: "dev@example.com".to_owned(),
                password: SecretString::from("hunter2".to_owned()),
            },
        )
        .await
        .unwrap();

    let options = options();
    let report = client
        .download(
            &"proj-1".parse().unwrap(),
            &options,
            &tokens,
            &sink,
            &options.default_filename(),
        )
        .await
        .unwrap();

    assert_eq!(report.windows, 3);
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["0 (1).tar", "0 (2).tar", "0.tar"]);
    assert_eq!(sink.saved_paths().len(), 3);
    assert!(
        server
            .seen
            .lock()
            .iter()
            .all(|seen| seen.authorization.as_deref() == Some("Bearer t0k3n"))
    );
}

#[tokio::test]
async fn rejected_download_invalidates_token() {
    let server = Server {
        fail_status: Some(StatusCode::UNAUTHORIZED),
        ..Default::default()
    };
    let addr = spawn_server(server).await;
    let client = LogsClient::new(config(addr)).unwrap();
    let tokens = TokenCache::new(MemoryStore::default());
    tokens.set(&AuthToken::new("Bearer stale")).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = client
        .download(
            &"proj-1".parse().unwrap(),
            &options(),
            &tokens,
            &DirectorySink::new(dir.path()),
            "0.tar",
        )
        .await
        .unwrap_err();

    assert_eq!(err.next_prompt(), Prompt::Login);
    assert!(matches!(
        err,
        DownloadError::Batch { ref source, .. }
            if matches!(source.source, ClientError::Status { .. }) && source.failed == 3
    ));
    assert!(tokens.get().unwrap().is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
