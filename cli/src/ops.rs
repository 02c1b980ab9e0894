use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use tracelogs_common::{
    trace::{TraceLogContext, parse_trace},
    types::{
        login::LoginInput,
        options::DownloadOptions,
        project::{DeploymentId, ProjectId},
        time::{TimeRange, WindowCapacity},
    },
    window::LogWindow,
};
use tracelogs_sdk::{
    LogsClient,
    prompt::Prompt,
    sink::DirectorySink,
    store::{KeyValueStore, TokenCache},
    types::BatchReport,
};
use tracing::debug;

use crate::{
    cli::{DownloadArgs, LoginArgs, TimeRangeArgs, TraceArgs, WindowsArgs},
    error::CliError,
};

pub fn load_trace(path: &Path, trace_id: Option<&str>) -> Result<TraceLogContext, CliError> {
    let json =
        std::fs::read(path).map_err(|e| CliError::TraceRead(path.display().to_string(), e))?;
    let trace = parse_trace(&json, trace_id)?;
    debug!(trace_id = %trace.trace_id, spans = trace.spans.len(), "trace loaded");
    Ok(TraceLogContext::from(&trace))
}

fn trace_context(args: &TraceArgs) -> Result<Option<TraceLogContext>, CliError> {
    args.trace
        .as_ref()
        .map(|path| load_trace(path, args.trace_id.as_deref()))
        .transpose()
}

/// Explicit bounds win over the ones a trace suggests.
fn resolve_range(
    args: &TimeRangeArgs,
    context: Option<&TraceLogContext>,
) -> (Option<u64>, Option<u64>) {
    let suggested = context.and_then(|c| c.range);
    (
        args.start.map(|t| t.0).or(suggested.map(|r| r.start())),
        args.end.map(|t| t.0).or(suggested.map(|r| r.end())),
    )
}

pub fn plan_windows(
    args: &WindowsArgs,
    configured: WindowCapacity,
) -> Result<(TimeRange, WindowCapacity, Vec<LogWindow>), CliError> {
    let context = trace_context(&args.trace)?;
    let (start, end) = resolve_range(&args.range, context.as_ref());
    let start = start.ok_or_else(|| missing_time("start"))?;
    let end = end.ok_or_else(|| missing_time("end"))?;
    let range = TimeRange::new(start, end)?;
    let capacity = args.capacity.unwrap_or(configured);
    Ok((range, capacity, range.windows(capacity)))
}

fn missing_time(which: &str) -> CliError {
    CliError::InvalidArgs(miette::miette!(
        help = format!("Pass `--{which}`, or `--trace` to take it from a trace"),
        "Please input {which} time"
    ))
}

pub fn login_input(args: LoginArgs) -> Result<LoginInput, CliError> {
    let LoginArgs {
        token,
        email,
        password,
    } = args;
    // A password picked up from the environment must not clash with a token.
    let password = if token.is_some() { None } else { password };
    Ok(LoginInput::from_fields(token, email, password)?)
}

pub async fn login<S: KeyValueStore>(
    client: &LogsClient,
    tokens: &TokenCache<S>,
    input: LoginInput,
) -> Result<(), CliError> {
    let result = client.login(tokens, input).await;
    let next = Prompt::after_login(result.is_ok());
    debug!(?next, "login finished");
    result.map_err(CliError::Login)?;
    Ok(())
}

pub struct DownloadPlan {
    pub project_id: ProjectId,
    pub options: DownloadOptions,
    pub filename: String,
    pub output_dir: PathBuf,
    pub require_auth: bool,
}

pub fn download_plan(
    args: DownloadArgs,
    configured_output_dir: Option<PathBuf>,
) -> Result<DownloadPlan, CliError> {
    let context = trace_context(&args.trace)?;
    let (start, end) = resolve_range(&args.range, context.as_ref());

    let project_id = args
        .project
        .or_else(|| context.as_ref().and_then(|c| c.project_id.clone()))
        .ok_or_else(|| {
            CliError::InvalidArgs(miette::miette!(
                help = "Pass `--project`, or `--trace` with a `rioProjectId` process tag",
                "Project ID is required"
            ))
        })?;

    let deployments: Vec<DeploymentId> = if args.deployments.is_empty() {
        context.map(|c| c.deployment_ids).unwrap_or_default()
    } else {
        args.deployments
    };

    let options = DownloadOptions::from_parts(start, end, deployments)?;
    let filename = args
        .filename
        .unwrap_or_else(|| options.default_filename());
    let output_dir = args
        .output_dir
        .or(configured_output_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(DownloadPlan {
        project_id,
        options,
        filename,
        output_dir,
        require_auth: args.require_auth,
    })
}

pub struct DownloadOutcome {
    pub report: BatchReport,
    /// Every archive written, one per window.
    pub saved: Vec<PathBuf>,
}

pub async fn download<S: KeyValueStore>(
    client: &LogsClient,
    tokens: &TokenCache<S>,
    plan: &DownloadPlan,
) -> Result<DownloadOutcome, CliError> {
    let has_token = tokens.get()?.is_some();
    if Prompt::on_start(has_token, plan.require_auth).on_confirm() != Prompt::Fetching {
        return Err(CliError::LoginRequired);
    }

    let windows = client.plan(&plan.options).len();
    let sink = DirectorySink::new(&plan.output_dir);

    let spinner = ProgressBar::new_spinner()
        .with_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        )
        .with_message(format!("Downloading {windows} log window(s)"));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = client
        .download(
            &plan.project_id,
            &plan.options,
            tokens,
            &sink,
            &plan.filename,
        )
        .await;
    spinner.finish_and_clear();

    Ok(DownloadOutcome {
        report: result?,
        saved: sink.saved_paths(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::{
        cli::{DownloadArgs, TimeRangeArgs, TraceArgs},
        types::Timestamp,
    };

    use super::download_plan;

    const TRACE: &str = r#"{
        "data": [{
            "traceID": "abc123",
            "spans": [
                {"startTime": 1700000000000000, "duration": 5000000},
                {"startTime": 1700000002000000, "duration": 1000}
            ],
            "processes": {
                "p1": {"serviceName": "api", "tags": [
                    {"key": "rioProjectId", "type": "string", "value": "proj-9"},
                    {"key": "rioDeploymentId", "type": "string", "value": "dep-1"}
                ]},
                "p2": {"serviceName": "worker", "tags": [
                    {"key": "rioDeploymentId", "type": "string", "value": "dep-2"}
                ]}
            }
        }]
    }"#;

    fn args(trace: Option<PathBuf>) -> DownloadArgs {
        DownloadArgs {
            trace: TraceArgs {
                trace,
                trace_id: None,
            },
            range: TimeRangeArgs {
                start: None,
                end: None,
            },
            project: None,
            deployments: Vec::new(),
            output_dir: None,
            filename: None,
            require_auth: false,
        }
    }

    #[test]
    fn plan_from_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        std::fs::write(&path, TRACE).unwrap();

        let plan = download_plan(args(Some(path)), Some(PathBuf::from("/tmp/logs"))).unwrap();

        assert_eq!(plan.project_id.as_str(), "proj-9");
        assert_eq!(plan.options.deployment_ids.to_string(), "dep-1, dep-2");
        assert_eq!(plan.options.range.start(), 1_700_000_000_000);
        assert_eq!(plan.options.range.end(), 1_700_000_005_000);
        assert_eq!(plan.filename, "1700000000000.tar");
        assert_eq!(plan.output_dir, PathBuf::from("/tmp/logs"));
    }

    #[test]
    fn flags_override_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        std::fs::write(&path, TRACE).unwrap();

        let mut args = args(Some(path));
        args.project = Some("other".parse().unwrap());
        args.deployments = vec!["dep-x".parse().unwrap()];
        args.range.start = Some(Timestamp(1_700_000_001_000));
        args.filename = Some("custom.tar".to_owned());
        args.output_dir = Some(PathBuf::from("out"));

        let plan = download_plan(args, Some(PathBuf::from("/tmp/logs"))).unwrap();

        assert_eq!(plan.project_id.as_str(), "other");
        assert_eq!(plan.options.deployment_ids.to_string(), "dep-x");
        assert_eq!(plan.options.range.start(), 1_700_000_001_000);
        assert_eq!(plan.options.range.end(), 1_700_000_005_000);
        assert_eq!(plan.filename, "custom.tar");
        assert_eq!(plan.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn plan_without_trace_needs_every_field() {
        assert!(download_plan(args(None), None).is_err());

        let mut args = args(None);
        args.project = Some("proj".parse().unwrap());
        args.deployments = vec!["dep".parse().unwrap()];
        args.range.start = Some(Timestamp(10));
        assert!(download_plan(args, None).is_err());
    }
}
