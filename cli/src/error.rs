use miette::Diagnostic;
use thiserror::Error;
use tracelogs_common::types::ValidationError;
use tracelogs_sdk::{
    error::{ClientError, DownloadError, StoreError},
    prompt::Prompt,
};

const HELP: &str = color_print::cstr!(
    "\n<cyan><bold>Notice something wrong?</bold></cyan>\n\n\
     <green> > Open an issue:</green>\n\
     <bold>https://github.com/tracelogs/tracelogs/issues</bold>"
);

const LOGIN_HELP: &str = color_print::cstr!(
    "The cached token was discarded. Sign in again with \
     <bold>tracelogs login</bold> and retry the download."
);

const OPTIONS_HELP: &str = color_print::cstr!(
    "Check the time range and deployments, then retry. \
     If the service requires authentication, run <bold>tracelogs login</bold> first."
);

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] CliConfigError),

    #[error("Invalid CLI arguments: {0}")]
    #[diagnostic(transparent)]
    InvalidArgs(miette::Report),

    #[error("Failed to initialize client")]
    #[diagnostic(help("{}", HELP))]
    SdkInit(#[source] ClientError),

    #[error("Failed to read trace file '{0}'")]
    TraceRead(String, #[source] std::io::Error),

    #[error(transparent)]
    Session(#[from] StoreError),

    #[error("Failed to log in: {0}")]
    #[diagnostic(help("Check your credentials, or pass an existing token with `--token`."))]
    Login(#[source] ClientError),

    #[error("Failed to log out: {0}")]
    Logout(#[source] ClientError),

    #[error("Not logged in")]
    #[diagnostic(help("Run `tracelogs login` first, or drop `--require-auth`."))]
    LoginRequired,

    #[error("{0}")]
    #[diagnostic(help("{}", LOGIN_HELP))]
    DownloadUnauthorized(#[source] DownloadError),

    #[error("{0}")]
    #[diagnostic(help("{}", OPTIONS_HELP))]
    Download(#[source] DownloadError),
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidArgs(miette::miette!("{}", err))
    }
}

impl From<DownloadError> for CliError {
    fn from(err: DownloadError) -> Self {
        match err.next_prompt() {
            Prompt::Login => Self::DownloadUnauthorized(err),
            _ => Self::Download(err),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimestampParseError {
    #[error("Timestamp must not be empty")]
    Empty,
    #[error("Timestamp '{0}' is out of range")]
    OutOfRange(String),
    #[error("Invalid timestamp '{0}': {1}. Expected epoch milliseconds or RFC 3339")]
    Invalid(String, String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum CliConfigError {
    #[error("Failed to find a home for config directory")]
    DirNotFound,

    #[error("Failed to load config file")]
    #[diagnostic(help(
        "Check ~/.config/tracelogs/config.toml and any `TRACELOGS_*` environment variables."
    ))]
    Load(#[from] config::ConfigError),

    #[error("Failed to write config file")]
    Write(#[source] std::io::Error),

    #[error("Failed to serialize config")]
    Serialize(#[source] toml::ser::Error),

    #[error("Invalid value '{1}' for config key '{0}': {2}")]
    InvalidValue(String, String, String),

    #[error("Missing auth service URL")]
    #[diagnostic(help(
        "Run `tracelogs config set auth_base_url <url>` or set the `TRACELOGS_AUTH_BASE_URL` environment variable."
    ))]
    MissingAuthBaseUrl,

    #[error("Missing log service URL")]
    #[diagnostic(help(
        "Run `tracelogs config set logs_base_url <url>` or set the `TRACELOGS_LOGS_BASE_URL` environment variable."
    ))]
    MissingLogsBaseUrl,
}

#[cfg(test)]
mod tests {
    use miette::Diagnostic;
    use tracelogs_sdk::{
        error::{BatchError, ClientError, DownloadError, StatusCode},
        prompt::Prompt,
    };

    use super::{CliConfigError, CliError};

    fn batch_failure(next: Prompt) -> CliError {
        DownloadError::Batch {
            next,
            token_invalidated: next == Prompt::Login,
            source: BatchError {
                failed: 1,
                total: 2,
                source: ClientError::Status {
                    status: StatusCode::UNAUTHORIZED,
                    body: String::new(),
                },
            },
        }
        .into()
    }

    #[test]
    fn batch_failure_help_follows_prompt() {
        let login = batch_failure(Prompt::Login);
        assert!(matches!(login, CliError::DownloadUnauthorized(_)));
        let help = login.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("tracelogs login"));
        assert!(help.contains("discarded"));

        let options = batch_failure(Prompt::Options);
        let help = options.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("time range"));
    }

    #[test]
    fn missing_endpoint_names_env_var() {
        let err = CliConfigError::MissingLogsBaseUrl;
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("TRACELOGS_LOGS_BASE_URL"));
    }
}
