//! Client for downloading the logs behind a distributed trace.
//!
//! A time range is split into windows no longer than the log-export
//! service accepts per request. Every window is requested at once and the
//! batch only succeeds when every window does.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use tracelogs_sdk::{
//!     LogsClient,
//!     config::ClientConfig,
//!     sink::DirectorySink,
//!     store::{MemoryStore, TokenCache},
//!     types::{DeploymentIds, DownloadOptions, TimeRange},
//! };
//!
//! let config = ClientConfig::new("https://auth.example.com", "https://logs.example.com")?;
//! let client = LogsClient::new(config)?;
//! let tokens = TokenCache::new(MemoryStore::default());
//! let options = DownloadOptions::new(
//!     TimeRange::new(1_700_000_000_000, 1_700_010_000_000)?,
//!     DeploymentIds::new(["dep-1".parse()?])?,
//! );
//! let sink = DirectorySink::new("./logs");
//! client
//!     .download(&"proj-1".parse()?, &options, &tokens, &sink, &options.default_filename())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod batch;
pub mod config;
mod client;
pub mod error;
pub mod prompt;
pub mod sink;
pub mod store;
pub mod types;

pub use client::LogsClient;
