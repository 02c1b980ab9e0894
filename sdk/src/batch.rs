//! Fan-out of one log-export request per window, joined into a single
//! all-or-nothing outcome.

use std::collections::BTreeMap;

use futures::{StreamExt, stream::FuturesUnordered};
use tracing::{Instrument, debug, info_span, warn};

use crate::{
    api::LogsApi,
    error::{BatchError, ClientError},
    sink::FileSink,
    types::{BatchReport, DownloadRequest, LogWindow},
};

/// Requests every window at once and waits for all of them to settle.
///
/// Each archive is saved under `filename` as soon as its window completes, so
/// windows that succeeded before another one failed stay saved. The batch
/// fails if any window fails, whether while fetching or while saving. There
/// is no retry and no cancellation of windows still in flight.
pub async fn fetch_all_windows<A, S, F>(
    windows: &[LogWindow],
    build_request: F,
    api: &A,
    sink: &S,
    filename: &str,
) -> Result<BatchReport, BatchError>
where
    A: LogsApi + ?Sized,
    S: FileSink + ?Sized,
    F: Fn(LogWindow) -> DownloadRequest,
{
    let total = windows.len();

    let mut in_flight: FuturesUnordered<_> = windows
        .iter()
        .copied()
        .enumerate()
        .map(|(index, window)| {
            let request = build_request(window);
            let span = info_span!("window", index, start = window.start, end = window.end);
            async move { (index, fetch_and_save(api, sink, &request, filename).await) }
                .instrument(span)
        })
        .collect();

    let mut results: BTreeMap<usize, Result<u64, ClientError>> = BTreeMap::new();
    while let Some((index, result)) = in_flight.next().await {
        match &result {
            Ok(bytes) => debug!(index, bytes, "window saved"),
            Err(error) => warn!(index, %error, "window failed"),
        }
        results.insert(index, result);
    }

    reduce(results, total)
}

async fn fetch_and_save<A, S>(
    api: &A,
    sink: &S,
    request: &DownloadRequest,
    filename: &str,
) -> Result<u64, ClientError>
where
    A: LogsApi + ?Sized,
    S: FileSink + ?Sized,
{
    let blob = api.export_logs(request).await?;
    let len = blob.len() as u64;
    sink.save(blob, filename)
        .await
        .map_err(|source| ClientError::Save {
            filename: filename.to_owned(),
            source,
        })?;
    Ok(len)
}

fn reduce(
    results: BTreeMap<usize, Result<u64, ClientError>>,
    total: usize,
) -> Result<BatchReport, BatchError> {
    let mut bytes = 0u64;
    let mut failed = 0usize;
    let mut first_error = None;

    for result in results.into_values() {
        match result {
            Ok(len) => bytes += len,
            Err(error) => {
                failed += 1;
                first_error.get_or_insert(error);
            }
        }
    }

    match first_error {
        None => Ok(BatchReport {
            windows: total,
            bytes,
        }),
        Some(source) => Err(BatchError {
            failed,
            total,
            source,
        }),
    }
}
