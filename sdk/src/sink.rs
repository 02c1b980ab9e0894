use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Where downloaded archives end up.
#[async_trait]
pub trait FileSink: Send + Sync {
    async fn save(&self, blob: Bytes, filename: &str) -> std::io::Result<()>;
}

/// Saves into a directory the way a browser download would: an existing file
/// is never overwritten, the new one gets a ` (n)` suffix instead.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    saved: Mutex<Vec<PathBuf>>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, sorted.
    pub fn saved_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.saved.lock().clone();
        paths.sort();
        paths
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn save(&self, blob: Bytes, filename: &str) -> std::io::Result<()> {
        let filename = sanitize_filename(filename)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // `create_new` also fails on a path a concurrent save just claimed.
        let mut attempt = 0usize;
        let (path, mut file) = loop {
            let path = self.dir.join(numbered_name(filename, attempt));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        };

        file.write_all(&blob).await?;
        file.flush().await?;
        debug!(path = %path.display(), bytes = blob.len(), "saved");
        self.saved.lock().push(path);
        Ok(())
    }
}

fn sanitize_filename(filename: &str) -> std::io::Result<&str> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.trim().is_empty());
    name.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid file name '{filename}'"),
        )
    })
}

/// `logs.tar`, `logs (1).tar`, `logs (2).tar`, ...
fn numbered_name(filename: &str, n: usize) -> String {
    if n == 0 {
        return filename.to_owned();
    }
    match filename.split_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{filename} ({n})"),
    }
}
