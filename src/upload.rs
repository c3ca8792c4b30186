//! Simulated uploads: turning picked or dropped paths into file descriptors,
//! and completing a batch after an artificial network delay.

use std::path::{Path, PathBuf};
use std::time::Duration;

use percent_encoding::percent_decode_str;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::event::Event;
use crate::tree::DEFAULT_MIME_TYPE;

/// Delay a simulated upload takes before it completes.
pub const DEFAULT_UPLOAD_DELAY_MS: u64 = 2000;

/// What the upload surface knows about one external file. No bytes are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            name: name.into(),
            size,
            mime_type: if mime_type.trim().is_empty() {
                DEFAULT_MIME_TYPE.to_string()
            } else {
                mime_type
            },
        }
    }

    /// Describe a local file from its metadata.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let mime_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
        Ok(Self::new(name, metadata.len(), mime_type))
    }
}

/// A batch of descriptors bound for one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    pub target_id: String,
    pub descriptors: Vec<FileDescriptor>,
}

/// Split typed or pasted text into paths.
///
/// Terminals deliver dropped files as pasted text: one or more paths,
/// separated by whitespace or newlines, possibly quoted, backslash-escaped or
/// given as `file://` URIs.
pub fn parse_path_list(input: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut has_token = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                has_token = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    has_token = true;
                }
            }
            (None, c) if c.is_whitespace() => {
                if has_token {
                    paths.push(to_path(&current));
                    current.clear();
                    has_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        paths.push(to_path(&current));
    }
    paths.retain(|p| !p.as_os_str().is_empty());
    paths
}

fn to_path(token: &str) -> PathBuf {
    match token.strip_prefix("file://") {
        Some(rest) => PathBuf::from(percent_decode_str(rest).decode_utf8_lossy().into_owned()),
        None => PathBuf::from(token),
    }
}

/// Resolve every path to a descriptor. Returns the descriptors that could be
/// built and one message per path that could not.
pub fn describe_paths(paths: &[PathBuf]) -> (Vec<FileDescriptor>, Vec<String>) {
    let mut descriptors = Vec::new();
    let mut errors = Vec::new();
    for path in paths {
        match FileDescriptor::from_path(path) {
            Ok(d) => descriptors.push(d),
            Err(e) => errors.push(format!("{}: {}", path.display(), e)),
        }
    }
    (descriptors, errors)
}

/// Human-readable size with up to two decimals and no trailing zeros,
/// e.g. `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Schedules the deferred completion of upload batches.
///
/// The delay stands in for a network round trip. Completion is delivered as
/// an [`Event::UploadComplete`] so it is applied to whatever forest is
/// current when it arrives. There is no cancellation.
#[derive(Debug, Clone)]
pub struct UploadOrchestrator {
    delay: Duration,
}

impl UploadOrchestrator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Spawn the delayed completion of `batch`.
    pub fn spawn(&self, batch: UploadBatch, tx: mpsc::UnboundedSender<Event>) -> JoinHandle<()> {
        let delay = self.delay;
        tracing::info!(
            target_id = %batch.target_id,
            files = batch.descriptors.len(),
            delay_ms = delay.as_millis() as u64,
            "upload started"
        );
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(Event::UploadComplete(batch)).is_err() {
                tracing::debug!("event loop gone before upload completed");
            }
        })
    }
}

impl Default for UploadOrchestrator {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_UPLOAD_DELAY_MS))
    }
}
