//! # Uploads
//!
//! Media files are read off the caller's thread: [`spawn_reads`] starts one
//! worker per file and hands back a channel that yields one
//! [`UploadOutcome`] per file, in completion order. A failing (or panicking)
//! worker only affects its own file.
//!
//! Each worker:
//! 1. checks the size cap before reading
//! 2. sniffs the MIME type from the bytes (`infer`), falling back to the
//!    file extension
//! 3. accepts only `image/*`, `video/*` and `audio/*`
//! 4. encodes the bytes as a base64 `data:` URL

use crate::error::{EditorError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::debug;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime: String,
    pub data_url: String,
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub name: String,
    pub result: Result<UploadedFile>,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "wma" => "audio/x-ms-wma",
        _ => return None,
    };
    Some(mime)
}

fn is_media_mime(mime: &str) -> bool {
    ["image/", "video/", "audio/"]
        .iter()
        .any(|prefix| mime.starts_with(prefix))
}

/// Reads one file into an [`UploadedFile`].
pub fn read_upload(path: &Path, max_bytes: u64) -> Result<UploadedFile> {
    let name = display_name(path);

    let size = fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(EditorError::FileTooLarge {
            name,
            limit_mb: max_bytes.div_ceil(MIB),
        });
    }

    let bytes = fs::read(path)?;
    let mime = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .or_else(|| mime_from_extension(path))
        .unwrap_or("application/octet-stream");

    if !is_media_mime(mime) {
        return Err(EditorError::UnsupportedFileType {
            name,
            mime: mime.to_string(),
        });
    }

    debug!(file = %name, mime, bytes = bytes.len(), "read upload");
    Ok(UploadedFile {
        data_url: format!("data:{};base64,{}", mime, BASE64.encode(&bytes)),
        mime: mime.to_string(),
        name,
    })
}

/// Starts one reader thread per path. The receiver closes once every worker
/// has reported.
pub fn spawn_reads(paths: Vec<PathBuf>, max_bytes: u64) -> Receiver<UploadOutcome> {
    spawn_reads_with(paths, move |path| read_upload(path, max_bytes))
}

/// [`spawn_reads`] with the per-file reader supplied by the caller. A reader
/// that panics yields an error outcome for its own file only.
pub fn spawn_reads_with<F>(paths: Vec<PathBuf>, reader: F) -> Receiver<UploadOutcome>
where
    F: Fn(&Path) -> Result<UploadedFile> + Send + Sync + 'static,
{
    let reader = Arc::new(reader);
    let (tx, rx) = channel();
    for path in paths {
        let tx = tx.clone();
        let reader = Arc::clone(&reader);
        thread::spawn(move || {
            let name = display_name(&path);
            let result = catch_unwind(AssertUnwindSafe(|| reader(&path))).unwrap_or_else(|_| {
                Err(EditorError::Io(std::io::Error::other(format!(
                    "reading {} failed unexpectedly",
                    name
                ))))
            });
            // The editor may have stopped listening; nothing to do then.
            let _ = tx.send(UploadOutcome { name, result });
        });
    }
    rx
}
