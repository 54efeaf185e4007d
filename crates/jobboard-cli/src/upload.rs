//! Reading local files for multipart uploads.

use std::path::Path;

use anyhow::Context;
use jobboard_core::models::FileUpload;

/// Content type sent for a file, chosen by extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Read `path` into an upload named after the file. `what` names the
/// file in error messages.
pub fn read_upload(path: &Path, what: &str) -> anyhow::Result<FileUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {what} {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(what)
        .to_string();
    Ok(FileUpload {
        filename,
        content_type: content_type(path).to_string(),
        bytes,
    })
}
