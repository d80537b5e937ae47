use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::io::AsyncReadExt;

/// Outcome of checking one selfie before submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadVerdict {
    #[strum(serialize = "Looks good")]
    Accepted,
    #[strum(serialize = "Too large (>8MB)")]
    TooLarge,
    #[strum(serialize = "Unsupported format")]
    UnsupportedFormat,
}

impl UploadVerdict {
    pub fn is_accepted(self) -> bool {
        self == UploadVerdict::Accepted
    }
}

/// A file the user picked, described only by what the validator needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadCandidate {
    pub name: String,
    pub size_bytes: u64,
    pub media_type: String,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, size_bytes: u64, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            media_type: media_type.into(),
        }
    }

    /// Describe a file on disk. The media type comes from the file's magic
    /// bytes, falling back to the extension for HEIC/HEIF.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;

        let mut head = Vec::with_capacity(64);
        tokio::fs::File::open(path)
            .await?
            .take(64)
            .read_to_end(&mut head)
            .await?;

        let media_type = match image::guess_format(&head) {
            Ok(format) => format.to_mime_type().to_string(),
            Err(_) => media_type_from_extension(path).to_string(),
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            media_type,
        })
    }
}

fn media_type_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
