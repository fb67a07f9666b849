//! File descriptors handed to the store by upload handlers.
//!
//! The store only needs a declared type, a name, a size, and a way to read the
//! full content as an embedded payload (a `data:` URL).

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::trace;

#[async_trait(?Send)]
pub trait FileDescriptor {
    /// MIME-like type, e.g. `image/jpeg`.
    fn declared_type(&self) -> &str;

    fn name(&self) -> &str;

    fn size(&self) -> u64;

    async fn read_as_embedded_payload(&self) -> io::Result<String>;
}

/// Encodes bytes as `data:<type>;base64,<payload>`.
pub fn to_data_url(declared_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", declared_type, STANDARD.encode(bytes))
}

/// Guesses a MIME type from the file extension.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// A file on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    declared_type: String,
    size: u64,
}

impl LocalFile {
    /// Stats the file and detects its declared type from the extension.
    pub async fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let meta = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Ok(Self {
            declared_type: mime_from_path(&path).to_string(),
            name,
            size: meta.len(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait(?Send)]
impl FileDescriptor for LocalFile {
    fn declared_type(&self) -> &str {
        &self.declared_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read_as_embedded_payload(&self) -> io::Result<String> {
        let bytes = tokio::fs::read(&self.path).await?;
        trace!(path = ?self.path, bytes = bytes.len(), "Read upload");
        Ok(to_data_url(&self.declared_type, &bytes))
    }
}

/// Descriptor backed by bytes held in memory; `None` simulates a read failure.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct MemoryFile {
    pub name: String,
    pub declared_type: String,
    pub bytes: Option<Vec<u8>>,
}

#[cfg(test)]
impl MemoryFile {
    pub fn new(name: &str, declared_type: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            bytes: Some(bytes.to_vec()),
        }
    }

    pub fn unreadable(name: &str, declared_type: &str) -> Self {
        Self {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            bytes: None,
        }
    }
}

#[cfg(test)]
#[async_trait(?Send)]
impl FileDescriptor for MemoryFile {
    fn declared_type(&self) -> &str {
        &self.declared_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.as_ref().map_or(0, |b| b.len() as u64)
    }

    async fn read_as_embedded_payload(&self) -> io::Result<String> {
        match &self.bytes {
            Some(bytes) => Ok(to_data_url(&self.declared_type, bytes)),
            None => Err(io::Error::new(io::ErrorKind::Other, "simulated read failure")),
        }
    }
}
