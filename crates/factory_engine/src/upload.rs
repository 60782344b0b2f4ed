use std::io;
use std::path::Path;

use bytes::Bytes;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The spreadsheet chosen by the user. Content is not inspected here; the
/// backend decides whether it is a usable workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSelection {
    pub file_name: String,
    pub content: Bytes,
}

impl UploadSelection {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Reads `path` into memory. Only presence is checked.
    pub async fn from_path(path: &Path) -> io::Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} does not name a file", path.display()),
                )
            })?;
        let content = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, content))
    }
}
