use std::io;
use std::path::{Path, PathBuf};

use factory_core::{api_url, ArtifactKind};
use factory_logging::factory_info;
use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::task;
use url::Url;

use crate::transport::{describe, status_text};
use crate::ClientSettings;

pub const TEMPLATE_FILE_NAME: &str = "api_template.xlsx";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download failed with http status {0}")]
    Http(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("base url cannot carry a path")]
    InvalidUrl,
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Streams artifact and template downloads to disk.
///
/// Each body goes to a temp file in the target directory first and is renamed
/// into place only after the stream completed.
#[derive(Debug, Clone)]
pub struct ArtifactDownloader {
    client: reqwest::Client,
    base_url: Url,
}

impl ArtifactDownloader {
    pub fn new(settings: &ClientSettings) -> Result<Self, reqwest::Error> {
        // No overall timeout: archives can be large; the connect timeout still applies.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }

    /// Saves the artifact behind `link` (see `Orchestrator::download_link`) into `dir`.
    pub async fn save_artifact(
        &self,
        link: &Url,
        kind: ArtifactKind,
        dir: &Path,
    ) -> Result<SavedFile, DownloadError> {
        self.save(link.clone(), kind.default_file_name(), dir).await
    }

    /// Saves the blank spreadsheet template into `dir`.
    pub async fn save_template(&self, dir: &Path) -> Result<SavedFile, DownloadError> {
        let url = api_url(&self.base_url, &["api", "template"]).ok_or(DownloadError::InvalidUrl)?;
        self.save(url, TEMPLATE_FILE_NAME, dir).await
    }

    async fn save(
        &self,
        url: Url,
        fallback_name: &str,
        dir: &Path,
    ) -> Result<SavedFile, DownloadError> {
        ensure_output_dir(dir).await?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| DownloadError::Network(describe(&err)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Http(status_text(status)));
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_file_name)
            .unwrap_or_else(|| fallback_name.to_string());

        // The temp file is removed on drop, so an aborted stream leaves nothing behind.
        let tmp_dir = dir.to_path_buf();
        let tmp = task::spawn_blocking(move || NamedTempFile::new_in(tmp_dir))
            .await
            .map_err(io::Error::other)??;
        let mut file = File::from_std(tmp.reopen()?);
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| DownloadError::Network(describe(&err)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        // `persist` renames over an existing file, so the old copy survives any failure.
        let target = dir.join(&file_name);
        let persist_target = target.clone();
        task::spawn_blocking(move || tmp.persist(persist_target))
            .await
            .map_err(io::Error::other)?
            .map_err(|err| DownloadError::Io(err.error))?;

        factory_info!("Saved {} bytes from {} to {:?}", written, url, target);
        Ok(SavedFile {
            path: target,
            bytes: written,
        })
    }
}

/// Creates `dir` if missing; refuses a path that exists but is not a directory.
async fn ensure_output_dir(dir: &Path) -> Result<(), DownloadError> {
    match fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(DownloadError::OutputDir(format!(
            "{} is not a directory",
            dir.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir_all(dir)
            .await
            .map_err(|e| DownloadError::OutputDir(e.to_string())),
        Err(err) => Err(DownloadError::OutputDir(err.to_string())),
    }
}

/// File name from a `Content-Disposition` value, reduced to its last path component.
fn attachment_file_name(header: &str) -> Option<String> {
    let raw = header
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))?;
    let unquoted = raw.trim().trim_matches('"');
    let name = unquoted
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(unquoted)
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}
