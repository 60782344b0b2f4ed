//! API factory engine: HTTP transport, status polling and the orchestrating
//! composition root that drives the core task machine.
mod download;
mod orchestrator;
mod scheduler;
mod settings;
mod transport;
mod upload;
mod wire;

pub use download::{ArtifactDownloader, DownloadError, SavedFile, TEMPLATE_FILE_NAME};
pub use orchestrator::Orchestrator;
pub use scheduler::{PollHandle, PollVerdict, PollingScheduler, SnapshotSink};
pub use settings::{ClientSettings, SettingsError, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};
pub use transport::{ReqwestTransport, Transport};
pub use upload::{UploadSelection, XLSX_MIME};
pub use wire::{decode_snapshot, decode_submit_response};
