use std::future::Future;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use factory_core::{PhaseLabel, TaskView};
use factory_engine::{ArtifactDownloader, ClientSettings, Orchestrator, UploadSelection};
use factory_logging::{factory_info, factory_warn};

use crate::render::{preview_table, status_line, LogPrinter};

/// Exit code after Ctrl-C, as shells report SIGINT.
const INTERRUPTED: u8 = 130;

/// Uploads `file`, follows the task and saves its artifacts into `out`.
///
/// `interrupt` resolving cancels polling and ends the run.
pub(crate) async fn generate<F>(
    settings: &ClientSettings,
    file: &Path,
    out: &Path,
    interrupt: F,
) -> Result<ExitCode>
where
    F: Future<Output = ()>,
{
    let upload = UploadSelection::from_path(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))?;
    let orchestrator = Orchestrator::connect(settings).context("failed to build http client")?;
    let mut views = orchestrator.subscribe();

    println!("Uploading {} to {}", upload.file_name, orchestrator.base_url());
    let task_id = match orchestrator.submit(upload).await {
        Ok(task_id) => task_id,
        Err(err) => {
            eprintln!("Upload failed: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    println!("Task {task_id} accepted");

    let mut printer = LogPrinter::default();
    let mut view = views.borrow_and_update().clone();
    tokio::pin!(interrupt);
    loop {
        for line in printer.fresh(&view.logs) {
            println!("  {line}");
        }
        if view.phase.is_terminal() || view.phase == PhaseLabel::Idle {
            break;
        }
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                view = views.borrow_and_update().clone();
            }
            _ = &mut interrupt => {
                factory_warn!("Interrupted; cancelling task_id={}", task_id);
                orchestrator.shutdown();
                eprintln!("Cancelled");
                return Ok(ExitCode::from(INTERRUPTED));
            }
        }
    }

    println!("{}", status_line(&view));
    match view.phase {
        PhaseLabel::Succeeded => {
            save_artifacts(settings, &orchestrator, &view, out).await?;
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            if let Some(error) = &view.error {
                eprintln!("{error}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn save_artifacts(
    settings: &ClientSettings,
    orchestrator: &Orchestrator,
    view: &TaskView,
    out: &Path,
) -> Result<()> {
    let table = preview_table(&view.preview);
    if !table.is_empty() {
        println!();
        for row in table {
            println!("{row}");
        }
        println!();
    }

    let downloader = ArtifactDownloader::new(settings).context("failed to build http client")?;
    for &kind in &view.artifacts {
        let Some(link) = orchestrator.download_link(kind) else {
            continue;
        };
        let saved = downloader
            .save_artifact(&link, kind, out)
            .await
            .with_context(|| format!("failed to download {kind}"))?;
        println!("Saved {} ({} bytes)", saved.path.display(), saved.bytes);
    }
    factory_info!("Saved {} artifacts to {:?}", view.artifacts.len(), out);
    Ok(())
}

/// Downloads the blank spreadsheet template into `out`.
pub(crate) async fn template(settings: &ClientSettings, out: &Path) -> Result<ExitCode> {
    let downloader = ArtifactDownloader::new(settings).context("failed to build http client")?;
    let saved = downloader
        .save_template(out)
        .await
        .context("failed to download template")?;
    println!("Saved {} ({} bytes)", saved.path.display(), saved.bytes);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::{generate, template};
    use factory_engine::ClientSettings;
    use serde_json::json;
    use std::future::pending;
    use std::process::ExitCode;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> ClientSettings {
        let mut settings = ClientSettings::with_base_url(&server.uri()).unwrap();
        settings.poll_interval = Duration::from_millis(20);
        settings
    }

    fn spreadsheet(dir: &TempDir) -> std::path::PathBuf {
        let file = dir.path().join("api_spec.xlsx");
        std::fs::write(&file, b"PK\x03\x04").unwrap();
        file
    }

    async fn mount_upload(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "t1"})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn generate_downloads_both_artifacts() {
        let server = MockServer::start().await;
        mount_upload(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/status/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "completed",
                "logs": ["Done"],
                "artifacts_ready": ["postman", "pytest"],
                "api_preview": [
                    {"ref_id": "1", "method": "GET", "name": "GetUser", "url": "/v1/users/{id}"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/download/t1/postman"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/download/t1/pytest"))
            .respond_with(ResponseTemplate::new(200).set_body_string("zip"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let code = generate(&settings_for(&server), &spreadsheet(&dir), &out, pending())
            .await
            .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(out.join("postman_collection.json").is_file());
        assert!(out.join("pytest_suite.zip").is_file());
    }

    #[tokio::test]
    async fn processing_failure_exits_non_zero() {
        let server = MockServer::start().await;
        mount_upload(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/status/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "failed",
                "logs": ["Traceback ..."],
                "artifacts_ready": [],
                "api_preview": []
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let code = generate(&settings_for(&server), &spreadsheet(&dir), &out, pending())
            .await
            .unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn rejected_upload_exits_non_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid sheet name"})),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let code = generate(
            &settings_for(&server),
            &spreadsheet(&dir),
            dir.path(),
            pending(),
        )
        .await
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn interrupt_cancels_polling() {
        let server = MockServer::start().await;
        mount_upload(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/status/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "processing",
                "logs": [],
                "artifacts_ready": [],
                "api_preview": []
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let interrupt = tokio::time::sleep(Duration::from_millis(100));
        let code = generate(&settings_for(&server), &spreadsheet(&dir), dir.path(), interrupt)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::from(130));
    }

    #[tokio::test]
    async fn template_is_saved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/template"))
            .respond_with(ResponseTemplate::new(200).set_body_string("xlsx"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let code = template(&settings_for(&server), dir.path()).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(dir.path().join("api_template.xlsx").is_file());
    }

    #[tokio::test]
    async fn missing_spreadsheet_is_an_error() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let err = generate(
            &settings_for(&server),
            &dir.path().join("absent.xlsx"),
            dir.path(),
            pending(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("absent.xlsx"), "{err}");
    }
}
