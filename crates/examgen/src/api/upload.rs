//! Upload transport: batch validation and both submission strategies.

use log::{debug, info};
use reqwest::multipart::{Form, Part};

use crate::api::client::ApiClient;
use crate::api::types::GenerateResponse;
use crate::config::{ClientConfig, UploadStrategy};
use crate::error::{ApiError, Result};
use crate::model::{display_name_for_batch, ExamConfig};

/// Multipart field name the backend expects for lecture material.
const FILE_FIELD: &str = "lecture_pdf";

/// One file in an upload batch, fully buffered. Exam source PDFs are small
/// relative to the aggregate cap, so streaming is not worth the plumbing.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: &str, media_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            media_type: media_type.to_string(),
            bytes,
        }
    }

    /// PDF by declared media type, or by extension when the type is absent
    /// or generic.
    fn is_pdf(&self) -> bool {
        if self.media_type.eq_ignore_ascii_case("application/pdf") {
            return true;
        }
        mime_guess::from_path(&self.file_name)
            .first()
            .map(|m| m == mime_guess::mime::APPLICATION_PDF)
            .unwrap_or(false)
    }
}

/// Rejects a bad batch before any network call is made.
pub fn validate_batch(files: &[UploadFile], max_bytes: u64) -> Result<()> {
    if files.is_empty() {
        return Err(ApiError::InvalidFileType("(empty batch)".to_string()));
    }
    for file in files {
        if !file.is_pdf() {
            return Err(ApiError::InvalidFileType(file.file_name.clone()));
        }
    }
    let total: u64 = files.iter().map(|f| f.bytes.len() as u64).sum();
    if total > max_bytes {
        return Err(ApiError::FileTooLarge {
            size: Some(total),
            limit: Some(max_bytes),
        });
    }
    Ok(())
}

/// Derives the local job display name for a batch.
pub fn batch_display_name(files: &[UploadFile]) -> String {
    let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
    display_name_for_batch(&names)
}

pub struct UploadTransport<'a> {
    client: &'a ApiClient,
    config: &'a ClientConfig,
}

impl<'a> UploadTransport<'a> {
    pub fn new(client: &'a ApiClient, config: &'a ClientConfig) -> Self {
        Self { client, config }
    }

    /// Submits a validated batch and returns the backend-assigned job id.
    /// Nothing is recorded locally until that id exists.
    pub async fn submit(&self, files: &[UploadFile], exam: &ExamConfig) -> Result<String> {
        validate_batch(files, self.config.max_upload_bytes)?;

        let job_id = match self.config.upload_strategy {
            UploadStrategy::Multipart => self.submit_multipart(files, exam).await?,
            UploadStrategy::PerFileSession => self.submit_per_file(files, exam).await?,
        };
        info!("Generation accepted, remote job id {}", job_id);
        Ok(job_id)
    }

    /// Strategy (a): one multipart request carrying every file plus the
    /// configuration fields.
    async fn submit_multipart(&self, files: &[UploadFile], exam: &ExamConfig) -> Result<String> {
        let mut form = Form::new().text(
            "config",
            serde_json::to_string(exam).unwrap_or_else(|_| "{}".to_string()),
        );
        for file in files {
            form = form.part(
                FILE_FIELD,
                Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.media_type)
                    .map_err(|_| ApiError::InvalidFileType(file.file_name.clone()))?,
            );
        }

        debug!("Submitting {} file(s) as one multipart request", files.len());
        let builder = self
            .client
            .post("/generate")
            .multipart(form)
            .timeout(self.config.upload_timeout());

        let response: GenerateResponse = self
            .bounded(self.client.send_json(builder, "generate"), "generate")
            .await?;
        extract_job_id(response)
    }

    /// Strategy (b): sequential per-file uploads tied to a session id, then
    /// a configuration-bearing start call.
    async fn submit_per_file(&self, files: &[UploadFile], exam: &ExamConfig) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();

        for file in files {
            debug!("Uploading '{}' (session {})", file.file_name, session_id);
            let form = Form::new().text("session_id", session_id.clone()).part(
                "file",
                Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.media_type)
                    .map_err(|_| ApiError::InvalidFileType(file.file_name.clone()))?,
            );
            let builder = self
                .client
                .post("/upload")
                .multipart(form)
                .timeout(self.config.upload_timeout());

            // Whichever deadline fires first, the error names the file that
            // stalled: the request-level timeout surfaces through the
            // transport context, the outer bound through `bounded`.
            self.bounded(
                self.client.send_unit(builder, &file.file_name),
                &file.file_name,
            )
            .await?;
        }

        let builder = self
            .client
            .post("/generate")
            .json(&serde_json::json!({ "session_id": session_id, "config": exam }));
        let response: GenerateResponse = self
            .bounded(self.client.send_json(builder, "generate"), "generate")
            .await?;
        extract_job_id(response)
    }

    /// Wraps a call in the configured hard deadline. The per-request reqwest
    /// timeout usually fires first; this guards the whole operation
    /// including connection setup retries.
    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
        context: &str,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.upload_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(context.to_string())),
        }
    }
}

fn extract_job_id(response: GenerateResponse) -> Result<String> {
    match response.job_id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ApiError::RequestRejected {
            status: 200,
            body: "No job_id returned from server".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, size: usize) -> UploadFile {
        UploadFile::new(name, "application/pdf", vec![0u8; size])
    }

    #[test]
    fn test_validate_accepts_pdfs() {
        let files = vec![pdf("a.pdf", 1024), pdf("b.pdf", 2048)];
        assert!(validate_batch(&files, 10 * 1024).is_ok());
    }

    #[test]
    fn test_validate_accepts_extension_without_media_type() {
        let files = vec![UploadFile::new("notes.PDF", "application/octet-stream", vec![0u8; 16])];
        assert!(validate_batch(&files, 1024).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_pdf() {
        let files = vec![UploadFile::new("notes.docx", "application/msword", vec![0u8; 16])];
        let err = validate_batch(&files, 1024).unwrap_err();
        assert!(matches!(err, ApiError::InvalidFileType(name) if name == "notes.docx"));
    }

    #[test]
    fn test_validate_rejects_empty_batch() {
        assert!(matches!(
            validate_batch(&[], 1024),
            Err(ApiError::InvalidFileType(_))
        ));
    }

    #[test]
    fn test_oversized_batch_rejected_before_network() {
        // Three files totaling 150MB against a 100MB aggregate cap.
        let mb = 1024 * 1024;
        let files = vec![pdf("a.pdf", 50 * mb), pdf("b.pdf", 50 * mb), pdf("c.pdf", 50 * mb)];
        let err = validate_batch(&files, 100 * mb as u64).unwrap_err();
        match err {
            ApiError::FileTooLarge { size, limit } => {
                assert_eq!(size, Some(150 * mb as u64));
                assert_eq!(limit, Some(100 * mb as u64));
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_upload_times_out_with_file_name() {
        use crate::session::SessionStore;
        use crate::storage::MemoryStore;
        use std::sync::Arc;

        let config = ClientConfig {
            upload_timeout_secs: 1,
            ..ClientConfig::default()
        };
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStore::new())));
        let client = ApiClient::new(&config, session).unwrap();
        let transport = UploadTransport::new(&client, &config);

        let stalled = std::future::pending::<Result<()>>();
        let err = transport.bounded(stalled, "week1.pdf").await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(name) if name == "week1.pdf"));
    }

    #[test]
    fn test_batch_display_name() {
        let files = vec![pdf("week1.pdf", 1), pdf("week2.pdf", 1)];
        assert_eq!(batch_display_name(&files), "week1.pdf (+1 more)");
    }

    #[test]
    fn test_extract_job_id() {
        assert_eq!(
            extract_job_id(GenerateResponse { job_id: Some("job-1".into()) }).unwrap(),
            "job-1"
        );
        assert!(extract_job_id(GenerateResponse { job_id: None }).is_err());
        assert!(extract_job_id(GenerateResponse { job_id: Some(String::new()) }).is_err());
    }
}
