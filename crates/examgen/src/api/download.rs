//! Authenticated artifact download with filename resolution.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::api::client::ApiClient;
use crate::config::AnswerDownloadRoute;
use crate::error::{ApiError, Result};
use crate::model::{answer_key_file_name, artifact_file_name, ExamJob};

/// Reports whether the client runs inside a restricted embedded browser
/// (in-app webviews that silently drop file downloads).
pub trait EnvironmentProbe: Send + Sync {
    /// The matched signature when an embedded browser is detected.
    fn embedded_browser(&self) -> Option<String>;
}

/// Probe for environments with no embedding concern (tests, native hosts).
pub struct OpenEnvironment;

impl EnvironmentProbe for OpenEnvironment {
    fn embedded_browser(&self) -> Option<String> {
        None
    }
}

fn rfc5987_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)filename\*=(?:UTF-8'')?([^;]+)"#).expect("valid regex"))
}

fn simple_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)filename=([^;]+)"#).expect("valid regex"))
}

/// Extracts a filename from a `Content-Disposition` header value: RFC 5987
/// extended form first, simple quoted form second.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    if let Some(captures) = rfc5987_re().captures(header) {
        let raw = captures[1].trim().trim_matches('"');
        return Some(percent_decode(raw));
    }
    if let Some(captures) = simple_filename_re().captures(header) {
        return Some(captures[1].trim().trim_matches('"').to_string());
    }
    None
}

/// Decodes `%xx` escapes, passing malformed sequences through untouched.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 3 <= bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
            if let Ok(value) = u8::from_str_radix(hex, 16) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}

/// A downloaded artifact saved to disk.
#[derive(Debug)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes_written: u64,
}

/// Fetches `path` with authentication and saves the body under the filename
/// suggested by the response (falling back to `fallback_name`).
///
/// A cache-busting `t=` parameter defeats intermediaries caching a URL that
/// may serve different content across calls (regenerated artifacts reuse the
/// same job id). When `probe` detects an embedded browser the operation
/// short-circuits before any network I/O.
pub async fn download_artifact(
    client: &ApiClient,
    probe: &dyn EnvironmentProbe,
    path: &str,
    fallback_name: &str,
    dest_dir: &Path,
) -> Result<SavedArtifact> {
    if let Some(signature) = probe.embedded_browser() {
        return Err(ApiError::EmbeddedBrowser(signature));
    }

    let url = ApiClient::append_cache_buster(&client.resolve_url(path));
    debug!("Downloading artifact from {url}");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, "download"))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::DownloadFailed {
            status: status.as_u16(),
            body,
        });
    }

    let file_name = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_content_disposition)
        .unwrap_or_else(|| fallback_name.to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::from_transport(e, "download"))?;

    let saved = save_bytes(&bytes, dest_dir, &file_name)?;
    Ok(saved)
}

/// Fetches the primary exam PDF for a finished job.
pub async fn download_exam(
    client: &ApiClient,
    probe: &dyn EnvironmentProbe,
    job: &ExamJob,
    dest_dir: &Path,
) -> Result<SavedArtifact> {
    let path = match &job.artifact_url {
        Some(url) => url.clone(),
        None => format!("/download/{}", job.remote_id),
    };
    let fallback = artifact_file_name(&job.display_name);
    download_artifact(client, probe, &path, &fallback, dest_dir).await
}

/// Fetches the answer-key PDF via whichever route revision the backend
/// serves.
pub async fn download_answer_key(
    client: &ApiClient,
    probe: &dyn EnvironmentProbe,
    route: AnswerDownloadRoute,
    job: &ExamJob,
    dest_dir: &Path,
) -> Result<SavedArtifact> {
    let fallback = answer_key_file_name(&job.display_name);
    download_artifact(client, probe, &route.path(&job.remote_id), &fallback, dest_dir).await
}

/// Temp-file-then-rename write; the temp file is removed on any failure.
fn save_bytes(bytes: &[u8], dest_dir: &Path, file_name: &str) -> Result<SavedArtifact> {
    std::fs::create_dir_all(dest_dir).map_err(|e| ApiError::Storage(
        crate::error::StorageError::WriteFile {
            path: dest_dir.to_path_buf(),
            source: e,
        },
    ))?;

    let final_path = dest_dir.join(file_name);
    let tmp_path = dest_dir.join(format!(".{file_name}.part"));

    if let Err(e) = std::fs::write(&tmp_path, bytes) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ApiError::Storage(crate::error::StorageError::WriteFile {
            path: tmp_path,
            source: e,
        }));
    }
    if let Err(e) = std::fs::rename(&tmp_path, &final_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ApiError::Storage(crate::error::StorageError::WriteFile {
            path: final_path,
            source: e,
        }));
    }

    Ok(SavedArtifact {
        path: final_path,
        file_name: file_name.to_string(),
        bytes_written: bytes.len() as u64,
    })
}
