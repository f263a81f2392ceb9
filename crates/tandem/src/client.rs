//! Network client for the external diff oracle
//!
//! Two calls per load: each raw text is registered with the service first
//! and comes back as an opaque key, then the diff request carries both keys
//! and both raw contents plus the full settings catalog. The key is echoed,
//! never interpreted. Identical inputs never reach the network at all.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tandem_core::{ingest, DiffSettings, EditOp, OpMap, PatchSet};
use thiserror::Error;
use tracing::info;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("diff service returned status {0}")]
    Status(reqwest::StatusCode),
}

/// HTTP client bound to one diff service.
pub struct DiffClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    filename: String,
}

#[derive(Deserialize)]
struct DiffResponse {
    datas: Vec<EditOp>,
}

impl DiffClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Register one raw text with the service and return its key.
    pub async fn upload(&self, name: &str, content: &str) -> Result<String, ClientError> {
        let part = Part::text(content.to_string())
            .file_name(name.to_string())
            .mime_str("text/plain")?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        Ok(response.json::<UploadResponse>().await?.filename)
    }

    /// Ask the oracle for the ordered operation list.
    pub async fn request_ops(
        &self,
        src_key: &str,
        dest_key: &str,
        src_content: &str,
        dest_content: &str,
        settings: &DiffSettings,
    ) -> Result<Vec<EditOp>, ClientError> {
        let mut form = Form::new()
            .text("src", src_key.to_string())
            .text("dest", dest_key.to_string())
            .text("src_lines_list", src_content.to_string())
            .text("dest_lines_list", dest_content.to_string());
        for (key, value) in settings.form_fields() {
            form = form.text(key, value);
        }

        let response = self
            .http
            .post(&self.base_url)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        Ok(response.json::<DiffResponse>().await?.datas)
    }
}

/// Full load: short-circuit identical inputs, upload both sides, fetch the
/// operations, apply queued debug patches, and assign ids.
///
/// Any failure surfaces before ids are assigned, so the caller's previous
/// derived state stays valid.
pub async fn diff_get(
    client: &DiffClient,
    src_name: &str,
    src_content: &str,
    dest_name: &str,
    dest_content: &str,
    settings: &DiffSettings,
    patches: &mut PatchSet,
) -> Result<OpMap, ClientError> {
    if src_content == dest_content {
        info!("contents are identical; skipping the diff request");
        return Ok(OpMap::new());
    }

    let src_key = client.upload(src_name, src_content).await?;
    let dest_key = client.upload(dest_name, dest_content).await?;

    let mut ops = client
        .request_ops(&src_key, &dest_key, src_content, dest_content, settings)
        .await?;
    patches.apply(&mut ops);

    Ok(ingest(ops))
}
