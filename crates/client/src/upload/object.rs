//! Batch uploads to pre-signed URLs.
//!
//! Each file is checked against [`UploadRestrictions`] first. Files that
//! pass are PUT one at a time to a URL the server signs for them. A failed
//! file is logged and recorded on the dashboard; the batch carries on.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use bep_core::{UploadRejection, UploadRestrictions};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Method};
use serde::{Deserialize, Serialize};

use super::FileUpload;
use crate::error::ApiError;
use crate::http::{ApiClient, OnUnauthorized};

const CHUNK_SIZE: usize = 64 * 1024;

/// The only method a pre-signed upload uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PutMethod {
    #[default]
    #[serde(rename = "PUT")]
    Put,
}

/// Where and how to send one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParameters {
    pub method: PutMethod,
    pub url: String,
    /// Where the object is served once stored, when the signer knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

/// Produces upload parameters for a file.
pub trait UploadParameterSource: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if no URL could be obtained for `file`.
    fn upload_parameters(
        &self,
        file: &FileUpload,
    ) -> impl Future<Output = Result<UploadParameters, ApiError>> + Send;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
    file_name: &'a str,
    content_type: &'a str,
    size: u64,
}

/// Asks the site server to sign an object upload.
#[derive(Debug, Clone)]
pub struct ServerUploadParameters {
    client: ApiClient,
}

impl ServerUploadParameters {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl UploadParameterSource for ServerUploadParameters {
    async fn upload_parameters(&self, file: &FileUpload) -> Result<UploadParameters, ApiError> {
        let request = SignRequest {
            file_name: &file.name,
            content_type: &file.mime_type,
            size: file.size(),
        };
        // A 401 has already gone to the dispatcher; the file still fails.
        self.client
            .send_json(Method::POST, "api/uploads/objects", &request, OnUnauthorized::Dispatch)
            .await?
            .ok_or(ApiError::Unauthorized)
    }
}

/// Per-file dashboard status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Waiting,
    Uploading,
    Done { url: String },
    Failed { reason: String },
}

/// One row of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardEntry {
    pub name: String,
    pub size: u64,
    pub bytes_sent: u64,
    pub status: FileStatus,
}

#[derive(Debug, Default)]
struct DashboardState {
    open: bool,
    entries: Vec<DashboardEntry>,
}

/// Live view of a batch. Clones share state, so a UI can hold one while
/// the uploader writes to another.
#[derive(Debug, Clone, Default)]
pub struct UploadDashboard {
    state: Arc<Mutex<DashboardState>>,
}

impl UploadDashboard {
    fn with_state<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Show the dashboard with one waiting row per file.
    pub fn open(&self, files: &[FileUpload]) {
        self.with_state(|state| {
            state.open = true;
            state.entries = files
                .iter()
                .map(|f| DashboardEntry {
                    name: f.name.clone(),
                    size: f.size(),
                    bytes_sent: 0,
                    status: FileStatus::Waiting,
                })
                .collect();
        });
    }

    pub fn close(&self) {
        self.with_state(|state| state.open = false);
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.with_state(|state| state.open)
    }

    #[must_use]
    pub fn entries(&self) -> Vec<DashboardEntry> {
        self.with_state(|state| state.entries.clone())
    }

    /// Bytes sent and bytes expected across the batch.
    #[must_use]
    pub fn progress(&self) -> (u64, u64) {
        self.with_state(|state| {
            state
                .entries
                .iter()
                .fold((0, 0), |(sent, total), e| (sent + e.bytes_sent, total + e.size))
        })
    }

    fn set_status(&self, index: usize, status: FileStatus) {
        self.with_state(|state| {
            if let Some(entry) = state.entries.get_mut(index) {
                if matches!(status, FileStatus::Done { .. }) {
                    entry.bytes_sent = entry.size;
                }
                entry.status = status;
            }
        });
    }

    fn add_sent(&self, index: usize, bytes: u64) {
        self.with_state(|state| {
            if let Some(entry) = state.entries.get_mut(index) {
                entry.bytes_sent = (entry.bytes_sent + bytes).min(entry.size);
            }
        });
    }
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub name: String,
    /// The upload URL without its signature query.
    pub upload_url: String,
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub name: String,
    pub reason: String,
}

/// Outcome of a batch, handed to `on_complete`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchResult {
    pub successful: Vec<UploadedObject>,
    pub failed: Vec<FailedUpload>,
}

#[derive(Debug, thiserror::Error)]
enum FileError {
    #[error(transparent)]
    Rejected(#[from] UploadRejection),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Uploads batches of files under fixed restrictions.
#[derive(Debug)]
pub struct ObjectUploader<P> {
    restrictions: UploadRestrictions,
    parameters: P,
    http: reqwest::Client,
    dashboard: UploadDashboard,
}

impl<P> ObjectUploader<P>
where
    P: UploadParameterSource,
{
    /// Pre-signed URLs carry their own authorization, so the PUTs go
    /// through a client without the session cookie jar.
    #[must_use]
    pub fn new(restrictions: UploadRestrictions, parameters: P) -> Self {
        Self {
            restrictions,
            parameters,
            http: reqwest::Client::new(),
            dashboard: UploadDashboard::default(),
        }
    }

    #[must_use]
    pub const fn restrictions(&self) -> &UploadRestrictions {
        &self.restrictions
    }

    #[must_use]
    pub const fn dashboard(&self) -> &UploadDashboard {
        &self.dashboard
    }

    /// Upload `files`, call `on_complete` with the outcome, then close the
    /// dashboard.
    #[tracing::instrument(skip_all, fields(files = files.len()))]
    pub async fn upload<F>(&self, files: Vec<FileUpload>, on_complete: F) -> BatchResult
    where
        F: FnOnce(&BatchResult),
    {
        self.dashboard.open(&files);
        let count = files.len();
        let mut result = BatchResult::default();

        for (index, file) in files.into_iter().enumerate() {
            let outcome = match self.restrictions.check_count(index + 1) {
                Err(UploadRejection::TooManyFiles { max, .. }) => {
                    Err(FileError::Rejected(UploadRejection::TooManyFiles { count, max }))
                }
                _ => match self.restrictions.check_file(file.size(), &file.mime_type) {
                    Ok(()) => self.put(index, &file).await,
                    Err(rejection) => Err(rejection.into()),
                },
            };

            match outcome {
                Ok(object) => {
                    self.dashboard.set_status(
                        index,
                        FileStatus::Done {
                            url: object.upload_url.clone(),
                        },
                    );
                    result.successful.push(object);
                }
                Err(e) => {
                    tracing::warn!(file = %file.name, error = %e, "upload failed");
                    let reason = e.to_string();
                    self.dashboard.set_status(
                        index,
                        FileStatus::Failed {
                            reason: reason.clone(),
                        },
                    );
                    result.failed.push(FailedUpload {
                        name: file.name,
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            successful = result.successful.len(),
            failed = result.failed.len(),
            "upload batch finished"
        );
        on_complete(&result);
        self.dashboard.close();
        result
    }

    async fn put(&self, index: usize, file: &FileUpload) -> Result<UploadedObject, FileError> {
        let params = self.parameters.upload_parameters(file).await?;
        let url = url::Url::parse(&params.url).map_err(ApiError::from)?;

        self.dashboard.set_status(index, FileStatus::Uploading);

        let dashboard = self.dashboard.clone();
        let chunks: Vec<Vec<u8>> = file.data.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let body = Body::wrap_stream(futures::stream::iter(chunks.into_iter().map(
            move |chunk| {
                dashboard.add_sent(index, chunk.len() as u64);
                Ok::<_, std::io::Error>(chunk)
            },
        )));

        let response = self
            .http
            .put(url.clone())
            .header(CONTENT_TYPE, &file.mime_type)
            .header(CONTENT_LENGTH, file.size())
            .body(body)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &text).into());
        }

        let mut upload_url = url;
        upload_url.set_query(None);
        Ok(UploadedObject {
            name: file.name.clone(),
            upload_url: upload_url.to_string(),
            public_url: params.public_url,
        })
    }
}
