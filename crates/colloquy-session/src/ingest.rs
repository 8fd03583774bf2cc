use colloquy_llm::{AssistantError, AssistantId, AssistantsApi, FileId, FileStatus, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::poll::{poll_until, Attempt, PollPolicy};

pub const ASSISTANTS_PURPOSE: &str = "assistants";

/// Stages of the per-file state machine:
/// `Local -> Uploading -> Uploaded -> Processed -> Attaching -> Attached`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionStage {
    Local,
    Uploading,
    Uploaded,
    Processed,
    Attaching,
    Attached,
}

impl fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Local => "local",
            Self::Uploading => "uploading",
            Self::Uploaded => "uploaded",
            Self::Processed => "processed",
            Self::Attaching => "attaching",
            Self::Attached => "attached",
        };
        f.write_str(s)
    }
}

/// Outcome of `FileIngestionPipeline::ingest`.
///
/// `stage` is the last stage the file settled in; `error` is set when the
/// pipeline stopped before `Attached`.
#[derive(Debug)]
pub struct IngestionReport {
    pub path: PathBuf,
    pub file_id: Option<FileId>,
    pub stage: IngestionStage,
    pub error: Option<AssistantError>,
}

impl IngestionReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file_id: None,
            stage: IngestionStage::Local,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.stage == IngestionStage::Attached
    }

    fn advance(&mut self, stage: IngestionStage) {
        tracing::debug!(
            path = %self.path.display(),
            from = %self.stage,
            to = %stage,
            "Ingestion stage"
        );
        self.stage = stage;
    }

    /// Record a failure; the file stays in the last settled stage
    fn fail(mut self, settled: IngestionStage, error: AssistantError) -> Self {
        tracing::warn!(
            path = %self.path.display(),
            stage = %settled,
            kind = error.kind(),
            "File ingestion failed: {}",
            error
        );
        self.stage = settled;
        self.error = Some(error);
        self
    }
}

/// Upload -> confirm processed -> attach
#[derive(Clone)]
pub struct FileIngestionPipeline {
    api: Arc<dyn AssistantsApi>,
    file_policy: PollPolicy,
    purpose: String,
}

impl FileIngestionPipeline {
    pub fn new(api: Arc<dyn AssistantsApi>, file_policy: PollPolicy) -> Self {
        Self {
            api,
            file_policy,
            purpose: ASSISTANTS_PURPOSE.to_string(),
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub async fn upload(&self, path: &Path) -> Result<FileId> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(AssistantError::NotFound(path.to_path_buf()));
        }

        let file = self.api.upload_file(path, &self.purpose).await?;
        if file.id.is_empty() {
            return Err(AssistantError::Protocol(
                "upload response has an empty file id".to_string(),
            ));
        }

        tracing::info!(
            file_id = %file.id,
            filename = %file.filename,
            bytes = file.bytes,
            "File uploaded"
        );
        Ok(file.id)
    }

    /// Poll until the file is `processed`. An `error` status or the deadline
    /// passing both yield `IngestionFailed`.
    pub async fn await_processed(&self, file_id: &FileId, timeout: Duration) -> Result<FileStatus> {
        let policy = self.file_policy.clone().with_timeout(timeout);

        let settled = poll_until(&policy, || async move {
            let file = self.api.get_file(file_id).await?;
            tracing::debug!(file_id = %file.id, status = %file.status, "Polled file");

            match file.status {
                FileStatus::Processed | FileStatus::Error => Ok(Attempt::Done(file)),
                FileStatus::Uploaded | FileStatus::Processing => Ok(Attempt::Pending),
            }
        })
        .await?;

        match settled {
            Some(file) if file.status == FileStatus::Processed => Ok(FileStatus::Processed),
            Some(file) => Err(AssistantError::IngestionFailed {
                file_id: file_id.clone(),
                reason: file
                    .status_details
                    .unwrap_or_else(|| "remote processing reported an error".to_string()),
            }),
            None => Err(AssistantError::IngestionFailed {
                file_id: file_id.clone(),
                reason: format!("not processed within {:?}", timeout),
            }),
        }
    }

    pub async fn attach(
        &self,
        file_id: &FileId,
        assistant_id: Option<&AssistantId>,
    ) -> Result<bool> {
        let assistant_id = require_assistant(assistant_id)?;

        self.api.attach_file(assistant_id, file_id).await?;
        tracing::info!(
            file_id = %file_id,
            assistant_id = %assistant_id,
            "File attached to assistant"
        );
        Ok(true)
    }

    /// Run the whole pipeline for one file. Never returns an error directly:
    /// the first failing step is reported in the `IngestionReport` and later
    /// steps are not attempted.
    pub async fn ingest(&self, path: &Path, assistant_id: Option<&AssistantId>) -> IngestionReport {
        let mut report = IngestionReport::new(path);

        if let Err(e) = require_assistant(assistant_id) {
            return report.fail(IngestionStage::Local, e);
        }

        report.advance(IngestionStage::Uploading);
        let file_id = match self.upload(path).await {
            Ok(id) => id,
            Err(e) => return report.fail(IngestionStage::Local, e),
        };
        report.file_id = Some(file_id.clone());
        report.advance(IngestionStage::Uploaded);

        if let Err(e) = self.await_processed(&file_id, self.file_policy.timeout).await {
            return report.fail(IngestionStage::Uploaded, e);
        }
        report.advance(IngestionStage::Processed);

        report.advance(IngestionStage::Attaching);
        match self.attach(&file_id, assistant_id).await {
            Ok(_) => {
                report.advance(IngestionStage::Attached);
                report
            }
            Err(e) => report.fail(IngestionStage::Processed, e),
        }
    }
}

fn require_assistant(assistant_id: Option<&AssistantId>) -> Result<&AssistantId> {
    match assistant_id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(AssistantError::Precondition(
            "an assistant id is required to attach files".to_string(),
        )),
    }
}
