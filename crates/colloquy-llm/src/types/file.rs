use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::FileId;

/// File uploaded to the remote service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub id: FileId,
    pub filename: String,
    pub bytes: u64,
    pub purpose: String,
    pub status: FileStatus,
    pub created_at: i64,
    #[serde(default)]
    pub status_details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Uploaded,
    Processing,
    Processed,
    Error,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}
