pub mod assistant;
pub mod content;
pub mod file;
pub mod ids;
pub mod message;
pub mod run;
pub mod thread;
pub mod tool;

pub use assistant::{Assistant, AssistantRequest, AssistantUpdate};
pub use content::Content;
pub use file::{FileObject, FileStatus};
pub use ids::{AssistantId, FileId, MessageId, RunId, ThreadId};
pub use message::Message;
pub use run::{Run, RunError, RunStatus};
pub use thread::{ListResponse, MessageContent, Role, TextContent, Thread, ThreadMessage};
pub use tool::{AssistantTool, FunctionDefinition};

use chrono::{DateTime, Utc};

/// Convert a remote unix timestamp (seconds) into a UTC datetime
pub(crate) fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
