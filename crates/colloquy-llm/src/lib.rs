pub mod config;
pub mod error;
pub mod openai;
pub mod traits;
pub mod types;

pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{AssistantError, Result};
pub use openai::OpenAIClient;
pub use traits::{AssistantsApi, ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
pub use types::{
    Assistant, AssistantId, AssistantRequest, AssistantTool, AssistantUpdate, Content, FileId,
    FileObject, FileStatus, Message, MessageContent, MessageId, Role, Run, RunError, RunId,
    RunStatus, Thread, ThreadId, ThreadMessage,
};
