use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::types::{
    Assistant, AssistantId, AssistantRequest, AssistantUpdate, FileId, FileObject, Message, Role,
    Run, RunId, Thread, ThreadId, ThreadMessage,
};

/// Remote assistant service surface consumed by the orchestrator.
///
/// Every call is a single request/response; implementations must not retry.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    async fn create_assistant(&self, request: &AssistantRequest) -> Result<Assistant>;

    async fn get_assistant(&self, id: &AssistantId) -> Result<Assistant>;

    /// Assistants ordered by creation time, newest first
    async fn list_assistants(&self, limit: u8) -> Result<Vec<Assistant>>;

    async fn update_assistant(
        &self,
        id: &AssistantId,
        update: &AssistantUpdate,
    ) -> Result<Assistant>;

    async fn create_thread(&self) -> Result<Thread>;

    async fn get_thread(&self, id: &ThreadId) -> Result<Thread>;

    async fn delete_thread(&self, id: &ThreadId) -> Result<()>;

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage>;

    /// Every message on the thread, newest first, across all pages
    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>>;

    async fn create_run(&self, thread_id: &ThreadId, assistant_id: &AssistantId) -> Result<Run>;

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run>;

    async fn cancel_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run>;

    async fn upload_file(&self, path: &Path, purpose: &str) -> Result<FileObject>;

    async fn get_file(&self, id: &FileId) -> Result<FileObject>;

    async fn attach_file(&self, assistant_id: &AssistantId, file_id: &FileId) -> Result<()>;
}

/// Stateless chat completions, used by the plain-chat conversation mode
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}
