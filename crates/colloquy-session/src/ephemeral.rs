use colloquy_llm::{AssistantId, AssistantsApi, Result, Role, ThreadId};
use std::sync::Arc;

use crate::exchange::MessageExchange;
use crate::templates::{self, DESCRIPTION_TEMPLATE, TITLE_TEMPLATE};
use crate::thread::ThreadSession;

/// Runs one-off generation tasks on throwaway threads so they never touch
/// the main conversation or its cache.
#[derive(Clone)]
pub struct EphemeralTaskRunner {
    api: Arc<dyn AssistantsApi>,
    exchange: MessageExchange,
    assistant_id: AssistantId,
}

impl EphemeralTaskRunner {
    pub fn new(
        api: Arc<dyn AssistantsApi>,
        exchange: MessageExchange,
        assistant_id: AssistantId,
    ) -> Self {
        Self {
            api,
            exchange,
            assistant_id,
        }
    }

    /// Render `template` with `subject` and return the assistant's answer.
    ///
    /// The ephemeral thread is deleted on every path once it exists. A failed
    /// deletion is logged and never replaces the task's own result.
    pub async fn run(&self, template: &str, subject: &str) -> Result<String> {
        let instruction = templates::render(template, subject);
        self.run_instruction(&instruction).await
    }

    pub async fn run_instruction(&self, instruction: &str) -> Result<String> {
        let mut threads = ThreadSession::new(self.api.clone());
        let thread_id = threads.create().await?;

        let outcome = self.generate(&thread_id, instruction).await;

        if let Err(cleanup) = threads.delete(&thread_id).await {
            tracing::warn!(
                thread_id = %thread_id,
                kind = cleanup.kind(),
                "Failed to delete ephemeral thread: {}",
                cleanup
            );
        }

        outcome
    }

    async fn generate(&self, thread_id: &ThreadId, instruction: &str) -> Result<String> {
        self.exchange
            .post_message(thread_id, Role::User, instruction)
            .await?;
        self.exchange
            .reply_to_latest(thread_id, &self.assistant_id)
            .await
    }

    /// Short description of the domain covered by `subject`
    pub async fn describe(&self, subject: &str) -> Result<String> {
        self.run(DESCRIPTION_TEMPLATE, subject).await.map(|s| s.trim().to_string())
    }

    /// Short title for a conversation opening with `subject`
    pub async fn title(&self, subject: &str) -> Result<String> {
        self.run(TITLE_TEMPLATE, subject)
            .await
            .map(|s| s.trim().trim_matches('"').to_string())
    }
}
