use colloquy_llm::{AssistantError, AssistantsApi, Result, Thread, ThreadId};
use std::sync::Arc;

/// Owns the identity and lifecycle of one active conversation thread.
///
/// Threads created through `create` are not adopted as the active thread;
/// only `ensure` and `adopt` set it.
pub struct ThreadSession {
    api: Arc<dyn AssistantsApi>,
    active: Option<ThreadId>,
}

impl ThreadSession {
    pub fn new(api: Arc<dyn AssistantsApi>) -> Self {
        Self { api, active: None }
    }

    /// Session resuming an existing remote thread
    pub fn with_thread(api: Arc<dyn AssistantsApi>, thread_id: ThreadId) -> Self {
        Self {
            api,
            active: Some(thread_id),
        }
    }

    pub async fn create(&self) -> Result<ThreadId> {
        let thread = self.api.create_thread().await?;
        if thread.id.is_empty() {
            return Err(AssistantError::Protocol(
                "create thread response has an empty id".to_string(),
            ));
        }

        tracing::info!(thread_id = %thread.id, "Thread created");
        Ok(thread.id)
    }

    /// Active thread id, creating the thread on first use
    pub async fn ensure(&mut self) -> Result<ThreadId> {
        if let Some(id) = &self.active {
            return Ok(id.clone());
        }

        let id = self.create().await?;
        self.active = Some(id.clone());
        Ok(id)
    }

    pub async fn get(&self, id: &ThreadId) -> Result<Thread> {
        self.api.get_thread(id).await
    }

    /// Delete a thread remotely; forgets it if it was the active one
    pub async fn delete(&mut self, id: &ThreadId) -> Result<()> {
        self.api.delete_thread(id).await?;
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }

        tracing::info!(thread_id = %id, "Thread deleted");
        Ok(())
    }

    pub fn active(&self) -> Option<&ThreadId> {
        self.active.as_ref()
    }

    pub fn adopt(&mut self, id: ThreadId) {
        self.active = Some(id);
    }
}
