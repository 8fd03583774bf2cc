use colloquy_llm::{
    AssistantError, AssistantId, AssistantsApi, MessageId, Result, Role, Run, RunStatus, ThreadId,
    ThreadMessage,
};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ConversationCache;
use crate::poll::{poll_until, Attempt, PollPolicy};

/// Turn-taking protocol against one thread:
/// post message -> trigger run -> await terminal status -> fetch history -> newest reply.
#[derive(Clone)]
pub struct MessageExchange {
    api: Arc<dyn AssistantsApi>,
    run_policy: PollPolicy,
}

impl MessageExchange {
    pub fn new(api: Arc<dyn AssistantsApi>, run_policy: PollPolicy) -> Self {
        Self { api, run_policy }
    }

    pub fn run_policy(&self) -> &PollPolicy {
        &self.run_policy
    }

    pub async fn post_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<MessageId> {
        let message = self.api.create_message(thread_id, role, content).await?;
        tracing::debug!(thread_id = %thread_id, message_id = %message.id, %role, "Message posted");
        Ok(message.id)
    }

    pub async fn trigger_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run> {
        if assistant_id.is_empty() {
            return Err(AssistantError::Precondition("assistant id is not set".to_string()));
        }

        let run = self.api.create_run(thread_id, assistant_id).await?;
        tracing::debug!(
            thread_id = %thread_id,
            run_id = %run.id,
            status = %run.status,
            "Run triggered"
        );
        Ok(run)
    }

    /// Poll the run until it reaches a terminal status.
    ///
    /// `completed` is the only successful outcome. Any other terminal status,
    /// or `requires_action` (tool outputs are never submitted), yields
    /// `RunFailed`. On timeout a best-effort cancel is sent before `Timeout`
    /// is returned.
    pub async fn await_completion(&self, run: &Run, timeout: Duration) -> Result<RunStatus> {
        let policy = self.run_policy.clone().with_timeout(timeout);

        let finished = poll_until(&policy, || async move {
            let current = self.api.get_run(&run.thread_id, &run.id).await?;
            tracing::debug!(run_id = %current.id, status = %current.status, "Polled run");

            if current.status.is_terminal() || current.status == RunStatus::RequiresAction {
                Ok(Attempt::Done(current))
            } else {
                Ok(Attempt::Pending)
            }
        })
        .await?;

        let Some(finished) = finished else {
            self.cancel_quietly(run).await;
            return Err(AssistantError::Timeout {
                operation: format!("run {}", run.id),
                timeout,
            });
        };

        match finished.status {
            RunStatus::Completed => {
                tracing::info!(run_id = %finished.id, "Run completed");
                Ok(RunStatus::Completed)
            }
            status => Err(AssistantError::RunFailed {
                run_id: finished.id,
                status,
                detail: finished.last_error.map(|e| format!("{}: {}", e.code, e.message)),
            }),
        }
    }

    async fn cancel_quietly(&self, run: &Run) {
        match self.api.cancel_run(&run.thread_id, &run.id).await {
            Ok(cancelled) => {
                tracing::info!(
                    run_id = %run.id,
                    status = %cancelled.status,
                    "Cancelled timed-out run"
                )
            }
            Err(e) => tracing::warn!(run_id = %run.id, "Failed to cancel timed-out run: {}", e),
        }
    }

    /// Thread history, newest first
    pub async fn fetch_history(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>> {
        self.api.list_messages(thread_id).await
    }

    /// Newest message of a newest-first history
    pub fn most_recent(history: &[ThreadMessage]) -> Result<&ThreadMessage> {
        history.first().ok_or(AssistantError::EmptyHistory)
    }

    /// One full conversational turn. Both turns are recorded in `cache`: the
    /// user turn once the remote thread holds it, the reply once it is read.
    pub async fn exchange(
        &self,
        cache: &mut ConversationCache,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
        user_text: &str,
    ) -> Result<String> {
        self.post_message(thread_id, Role::User, user_text).await?;
        cache.append(Role::User, user_text);

        let reply = self.reply_to_latest(thread_id, assistant_id).await?;
        cache.append(Role::Assistant, reply.as_str());
        Ok(reply)
    }

    /// Run the assistant on the thread as it stands and return its reply.
    /// Touches no cache.
    pub async fn reply_to_latest(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<String> {
        let run = self.trigger_run(thread_id, assistant_id).await?;
        self.await_completion(&run, self.run_policy.timeout).await?;

        let history = self.fetch_history(thread_id).await?;
        let newest = Self::most_recent(&history)?;
        if newest.role != Role::Assistant {
            return Err(AssistantError::Protocol(format!(
                "newest message {} on thread {} is not an assistant reply",
                newest.id, thread_id
            )));
        }

        Ok(newest.text())
    }
}
