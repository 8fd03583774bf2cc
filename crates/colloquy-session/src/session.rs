use async_trait::async_trait;
use colloquy_llm::{
    AssistantError, AssistantId, AssistantsApi, ChatClient, ChatOptions, ChatRequest, Message,
    Result, Role, ThreadId,
};
use std::sync::Arc;

use crate::cache::{ConversationCache, DEFAULT_CACHE_WINDOW};
use crate::ephemeral::EphemeralTaskRunner;
use crate::exchange::MessageExchange;
use crate::poll::PollPolicy;
use crate::registry::AssistantRegistry;
use crate::templates;
use crate::thread::ThreadSession;

pub const DEFAULT_CHAT_INSTRUCTIONS: &str = "You are a helpful assistant.";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub cache_window: usize,
    pub run_policy: PollPolicy,
    pub file_policy: PollPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cache_window: DEFAULT_CACHE_WINDOW,
            run_policy: PollPolicy::for_runs(),
            file_policy: PollPolicy::for_files(),
        }
    }
}

/// How a session produces replies.
///
/// Implementations must record the user turn and the reply in `cache` only
/// after each has been accepted.
#[async_trait]
pub trait ConversationMode: Send + Sync {
    fn name(&self) -> &'static str;

    /// One conversational turn. `context`, when given, replaces the
    /// instructions; whether the change outlives the turn is up to the mode.
    async fn reply(
        &mut self,
        cache: &mut ConversationCache,
        context: Option<&str>,
        user_text: &str,
    ) -> Result<String>;

    /// One-shot generation that leaves the conversation untouched
    async fn generate(&self, instruction: &str) -> Result<String>;

    /// Rebuild `cache` from the authoritative history, when there is one
    async fn resync(&mut self, _cache: &mut ConversationCache) -> Result<()> {
        Ok(())
    }
}

/// Replies come from a remote assistant running on a thread
pub struct AssistantMode {
    registry: AssistantRegistry,
    threads: ThreadSession,
    exchange: MessageExchange,
    tasks: EphemeralTaskRunner,
    assistant_id: AssistantId,
}

impl AssistantMode {
    pub fn new(
        api: Arc<dyn AssistantsApi>,
        assistant_id: AssistantId,
        options: &SessionOptions,
    ) -> Self {
        let exchange = MessageExchange::new(api.clone(), options.run_policy.clone());
        Self {
            registry: AssistantRegistry::new(api.clone()),
            threads: ThreadSession::new(api.clone()),
            tasks: EphemeralTaskRunner::new(api, exchange.clone(), assistant_id.clone()),
            exchange,
            assistant_id,
        }
    }

    /// Continue an existing remote thread instead of creating one
    pub fn with_thread(mut self, thread_id: ThreadId) -> Self {
        self.threads.adopt(thread_id);
        self
    }

    pub fn assistant_id(&self) -> &AssistantId {
        &self.assistant_id
    }

    pub fn thread_id(&self) -> Option<&ThreadId> {
        self.threads.active()
    }

    pub fn registry(&self) -> &AssistantRegistry {
        &self.registry
    }

    pub fn tasks(&self) -> &EphemeralTaskRunner {
        &self.tasks
    }
}

#[async_trait]
impl ConversationMode for AssistantMode {
    fn name(&self) -> &'static str {
        "assistant"
    }

    async fn reply(
        &mut self,
        cache: &mut ConversationCache,
        context: Option<&str>,
        user_text: &str,
    ) -> Result<String> {
        if let Some(context) = context {
            self.registry
                .set_instructions(&self.assistant_id, context)
                .await?;
        }

        let thread_id = self.threads.ensure().await?;
        self.exchange
            .exchange(cache, &thread_id, &self.assistant_id, user_text)
            .await
    }

    async fn generate(&self, instruction: &str) -> Result<String> {
        self.tasks.run_instruction(instruction).await
    }

    async fn resync(&mut self, cache: &mut ConversationCache) -> Result<()> {
        let Some(thread_id) = self.threads.active() else {
            return Ok(());
        };

        let history = self.exchange.fetch_history(thread_id).await?;
        cache.rebuild_from(&history);
        tracing::debug!(
            thread_id = %thread_id,
            entries = cache.len(),
            "Cache rebuilt from remote history"
        );
        Ok(())
    }
}

/// Replies come from stateless chat completions; the cache window is the
/// conversational context sent with every turn
pub struct ChatMode {
    client: Arc<dyn ChatClient>,
    model: String,
    instructions: String,
    options: ChatOptions,
}

impl ChatMode {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            instructions: DEFAULT_CHAT_INSTRUCTIONS.to_string(),
            options: ChatOptions::default(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let request =
            ChatRequest::new(self.model.clone(), messages).with_options(self.options.clone());
        let response = self.client.chat(request).await?;
        response.content.ok_or_else(|| {
            AssistantError::Protocol("chat completion returned no content".to_string())
        })
    }
}

#[async_trait]
impl ConversationMode for ChatMode {
    fn name(&self) -> &'static str {
        "chat"
    }

    async fn reply(
        &mut self,
        cache: &mut ConversationCache,
        context: Option<&str>,
        user_text: &str,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(cache.len() + 2);
        messages.push(Message::system(context.unwrap_or(&self.instructions)));
        messages.extend(
            cache
                .entries()
                .map(|entry| Message::from_role(entry.role, entry.content.as_str())),
        );
        messages.push(Message::human(user_text));

        let reply = self.complete(messages).await?;
        cache.append(Role::User, user_text);
        cache.append(Role::Assistant, reply.as_str());
        Ok(reply)
    }

    async fn generate(&self, instruction: &str) -> Result<String> {
        self.complete(vec![Message::human(instruction)]).await
    }
}

/// A conversation owned by one caller: the reply mode plus its local cache
pub struct Session<M: ConversationMode> {
    mode: M,
    cache: ConversationCache,
}

impl<M: ConversationMode> Session<M> {
    pub fn new(mode: M, cache_window: usize) -> Self {
        Self {
            mode,
            cache: ConversationCache::new(cache_window),
        }
    }

    pub async fn ask(&mut self, question: &str) -> Result<String> {
        self.turn(None, question).await
    }

    /// Ask with replacement instructions.
    ///
    /// In chat mode `context` is the system message for this turn only. In
    /// assistant mode it is stored on the remote assistant, so later turns
    /// and every other session using that assistant keep it.
    pub async fn ask_with_context(&mut self, context: &str, question: &str) -> Result<String> {
        self.turn(Some(context), question).await
    }

    async fn turn(&mut self, context: Option<&str>, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(AssistantError::Validation("question must not be empty".to_string()));
        }

        let reply = self.mode.reply(&mut self.cache, context, question).await?;
        tracing::debug!(mode = self.mode.name(), cached = self.cache.len(), "Turn completed");
        Ok(reply)
    }

    /// Generate `count` starter questions about `context`
    pub async fn sample_questions(
        &self,
        context: &str,
        count: usize,
        max_words: usize,
    ) -> Result<Vec<String>> {
        if count == 0 || max_words == 0 {
            return Err(AssistantError::Validation(
                "count and max_words must both be at least 1".to_string(),
            ));
        }

        let prompt = templates::sample_questions_prompt(context, count, max_words);
        let reply = self.mode.generate(&prompt).await?;
        Ok(templates::split_questions(&reply))
    }

    pub async fn resync(&mut self) -> Result<()> {
        self.mode.resync(&mut self.cache).await
    }

    /// Clear the local conversation window; remote state is untouched
    pub fn reset(&mut self) {
        self.cache.reset();
    }

    pub fn transcript(&self) -> &ConversationCache {
        &self.cache
    }

    pub fn mode(&self) -> &M {
        &self.mode
    }
}
