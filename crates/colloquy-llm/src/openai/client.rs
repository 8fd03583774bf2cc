// OpenAI Assistants (v2) and Chat Completions over plain HTTP

use crate::config::ClientConfig;
use crate::error::{AssistantError, Result};
use crate::traits::{AssistantsApi, ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
use crate::types::{
    Assistant, AssistantId, AssistantRequest, AssistantUpdate, FileId, FileObject, ListResponse,
    Message, Role, Run, RunId, Thread, ThreadId, ThreadMessage,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

const BETA_HEADER: HeaderName = HeaderName::from_static("openai-beta");
const MESSAGE_PAGE_LIMIT: u8 = 100;

/// OpenAI client (HTTP direct, no SDK)
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create a client for the public API with default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig::new(api_key))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| AssistantError::Validation("Invalid API key format".to_string()))?,
        );
        headers.insert(
            BETA_HEADER,
            HeaderValue::from_str(&config.beta_header)
                .map_err(|_| AssistantError::Validation("Invalid beta header value".to_string()))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                AssistantError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a successful JSON body
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "request failed");
            return Err(AssistantError::remote(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| AssistantError::Protocol(format!("Failed to parse response: {}", e)))
    }

    /// Build chat completion request payload
    fn build_chat_request(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Value {
        let mut request = json!({
            "model": model,
            "messages": messages,
        });

        if let Some(obj) = request.as_object_mut() {
            if let Some(temp) = options.temperature {
                obj.insert("temperature".to_string(), json!(temp));
            }
            if let Some(max_tokens) = options.max_tokens {
                obj.insert("max_tokens".to_string(), json!(max_tokens));
            }
        }

        request
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl AssistantsApi for OpenAIClient {
    async fn create_assistant(&self, request: &AssistantRequest) -> Result<Assistant> {
        tracing::debug!(model = %request.model, "POST /assistants");
        self.send(self.http_client.post(self.url("/assistants")).json(request))
            .await
    }

    async fn get_assistant(&self, id: &AssistantId) -> Result<Assistant> {
        tracing::debug!(assistant_id = %id, "GET /assistants/{{id}}");
        self.send(self.http_client.get(self.url(&format!("/assistants/{}", id))))
            .await
    }

    async fn list_assistants(&self, limit: u8) -> Result<Vec<Assistant>> {
        tracing::debug!(limit, "GET /assistants");
        let page: ListResponse<Assistant> = self
            .send(
                self.http_client
                    .get(self.url("/assistants"))
                    .query(&[("order", "desc".to_string()), ("limit", limit.to_string())]),
            )
            .await?;
        Ok(page.data)
    }

    async fn update_assistant(
        &self,
        id: &AssistantId,
        update: &AssistantUpdate,
    ) -> Result<Assistant> {
        tracing::debug!(assistant_id = %id, "POST /assistants/{{id}}");
        self.send(
            self.http_client
                .post(self.url(&format!("/assistants/{}", id)))
                .json(update),
        )
        .await
    }

    async fn create_thread(&self) -> Result<Thread> {
        tracing::debug!("POST /threads");
        self.send(self.http_client.post(self.url("/threads")).json(&json!({})))
            .await
    }

    async fn get_thread(&self, id: &ThreadId) -> Result<Thread> {
        tracing::debug!(thread_id = %id, "GET /threads/{{id}}");
        self.send(self.http_client.get(self.url(&format!("/threads/{}", id))))
            .await
    }

    async fn delete_thread(&self, id: &ThreadId) -> Result<()> {
        tracing::debug!(thread_id = %id, "DELETE /threads/{{id}}");
        let status: DeletionStatus = self
            .send(self.http_client.delete(self.url(&format!("/threads/{}", id))))
            .await?;

        if status.deleted {
            Ok(())
        } else {
            Err(AssistantError::Protocol(format!("Thread {} was not deleted", id)))
        }
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage> {
        tracing::debug!(thread_id = %thread_id, %role, "POST /threads/{{id}}/messages");
        self.send(
            self.http_client
                .post(self.url(&format!("/threads/{}/messages", thread_id)))
                .json(&json!({ "role": role, "content": content })),
        )
        .await
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>> {
        let url = self.url(&format!("/threads/{}/messages", thread_id));
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        // Pages come newest first; `after` walks towards older messages
        loop {
            tracing::debug!(thread_id = %thread_id, after = ?after, "GET /threads/{{id}}/messages");
            let mut query = vec![
                ("order", "desc".to_string()),
                ("limit", MESSAGE_PAGE_LIMIT.to_string()),
            ];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let page: ListResponse<ThreadMessage> =
                self.send(self.http_client.get(&url).query(&query)).await?;
            let cursor = page
                .last_id
                .clone()
                .or_else(|| page.data.last().map(|m| m.id.to_string()));
            let has_more = page.has_more;
            messages.extend(page.data);

            if !has_more {
                break;
            }
            match cursor {
                Some(next) if after.as_deref() != Some(next.as_str()) => after = Some(next),
                _ => {
                    return Err(AssistantError::Protocol(format!(
                        "message list for thread {} reports more pages without a new cursor",
                        thread_id
                    )))
                }
            }
        }

        Ok(messages)
    }

    async fn create_run(&self, thread_id: &ThreadId, assistant_id: &AssistantId) -> Result<Run> {
        tracing::debug!(
            thread_id = %thread_id,
            assistant_id = %assistant_id,
            "POST /threads/{{id}}/runs"
        );
        self.send(
            self.http_client
                .post(self.url(&format!("/threads/{}/runs", thread_id)))
                .json(&json!({ "assistant_id": assistant_id })),
        )
        .await
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run> {
        tracing::debug!(
            thread_id = %thread_id,
            run_id = %run_id,
            "GET /threads/{{id}}/runs/{{id}}"
        );
        self.send(
            self.http_client
                .get(self.url(&format!("/threads/{}/runs/{}", thread_id, run_id))),
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run> {
        tracing::debug!(
            thread_id = %thread_id,
            run_id = %run_id,
            "POST /threads/{{id}}/runs/{{id}}/cancel"
        );
        self.send(
            self.http_client
                .post(self.url(&format!("/threads/{}/runs/{}/cancel", thread_id, run_id))),
        )
        .await
    }

    async fn upload_file(&self, path: &Path, purpose: &str) -> Result<FileObject> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssistantError::NotFound(path.to_path_buf()),
            _ => AssistantError::from(e),
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        tracing::debug!(%filename, size = bytes.len(), "POST /files");

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .text("purpose", purpose.to_string())
            .part("file", part);

        self.send(self.http_client.post(self.url("/files")).multipart(form))
            .await
    }

    async fn get_file(&self, id: &FileId) -> Result<FileObject> {
        tracing::debug!(file_id = %id, "GET /files/{{id}}");
        self.send(self.http_client.get(self.url(&format!("/files/{}", id))))
            .await
    }

    /// Assistant-files route (`POST /assistants/{id}/files`). Services that
    /// only speak `assistants=v2` attach files through vector stores
    /// (`/vector_stores/{id}/files`) and answer this route with an error,
    /// which leaves ingestion at `Processed`.
    async fn attach_file(&self, assistant_id: &AssistantId, file_id: &FileId) -> Result<()> {
        tracing::debug!(
            assistant_id = %assistant_id,
            file_id = %file_id,
            "POST /assistants/{{id}}/files"
        );
        let _: Value = self
            .send(
                self.http_client
                    .post(self.url(&format!("/assistants/{}/files", assistant_id)))
                    .json(&json!({ "file_id": file_id })),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_chat_request(&request.model, &request.messages, &request.options);

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "POST /chat/completions"
        );
        let raw: OpenAIChatResponse = self
            .send(self.http_client.post(self.url("/chat/completions")).json(&payload))
            .await?;

        // Convert to provider-agnostic response
        let choice = raw.choices.into_iter().next();
        Ok(ChatResponse {
            content: choice.as_ref().and_then(|c| c.message.content.clone()),
            usage: raw.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.and_then(|c| c.finish_reason),
        })
    }
}

// ============================================================================
// OPENAI-SPECIFIC RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct DeletionStatus {
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
