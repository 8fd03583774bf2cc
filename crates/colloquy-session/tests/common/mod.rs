#![allow(dead_code)]

use async_trait::async_trait;
use colloquy_llm::{
    Assistant, AssistantError, AssistantId, AssistantRequest, AssistantUpdate, AssistantsApi,
    ChatClient, ChatRequest, ChatResponse, FileId, FileObject, FileStatus, MessageContent,
    MessageId, Result, Role, Run, RunError, RunId, RunStatus, Thread, ThreadId, ThreadMessage,
};
use colloquy_session::PollPolicy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn fast_policy(timeout_ms: u64) -> PollPolicy {
    PollPolicy::new(Duration::from_millis(timeout_ms))
        .with_intervals(Duration::from_millis(1), Duration::from_millis(5))
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

fn not_found(what: &str, id: &str) -> AssistantError {
    AssistantError::remote(
        404,
        &format!(r#"{{"error": {{"message": "No {} found with id '{}'."}}}}"#, what, id),
    )
}

struct FakeRun {
    run: Run,
    polls: usize,
    replied: bool,
}

struct State {
    clock: i64,
    assistants: HashMap<AssistantId, Assistant>,
    threads: HashMap<ThreadId, Vec<ThreadMessage>>,
    runs: HashMap<RunId, FakeRun>,
    files: HashMap<FileId, (FileObject, usize)>,
    run_script: Vec<RunStatus>,
    file_script: Vec<FileStatus>,
    reply: Option<String>,
    fail_attach: bool,
    fail_delete: bool,
    fail_runs: bool,
    calls: Vec<String>,
    created_threads: Vec<ThreadId>,
    attached: Vec<(AssistantId, FileId)>,
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

/// In-memory stand-in for the remote assistant service.
///
/// Runs walk through `run_script` one status per poll (the last status
/// repeats). When a run first reports `completed`, an assistant message is
/// appended to its thread.
#[derive(Clone)]
pub struct FakeAssistantsApi {
    state: Arc<Mutex<State>>,
}

impl FakeAssistantsApi {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                clock: 1_700_000_000,
                assistants: HashMap::new(),
                threads: HashMap::new(),
                runs: HashMap::new(),
                files: HashMap::new(),
                run_script: vec![RunStatus::InProgress, RunStatus::Completed],
                file_script: vec![FileStatus::Processing, FileStatus::Processed],
                reply: None,
                fail_attach: false,
                fail_delete: false,
                fail_runs: false,
                calls: Vec::new(),
                created_threads: Vec::new(),
                attached: Vec::new(),
            })),
        }
    }

    pub fn with_run_script(self, script: Vec<RunStatus>) -> Self {
        self.state.lock().unwrap().run_script = script;
        self
    }

    pub fn with_file_script(self, script: Vec<FileStatus>) -> Self {
        self.state.lock().unwrap().file_script = script;
        self
    }

    pub fn with_reply(self, reply: &str) -> Self {
        self.state.lock().unwrap().reply = Some(reply.to_string());
        self
    }

    pub fn failing_attach(self) -> Self {
        self.state.lock().unwrap().fail_attach = true;
        self
    }

    pub fn failing_delete(self) -> Self {
        self.state.lock().unwrap().fail_delete = true;
        self
    }

    /// `create_run` answers with a server error
    pub fn failing_runs(self) -> Self {
        self.state.lock().unwrap().fail_runs = true;
        self
    }

    pub fn shared(self) -> Arc<dyn AssistantsApi> {
        Arc::new(self)
    }

    pub fn seed_assistant(&self, id: &str) -> AssistantId {
        let mut state = self.state.lock().unwrap();
        let created_at = state.tick();
        let assistant = Assistant {
            id: AssistantId::new(id),
            name: Some("seeded".to_string()),
            model: "gpt-4o-mini".to_string(),
            instructions: None,
            description: None,
            temperature: Some(1.0),
            tools: Vec::new(),
            created_at,
        };
        state.assistants.insert(assistant.id.clone(), assistant);
        AssistantId::new(id)
    }

    pub fn assistant(&self, id: &AssistantId) -> Option<Assistant> {
        self.state.lock().unwrap().assistants.get(id).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }

    pub fn thread_count(&self) -> usize {
        self.state.lock().unwrap().threads.len()
    }

    pub fn thread_ids(&self) -> Vec<ThreadId> {
        self.state.lock().unwrap().threads.keys().cloned().collect()
    }

    /// Every thread id ever handed out, in creation order
    pub fn created_threads(&self) -> Vec<ThreadId> {
        self.state.lock().unwrap().created_threads.clone()
    }

    pub fn attached(&self) -> Vec<(AssistantId, FileId)> {
        self.state.lock().unwrap().attached.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }

    fn status_at(script: &[RunStatus], polls: usize) -> RunStatus {
        script
            .get(polls)
            .or_else(|| script.last())
            .copied()
            .unwrap_or(RunStatus::Completed)
    }
}

#[async_trait]
impl AssistantsApi for FakeAssistantsApi {
    async fn create_assistant(&self, request: &AssistantRequest) -> Result<Assistant> {
        self.record("create_assistant");
        let mut state = self.state.lock().unwrap();
        let created_at = state.tick();
        let assistant = Assistant {
            id: AssistantId::new(new_id("asst")),
            name: request.name.clone(),
            model: request.model.clone(),
            instructions: request.instructions.clone(),
            description: request.description.clone(),
            temperature: request.temperature,
            tools: request.tools.clone(),
            created_at,
        };
        state.assistants.insert(assistant.id.clone(), assistant.clone());
        Ok(assistant)
    }

    async fn get_assistant(&self, id: &AssistantId) -> Result<Assistant> {
        self.record("get_assistant");
        let state = self.state.lock().unwrap();
        state
            .assistants
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("assistant", id.as_str()))
    }

    async fn list_assistants(&self, limit: u8) -> Result<Vec<Assistant>> {
        self.record("list_assistants");
        let state = self.state.lock().unwrap();
        let mut all: Vec<Assistant> = state.assistants.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn update_assistant(
        &self,
        id: &AssistantId,
        update: &AssistantUpdate,
    ) -> Result<Assistant> {
        self.record("update_assistant");
        let mut state = self.state.lock().unwrap();
        let assistant = state
            .assistants
            .get_mut(id)
            .ok_or_else(|| not_found("assistant", id.as_str()))?;

        if let Some(instructions) = &update.instructions {
            assistant.instructions = Some(instructions.clone());
        }
        if let Some(description) = &update.description {
            assistant.description = Some(description.clone());
        }
        if let Some(temperature) = update.temperature {
            assistant.temperature = Some(temperature);
        }
        if let Some(tools) = &update.tools {
            assistant.tools = tools.clone();
        }
        Ok(assistant.clone())
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.record("create_thread");
        let mut state = self.state.lock().unwrap();
        let created_at = state.tick();
        let id = ThreadId::new(new_id("thread"));
        state.threads.insert(id.clone(), Vec::new());
        state.created_threads.push(id.clone());
        Ok(Thread {
            id,
            created_at,
            metadata: HashMap::new(),
        })
    }

    async fn get_thread(&self, id: &ThreadId) -> Result<Thread> {
        self.record("get_thread");
        let state = self.state.lock().unwrap();
        if state.threads.contains_key(id) {
            Ok(Thread {
                id: id.clone(),
                created_at: 0,
                metadata: HashMap::new(),
            })
        } else {
            Err(not_found("thread", id.as_str()))
        }
    }

    async fn delete_thread(&self, id: &ThreadId) -> Result<()> {
        self.record("delete_thread");
        let mut state = self.state.lock().unwrap();
        if state.fail_delete {
            return Err(AssistantError::remote(500, "internal error"));
        }
        state
            .threads
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("thread", id.as_str()))
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage> {
        self.record("create_message");
        let mut state = self.state.lock().unwrap();
        let created_at = state.tick();
        let messages = state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| not_found("thread", thread_id.as_str()))?;

        let message = ThreadMessage {
            id: MessageId::new(new_id("msg")),
            thread_id: thread_id.clone(),
            role,
            content: vec![MessageContent::text(content)],
            created_at,
            assistant_id: None,
            run_id: None,
        };
        messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>> {
        self.record("list_messages");
        let state = self.state.lock().unwrap();
        let messages = state
            .threads
            .get(thread_id)
            .ok_or_else(|| not_found("thread", thread_id.as_str()))?;
        Ok(messages.iter().rev().cloned().collect())
    }

    async fn create_run(&self, thread_id: &ThreadId, assistant_id: &AssistantId) -> Result<Run> {
        self.record("create_run");
        let mut state = self.state.lock().unwrap();
        if state.fail_runs {
            return Err(AssistantError::remote(500, r#"{"error": {"message": "The server had an error"}}"#));
        }
        if !state.threads.contains_key(thread_id) {
            return Err(not_found("thread", thread_id.as_str()));
        }

        let created_at = state.tick();
        let run = Run {
            id: RunId::new(new_id("run")),
            thread_id: thread_id.clone(),
            assistant_id: assistant_id.clone(),
            status: RunStatus::Queued,
            created_at,
            last_error: None,
        };
        state.runs.insert(
            run.id.clone(),
            FakeRun {
                run: run.clone(),
                polls: 0,
                replied: false,
            },
        );
        Ok(run)
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run> {
        self.record("get_run");
        let mut state = self.state.lock().unwrap();
        let script = state.run_script.clone();
        let reply_override = state.reply.clone();
        let created_at = state.tick();

        let fake = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| not_found("run", run_id.as_str()))?;
        let status = Self::status_at(&script, fake.polls);
        fake.polls += 1;
        fake.run.status = status;
        if status == RunStatus::Failed {
            fake.run.last_error = Some(RunError {
                code: "server_error".to_string(),
                message: "Something went wrong".to_string(),
            });
        }

        let run = fake.run.clone();
        let needs_reply = status == RunStatus::Completed && !fake.replied;
        fake.replied |= needs_reply;

        if needs_reply {
            let messages = state
                .threads
                .get_mut(thread_id)
                .ok_or_else(|| not_found("thread", thread_id.as_str()))?;
            let question = messages.last().map(|m| m.text()).unwrap_or_default();
            let text = reply_override.unwrap_or_else(|| format!("reply to: {}", question));
            messages.push(ThreadMessage {
                id: MessageId::new(new_id("msg")),
                thread_id: thread_id.clone(),
                role: Role::Assistant,
                content: vec![MessageContent::text(text)],
                created_at,
                assistant_id: Some(run.assistant_id.clone()),
                run_id: Some(run.id.clone()),
            });
        }

        Ok(run)
    }

    async fn cancel_run(&self, _thread_id: &ThreadId, run_id: &RunId) -> Result<Run> {
        self.record("cancel_run");
        let mut state = self.state.lock().unwrap();
        let fake = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| not_found("run", run_id.as_str()))?;
        fake.run.status = RunStatus::Cancelling;
        Ok(fake.run.clone())
    }

    async fn upload_file(&self, path: &Path, purpose: &str) -> Result<FileObject> {
        self.record("upload_file");
        let bytes = std::fs::metadata(path)
            .map_err(|_| AssistantError::NotFound(path.to_path_buf()))?
            .len();

        let mut state = self.state.lock().unwrap();
        let created_at = state.tick();
        let file = FileObject {
            id: FileId::new(new_id("file")),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            bytes,
            purpose: purpose.to_string(),
            status: FileStatus::Uploaded,
            created_at,
            status_details: None,
        };
        state.files.insert(file.id.clone(), (file.clone(), 0));
        Ok(file)
    }

    async fn get_file(&self, id: &FileId) -> Result<FileObject> {
        self.record("get_file");
        let mut state = self.state.lock().unwrap();
        let script = state.file_script.clone();
        let (file, polls) = state
            .files
            .get_mut(id)
            .ok_or_else(|| not_found("file", id.as_str()))?;

        file.status = script
            .get(*polls)
            .or_else(|| script.last())
            .copied()
            .unwrap_or(FileStatus::Processed);
        if file.status == FileStatus::Error {
            file.status_details = Some("unsupported file format".to_string());
        }
        *polls += 1;
        Ok(file.clone())
    }

    async fn attach_file(&self, assistant_id: &AssistantId, file_id: &FileId) -> Result<()> {
        self.record("attach_file");
        let mut state = self.state.lock().unwrap();
        if state.fail_attach {
            return Err(AssistantError::remote(400, r#"{"error": {"message": "Invalid file"}}"#));
        }
        state.attached.push((assistant_id.clone(), file_id.clone()));
        Ok(())
    }
}

/// Chat client that answers from a fixed list and records every request
#[derive(Clone, Default)]
pub struct FakeChatClient {
    replies: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl FakeChatClient {
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        let content = self.replies.lock().unwrap().pop();
        match content {
            Some(content) => Ok(ChatResponse {
                content: Some(content),
                usage: None,
                finish_reason: Some("stop".to_string()),
            }),
            None => Err(AssistantError::remote(429, "rate limited")),
        }
    }
}
