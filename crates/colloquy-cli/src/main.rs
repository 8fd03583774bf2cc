use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use colloquy_cli::{
    config::{Config, ModeKind},
    repl,
};
use colloquy_llm::{AssistantId, AssistantsApi, ChatOptions, OpenAIClient};
use colloquy_session::{
    AssistantMode, AssistantRegistry, ChatMode, ConversationMode, FileIngestionPipeline, Session,
    SessionOptions,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let options = config.session_options();
    let client = Arc::new(OpenAIClient::from_config(config.client_config())?);

    tracing::info!(
        mode = ?config.session.mode,
        base_url = %config.api.base_url,
        "Starting colloquy"
    );

    match config.session.mode {
        ModeKind::Assistant => {
            let api: Arc<dyn AssistantsApi> = client;
            let assistant_id = resolve_assistant(&config, api.clone()).await?;
            ingest_files(&files, api.clone(), &assistant_id, &options).await;

            let mode = AssistantMode::new(api, assistant_id, &options);
            converse(Session::new(mode, options.cache_window), &config).await
        }
        ModeKind::Chat => {
            if !files.is_empty() {
                tracing::warn!(count = files.len(), "File arguments are ignored in chat mode");
            }

            let mut chat_options = ChatOptions::new();
            if let Some(temperature) = config.assistant.temperature {
                chat_options = chat_options.temperature(temperature);
            }
            let mut mode =
                ChatMode::new(client, config.assistant.model.clone()).with_options(chat_options);
            if let Some(instructions) = &config.assistant.instructions {
                mode = mode.with_instructions(instructions.clone());
            }
            converse(Session::new(mode, options.cache_window), &config).await
        }
    }
}

/// Reuse `ASSISTANT_ID` when set, otherwise create one from `[assistant]`
async fn resolve_assistant(
    config: &Config,
    api: Arc<dyn AssistantsApi>,
) -> anyhow::Result<AssistantId> {
    let registry = AssistantRegistry::new(api);

    if let Some(id) = &config.assistant_id {
        let assistant = registry.get(&AssistantId::new(id.as_str())).await?;
        tracing::info!(
            assistant_id = %assistant.id,
            name = assistant.name.as_deref().unwrap_or("<unnamed>"),
            "Using existing assistant"
        );
        return Ok(assistant.id);
    }

    let request = config.assistant_request()?;
    let id = registry.create(&request).await?;
    println!("Created assistant {} (set ASSISTANT_ID to reuse it)", id);
    Ok(id)
}

async fn ingest_files(
    files: &[PathBuf],
    api: Arc<dyn AssistantsApi>,
    assistant_id: &AssistantId,
    options: &SessionOptions,
) {
    if files.is_empty() {
        return;
    }

    let pipeline = FileIngestionPipeline::new(api, options.file_policy.clone());
    for path in files {
        let report = pipeline.ingest(path, Some(assistant_id)).await;
        match (&report.file_id, &report.error) {
            (Some(file_id), None) => println!("Attached {} as {}", path.display(), file_id),
            (_, Some(e)) => eprintln!(
                "Skipped {} at stage {}: error [{}]: {}",
                path.display(),
                report.stage,
                e.kind(),
                e
            ),
            (None, None) => {}
        }
    }
}

async fn converse<M: ConversationMode>(
    mut session: Session<M>,
    config: &Config,
) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    let answered = repl::run(&mut session, stdin, &mut stdout, &config.session.quit).await?;

    tracing::info!(
        mode = session.mode().name(),
        answered,
        cached = session.transcript().len(),
        "Session ended"
    );
    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout belongs to the conversation
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
