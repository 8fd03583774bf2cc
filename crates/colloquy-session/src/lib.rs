pub mod cache;
pub mod ephemeral;
pub mod exchange;
pub mod ingest;
pub mod poll;
pub mod registry;
pub mod session;
pub mod templates;
pub mod thread;

pub use cache::{CacheEntry, ConversationCache, DEFAULT_CACHE_WINDOW};
pub use ephemeral::EphemeralTaskRunner;
pub use exchange::MessageExchange;
pub use ingest::{FileIngestionPipeline, IngestionReport, IngestionStage};
pub use poll::{PollPolicy, MIN_INTERVAL};
pub use registry::AssistantRegistry;
pub use session::{AssistantMode, ChatMode, ConversationMode, Session, SessionOptions};
pub use thread::ThreadSession;

pub use colloquy_llm::{AssistantError, Result};
