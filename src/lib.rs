pub mod analyzers;
pub mod classifier;
pub mod country;
pub mod demo;
pub mod error;
pub mod events;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod settings;
pub mod store;

// Re-export commonly used items for easier access
pub use analyzers::{AnalysisKind, AnalysisPrompt, Analyzer, create_analyzer};
pub use classifier::{ClassificationLabel, MessageClassifier};
pub use country::{Aspect, AspectValue, Aspects, CountryRecord, CountrySnapshot};
pub use error::{AnalyzerError, AppError, LlmError, SettingsError, StoreError};
pub use events::{EventGenerator, GameEvent};
pub use llm::{CallOptions, CompletionProvider, OpenRouterClient};
pub use rag::{MessageAnalysis, RagSystem};
pub use settings::Settings;
pub use store::{GameStore, MessageRecord, SqliteStore};
