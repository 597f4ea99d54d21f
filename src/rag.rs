//! Admin briefings for incoming player messages.
//!
//! [`RagSystem::generate_admin_context`] is the entry point the chat layer calls for every
//! player message. It retrieves the game's countries and the latest admin message to the
//! player, classifies the message and, for questions, orders and projects, asks the model
//! for a short briefing. The pipeline is total: every failure ends in an empty briefing.

use crate::analyzers::{AnalysisKind, AnalysisPrompt, Analyzer};
use crate::classifier::{ClassificationLabel, MessageClassifier};
use crate::country::build_country_snapshots;
use crate::error::StoreError;
use crate::llm::{CallOptions, CompletionProvider};
use crate::store::GameStore;

/// Outcome of one pipeline run. `label` is `None` when the run stopped before
/// classification; `briefing` is empty whenever no briefing was produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageAnalysis {
    pub label: Option<ClassificationLabel>,
    pub briefing: String,
}

impl MessageAnalysis {
    fn skipped() -> Self {
        Self::default()
    }

    fn labelled(label: ClassificationLabel) -> Self {
        MessageAnalysis {
            label: Some(label),
            briefing: String::new(),
        }
    }

    pub fn has_briefing(&self) -> bool {
        !self.briefing.is_empty()
    }
}

pub struct RagSystem<S, P> {
    store: S,
    provider: Option<P>,
    classifier: MessageClassifier<P>,
    options: CallOptions,
}

impl<S, P> RagSystem<S, P>
where
    S: GameStore,
    P: CompletionProvider + Clone,
{
    /// `provider` is `None` when no API key is configured; the system then never briefs.
    pub fn new(store: S, provider: Option<P>) -> Self {
        Self {
            store,
            classifier: MessageClassifier::new(provider.clone()),
            provider,
            options: CallOptions::default(),
        }
    }

    pub fn with_generation_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_classification_options(mut self, options: CallOptions) -> Self {
        self.classifier = self.classifier.with_options(options);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn classifier(&self) -> &MessageClassifier<P> {
        &self.classifier
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Content of the most recent admin message sent to the player in this game.
    pub async fn previous_admin_message(
        &self,
        player_id: i64,
        game_id: i64,
    ) -> Result<Option<String>, StoreError> {
        let message = self.store.latest_admin_message(player_id, game_id).await?;
        Ok(message.map(|m| m.content))
    }

    pub async fn generate_admin_context(
        &self,
        message: &str,
        sender_country: &str,
        game_id: i64,
        player_id: i64,
    ) -> String {
        self.analyze_message(message, sender_country, game_id, player_id)
            .await
            .briefing
    }

    pub async fn analyze_message(
        &self,
        message: &str,
        sender_country: &str,
        game_id: i64,
        player_id: i64,
    ) -> MessageAnalysis {
        let Some(provider) = &self.provider else {
            return MessageAnalysis::skipped();
        };

        let countries = match build_country_snapshots(&self.store, game_id).await {
            Ok(countries) => countries,
            Err(e) => {
                log::error!("Failed to load countries for game {game_id}: {e}");
                return MessageAnalysis::skipped();
            }
        };
        if countries.is_empty() {
            log::debug!("Game {game_id} has no countries, skipping briefing");
            return MessageAnalysis::skipped();
        }

        let previous = match self.previous_admin_message(player_id, game_id).await {
            Ok(previous) => previous,
            Err(e) => {
                log::error!("Failed to load admin context for player {player_id}: {e}");
                return MessageAnalysis::skipped();
            }
        };

        log::debug!(
            "Admin context for player {player_id}: {}",
            if previous.is_some() { "found" } else { "none" }
        );

        let label = self.classifier.classify_message(message, sender_country).await;
        log::debug!("Message from {sender_country} classified as {label}");
        let Ok(kind) = AnalysisKind::try_from(label) else {
            return MessageAnalysis::labelled(label);
        };

        let analyzer = Analyzer::for_kind(kind, countries, sender_country);
        let prompt = analyzer.create_analysis_prompt(message, previous.as_deref());

        match provider.complete(&prompt, &self.options).await {
            Ok(briefing) => MessageAnalysis {
                label: Some(label),
                briefing,
            },
            Err(e) => {
                log::error!("Error calling AI API: {e}");
                MessageAnalysis::labelled(label)
            }
        }
    }
}
