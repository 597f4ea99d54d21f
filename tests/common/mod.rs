#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wpg_engine::country::{Aspect, Aspects, CountryRecord};
use wpg_engine::{CallOptions, CompletionProvider, GameStore, LlmError, MessageRecord, StoreError};

/// Replays queued replies in order and records every prompt it was given.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    replies: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    calls: Arc<Mutex<Vec<(String, CallOptions)>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::default(),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> Vec<(String, CallOptions)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(prompt, _)| prompt).collect()
    }
}

impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str, options: &CallOptions) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), options.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::MalformedResponse("no scripted reply".to_string())))
    }
}

/// In-memory store that counts reads and can be told to fail.
#[derive(Clone, Default)]
pub struct FixtureStore {
    pub countries: Vec<CountryRecord>,
    pub admin_message: Option<MessageRecord>,
    pub fail: bool,
    reads: Arc<AtomicUsize>,
}

impl FixtureStore {
    pub fn with_countries(countries: Vec<CountryRecord>) -> Self {
        Self {
            countries,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<(), StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Timestamp {
                value: "broken".to_string(),
                reason: "fixture failure".to_string(),
            });
        }
        Ok(())
    }
}

impl GameStore for FixtureStore {
    async fn countries_for_game(&self, game_id: i64) -> Result<Vec<CountryRecord>, StoreError> {
        self.read()?;
        Ok(self
            .countries
            .iter()
            .filter(|c| c.game_id == game_id)
            .cloned()
            .collect())
    }

    async fn latest_admin_message(
        &self,
        _player_id: i64,
        _game_id: i64,
    ) -> Result<Option<MessageRecord>, StoreError> {
        self.read()?;
        Ok(self.admin_message.clone())
    }
}

pub fn testland(game_id: i64) -> CountryRecord {
    CountryRecord {
        id: 1,
        game_id,
        name: "Testland".to_string(),
        capital: Some("Testville".to_string()),
        population: Some(1_000_000),
        synonyms: vec!["TL".to_string()],
        aspects: Aspects::default().with(Aspect::Economy, 7, Some("stable trade")),
    }
}
