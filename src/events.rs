//! Random game events for the admin to hand out.
//!
//! Each event gets a tone drawn from [`EVENT_TONES`] and is either scoped to one country
//! (with its full aspect catalogue in the prompt) or global (a short summary of the first
//! few countries).

use rand::Rng;

use crate::country::{Aspect, CountrySnapshot, build_country_snapshots, format_thousands};
use crate::llm::{CallOptions, CompletionProvider};
use crate::store::GameStore;

pub const EVENT_TONES: [&str; 17] = [
    "хорошее",
    "нейтральное",
    "плохое",
    "ужасающее",
    "прекрасное",
    "неожиданное",
    "драматическое",
    "загадочное",
    "радостное",
    "тревожное",
    "удивительное",
    "катастрофическое",
    "благоприятное",
    "странное",
    "героическое",
    "мистическое",
    "абсурдное",
];

pub const NEUTRAL_TONE: &str = "нейтральное";
pub const DEFAULT_SETTING: &str = "Современность";
pub const NO_COUNTRIES_TEXT: &str = "Не удалось получить информацию о странах для генерации события.";
pub const GENERATION_FAILED_TEXT: &str = "Не удалось сгенерировать событие. Попробуйте еще раз.";

// Countries summarised in a global event prompt.
const GLOBAL_EVENT_COUNTRY_LIMIT: usize = 5;

const EVENT_CLOSING: &str =
    "Отвечай на русском языке. НЕ добавляй \"Варианты действий:\" или подобные фразы в конце.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameEvent {
    pub text: String,
    pub tone: String,
}

impl GameEvent {
    fn new(text: impl Into<String>, tone: &str) -> Self {
        GameEvent {
            text: text.into(),
            tone: tone.to_string(),
        }
    }
}

pub fn pick_tone(rng: &mut impl Rng) -> &'static str {
    EVENT_TONES[rng.random_range(0..EVENT_TONES.len())]
}

pub fn country_not_found_text(name: &str) -> String {
    format!("Страна '{name}' не найдена.")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn country_event_prompt(country: &CountrySnapshot, tone: &str, setting: &str) -> String {
    format!(
        "Ты мастер многопользовательской стратегической игры в сеттинге \"{setting}\".

Информация о стране \"{}\":
Столица: {}
Население: {}
Аспекты (1-10):
{}
Создай {tone} короткое игровое событие (2-4 предложения) для этой страны, учитывая:
1. Сеттинг игры
2. Характеристики страны (сильные и слабые стороны)
3. Текущее состояние аспектов
4. Событие должно быть именно {tone} по характеру

Событие должно быть:
- Интересным и вовлекающим
- Соответствующим сеттингу
- Учитывающим особенности страны
- Требующим решения от игрока
- {} по тону и последствиям

{EVENT_CLOSING}",
        country.name,
        country.capital,
        format_thousands(country.population),
        country.aspect_lines(),
        capitalize(tone),
    )
}

pub fn global_event_prompt(countries: &[CountrySnapshot], tone: &str, setting: &str) -> String {
    let mut countries_info = String::new();
    for country in countries.iter().take(GLOBAL_EVENT_COUNTRY_LIMIT) {
        let a = &country.aspects;
        countries_info.push_str(&format!(
            "\n{} (население: {})\n- {}: {}, {}: {}\n- {}: {}, {}: {}",
            country.name,
            format_thousands(country.population),
            Aspect::Economy.label(),
            a[Aspect::Economy].value,
            Aspect::Military.label(),
            a[Aspect::Military].value,
            Aspect::Technology.label(),
            a[Aspect::Technology].value,
            Aspect::ForeignPolicy.label(),
            a[Aspect::ForeignPolicy].value,
        ));
    }

    format!(
        "Ты мастер многопользовательской стратегической игры в сеттинге \"{setting}\".

Основные страны в игре:{countries_info}

Создай {tone} короткое глобальное игровое событие (2-4 предложения), которое затронет все страны мира, учитывая:
1. Сеттинг игры
2. Разнообразие стран и их характеристики
3. Необходимость взаимодействия между странами
4. Событие должно быть именно {tone} по характеру

Событие должно быть:
- Глобальным по масштабу
- Интересным и вовлекающим
- Соответствующим сеттингу
- Требующим координации между странами
- {} по тону и последствиям

{EVENT_CLOSING}",
        capitalize(tone),
    )
}

pub struct EventGenerator<S, P> {
    store: S,
    provider: Option<P>,
    options: CallOptions,
}

impl<S: GameStore, P: CompletionProvider> EventGenerator<S, P> {
    pub fn new(store: S, provider: Option<P>) -> Self {
        Self {
            store,
            provider,
            options: CallOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    /// Generates an event for `country_name` (matched against names and synonyms), or a
    /// global one when no name is given. Never fails; problems come back as fallback text.
    pub async fn generate_event(
        &self,
        game_id: i64,
        country_name: Option<&str>,
        setting: &str,
    ) -> GameEvent {
        let countries = build_country_snapshots(&self.store, game_id)
            .await
            .unwrap_or_else(|e| {
                log::error!("Failed to load countries for game {game_id}: {e}");
                Vec::new()
            });
        if countries.is_empty() {
            return GameEvent::new(NO_COUNTRIES_TEXT, NEUTRAL_TONE);
        }

        let tone = pick_tone(&mut rand::rng());

        let prompt = match country_name {
            Some(name) => match countries.iter().find(|c| c.matches_name(name)) {
                Some(country) => country_event_prompt(country, tone, setting),
                None => return GameEvent::new(country_not_found_text(name), NEUTRAL_TONE),
            },
            None => global_event_prompt(&countries, tone, setting),
        };

        let Some(provider) = &self.provider else {
            return GameEvent::new(GENERATION_FAILED_TEXT, tone);
        };

        log::info!("Generating {tone} event for game {game_id}");
        match provider.complete(&prompt, &self.options).await {
            Ok(text) => GameEvent::new(text, tone),
            Err(e) => {
                log::error!("Error generating event: {e}");
                GameEvent::new(GENERATION_FAILED_TEXT, tone)
            }
        }
    }
}
