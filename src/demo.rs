//! Demo game data: three countries and a few player messages to brief on.

use strum::IntoEnumIterator;

use crate::country::{Aspect, Aspects, CountrySnapshot};
use crate::error::StoreError;
use crate::store::{NewCountry, SqliteStore};

pub const DEMO_GAME_ID: i64 = 1;
pub const DEMO_SETTING: &str = "Фэнтези";

/// (sender country, message)
pub const DEMO_MESSAGES: [(&str, &str); 4] = [
    ("Солярия", "Хочу напасть на Вирджинию и Абобистан"),
    ("Вирджиния", "Предлагаю торговое соглашение с СИ"),
    ("Абобистан", "Нужна помощь в развитии технологий"),
    ("Абобистан", "Солнечная Империя угрожает нашим границам"),
];

fn demo_country(
    game_id: i64,
    name: &str,
    capital: &str,
    population: i64,
    synonyms: [&str; 2],
    values: [i64; 10],
) -> NewCountry {
    let mut aspects = Aspects::default();
    for (aspect, value) in Aspect::iter().zip(values) {
        aspects[aspect].value = value;
    }
    NewCountry {
        capital: Some(capital.to_string()),
        population: Some(population),
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        aspects,
        ..NewCountry::new(game_id, name)
    }
}

pub fn demo_countries(game_id: i64) -> Vec<NewCountry> {
    vec![
        demo_country(
            game_id,
            "Солярия",
            "Солнечный Город",
            5_000_000,
            ["Солнечная Империя", "СИ"],
            [7, 8, 6, 7, 9, 5, 8, 7, 6, 7],
        ),
        demo_country(
            game_id,
            "Вирджиния",
            "Ричмонд",
            3_000_000,
            ["Вирг", "ВР"],
            [6, 5, 7, 6, 6, 8, 7, 6, 7, 5],
        ),
        demo_country(
            game_id,
            "Абобистан",
            "Абобград",
            2_000_000,
            ["Абоба", "АБ"],
            [4, 3, 5, 5, 4, 6, 4, 3, 5, 4],
        ),
    ]
}

/// Inserts the demo countries and returns their ids.
pub async fn seed_demo(store: &SqliteStore, game_id: i64) -> Result<Vec<i64>, StoreError> {
    let mut ids = Vec::new();
    for country in demo_countries(game_id) {
        log::info!("Seeding demo country {}", country.name);
        ids.push(store.insert_country(country).await?);
    }
    Ok(ids)
}

/// One line per country whose name or synonym occurs in `message`, with its military and
/// economy scores. Shown when no briefing could be generated.
pub fn mentioned_countries_summary(countries: &[CountrySnapshot], message: &str) -> Vec<String> {
    let message = message.to_lowercase();
    countries
        .iter()
        .filter(|c| {
            message.contains(&c.name.to_lowercase())
                || c.synonyms.iter().any(|s| message.contains(&s.to_lowercase()))
        })
        .map(|c| {
            format!(
                "{}: {} {}/10, {} {}/10",
                c.name,
                Aspect::Military.label(),
                c.aspects[Aspect::Military].value,
                Aspect::Economy.label(),
                c.aspects[Aspect::Economy].value,
            )
        })
        .collect()
}
