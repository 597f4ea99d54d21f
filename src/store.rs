//! Read access to the game database.
//!
//! The briefing pipeline only ever reads through [`GameStore`]. [`SqliteStore`] also carries
//! the two inserts the demo data and the tests need; everything else about the game
//! database belongs to the game engine.

use chrono::{DateTime, SecondsFormat, Utc};
use std::future::Future;
use std::path::Path;
use strum::IntoEnumIterator;
use tokio_rusqlite::Connection;
use tokio_rusqlite::types::Value;

use crate::country::{ASPECT_COUNT, Aspect, AspectValue, Aspects, CountryRecord, DEFAULT_ASPECT_VALUE};
use crate::error::StoreError;

// A stored player or admin message.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageRecord {
    pub id: i64,
    pub player_id: i64,
    pub game_id: i64,
    pub content: String,
    pub is_admin_reply: bool,
    pub created_at: DateTime<Utc>,
}

pub trait GameStore: Send + Sync {
    /// All countries of a game, in storage order.
    fn countries_for_game(
        &self,
        game_id: i64,
    ) -> impl Future<Output = Result<Vec<CountryRecord>, StoreError>> + Send;

    /// The most recent admin-authored message addressed to `player_id` in `game_id`,
    /// newest by creation time with ties broken by the highest id.
    fn latest_admin_message(
        &self,
        player_id: i64,
        game_id: i64,
    ) -> impl Future<Output = Result<Option<MessageRecord>, StoreError>> + Send;
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewCountry {
    pub game_id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub population: Option<i64>,
    pub synonyms: Vec<String>,
    pub aspects: Aspects,
}

impl NewCountry {
    pub fn new(game_id: i64, name: impl Into<String>) -> Self {
        NewCountry {
            game_id,
            name: name.into(),
            capital: None,
            population: None,
            synonyms: Vec::new(),
            aspects: Aspects::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMessage {
    pub player_id: i64,
    pub game_id: i64,
    pub content: String,
    pub is_admin_reply: bool,
    pub created_at: DateTime<Utc>,
}

struct RawCountry {
    id: i64,
    game_id: i64,
    name: String,
    capital: Option<String>,
    population: Option<i64>,
    synonyms: String,
    aspects: Vec<(i64, Option<String>)>,
}

struct RawMessage {
    id: i64,
    player_id: i64,
    game_id: i64,
    content: String,
    is_admin_reply: bool,
    created_at: String,
}

fn aspect_column_list() -> String {
    Aspect::iter()
        .map(|a| format!("{0}, {0}_description", a.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn schema() -> String {
    let aspect_columns = Aspect::iter()
        .map(|a| {
            format!(
                "    {0} INTEGER NOT NULL DEFAULT {DEFAULT_ASPECT_VALUE},\n    {0}_description TEXT",
                a.as_ref()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE TABLE IF NOT EXISTS countries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    capital TEXT,
    population INTEGER,
    synonyms TEXT NOT NULL DEFAULT '[]',
{aspect_columns}
);
CREATE INDEX IF NOT EXISTS idx_countries_game ON countries(game_id);
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL,
    game_id INTEGER NOT NULL,
    content TEXT NOT NULL,
    is_admin_reply INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_player_game
    ON messages(player_id, game_id, is_admin_reply, created_at);"
    )
}

// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn encode_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::Timestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl TryFrom<RawCountry> for CountryRecord {
    type Error = StoreError;

    fn try_from(raw: RawCountry) -> Result<Self, StoreError> {
        let synonyms: Vec<String> = serde_json::from_str(&raw.synonyms)?;
        let mut aspects = Aspects::default();
        for (aspect, (value, description)) in Aspect::iter().zip(raw.aspects) {
            aspects[aspect] = AspectValue { value, description };
        }
        Ok(CountryRecord {
            id: raw.id,
            game_id: raw.game_id,
            name: raw.name,
            capital: raw.capital,
            population: raw.population,
            synonyms,
            aspects,
        })
    }
}

impl TryFrom<RawMessage> for MessageRecord {
    type Error = StoreError;

    fn try_from(raw: RawMessage) -> Result<Self, StoreError> {
        Ok(MessageRecord {
            id: raw.id,
            player_id: raw.player_id,
            game_id: raw.game_id,
            content: raw.content,
            is_admin_reply: raw.is_admin_reply,
            created_at: decode_timestamp(&raw.created_at)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .await
            .map_err(tokio_rusqlite::Error::from)?;
        Self::with_connection(conn).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(tokio_rusqlite::Error::from)?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let ddl = schema();
        conn.call(move |conn| {
            conn.execute_batch(&ddl)?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    pub async fn insert_country(&self, country: NewCountry) -> Result<i64, StoreError> {
        let synonyms = serde_json::to_string(&country.synonyms)?;
        let mut values = vec![
            Value::Integer(country.game_id),
            Value::Text(country.name),
            country.capital.map_or(Value::Null, Value::Text),
            country.population.map_or(Value::Null, Value::Integer),
            Value::Text(synonyms),
        ];
        for (_, aspect) in country.aspects.iter() {
            values.push(Value::Integer(aspect.value));
            values.push(aspect.description.clone().map_or(Value::Null, Value::Text));
        }

        // One placeholder per bound value.
        let placeholders = (1..=values.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO countries (game_id, name, capital, population, synonyms, {}) VALUES ({placeholders})",
            aspect_column_list()
        );

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(&sql, tokio_rusqlite::params_from_iter(values))?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn insert_message(&self, message: NewMessage) -> Result<i64, StoreError> {
        let created_at = encode_timestamp(&message.created_at);
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO messages (player_id, game_id, content, is_admin_reply, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    (
                        message.player_id,
                        message.game_id,
                        message.content,
                        message.is_admin_reply,
                        created_at,
                    ),
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }
}

impl GameStore for SqliteStore {
    async fn countries_for_game(&self, game_id: i64) -> Result<Vec<CountryRecord>, StoreError> {
        let sql = format!(
            "SELECT id, game_id, name, capital, population, synonyms, {} FROM countries WHERE game_id = ?1 ORDER BY id",
            aspect_column_list()
        );

        let raws = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([game_id], |row| {
                        let mut aspects = Vec::with_capacity(ASPECT_COUNT);
                        for i in 0..ASPECT_COUNT {
                            aspects.push((row.get(6 + 2 * i)?, row.get(7 + 2 * i)?));
                        }
                        Ok(RawCountry {
                            id: row.get(0)?,
                            game_id: row.get(1)?,
                            name: row.get(2)?,
                            capital: row.get(3)?,
                            population: row.get(4)?,
                            synonyms: row.get(5)?,
                            aspects,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        raws.into_iter().map(CountryRecord::try_from).collect()
    }

    async fn latest_admin_message(
        &self,
        player_id: i64,
        game_id: i64,
    ) -> Result<Option<MessageRecord>, StoreError> {
        let raw = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, player_id, game_id, content, is_admin_reply, created_at
                     FROM messages
                     WHERE player_id = ?1 AND game_id = ?2 AND is_admin_reply = 1
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1",
                )?;
                let mut rows = stmt.query_map([player_id, game_id], |row| {
                    Ok(RawMessage {
                        id: row.get(0)?,
                        player_id: row.get(1)?,
                        game_id: row.get(2)?,
                        content: row.get(3)?,
                        is_admin_reply: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?;
                let first = rows.next().transpose()?;
                Ok(first)
            })
            .await?;

        raw.map(MessageRecord::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_sort_lexically() {
        let earlier = DateTime::parse_from_rfc3339("2026-01-01T09:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2026-01-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(encode_timestamp(&earlier) < encode_timestamp(&later));
        assert_eq!(decode_timestamp(&encode_timestamp(&later)).unwrap(), later);
    }

    #[test]
    fn bad_timestamp_is_reported() {
        assert!(matches!(
            decode_timestamp("yesterday"),
            Err(StoreError::Timestamp { .. })
        ));
    }

    #[tokio::test]
    async fn insert_country_binds_every_column() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let country = NewCountry {
            capital: Some("Testville".to_string()),
            population: Some(1_000),
            synonyms: vec!["TL".to_string()],
            aspects: Aspects::default().with(Aspect::Intelligence, 9, Some("spies")),
            ..NewCountry::new(1, "Testland")
        };
        let id = store.insert_country(country.clone()).await.unwrap();

        let stored = store.countries_for_game(1).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].aspects, country.aspects);
        assert_eq!(stored[0].synonyms, country.synonyms);
    }

    #[test]
    fn schema_has_a_column_pair_per_aspect() {
        let ddl = schema();
        for aspect in Aspect::iter() {
            assert!(ddl.contains(&format!("{}_description TEXT", aspect.as_ref())));
        }
    }
}
