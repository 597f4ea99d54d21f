use chrono::{Duration, TimeZone, Utc};

use wpg_engine::country::{Aspect, Aspects, CAPITAL_NOT_SPECIFIED, build_country_snapshots};
use wpg_engine::store::{NewCountry, NewMessage};
use wpg_engine::{GameStore, SqliteStore};

fn message(player_id: i64, content: &str, is_admin_reply: bool, minutes: i64) -> NewMessage {
    NewMessage {
        player_id,
        game_id: 1,
        content: content.to_string(),
        is_admin_reply,
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes),
    }
}

#[tokio::test]
async fn countries_round_trip_with_aspects_and_synonyms() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let mut solaria = NewCountry::new(1, "Солярия");
    solaria.capital = Some("Солнечный Город".to_string());
    solaria.population = Some(5_000_000);
    solaria.synonyms = vec!["СИ".to_string(), "Солнечная Империя".to_string()];
    solaria.aspects = Aspects::uniform(6)
        .with(Aspect::Economy, 7, Some("stable trade"))
        .with(Aspect::Intelligence, 2, None);
    let id = store.insert_country(solaria.clone()).await.unwrap();
    store.insert_country(NewCountry::new(2, "Elsewhere")).await.unwrap();

    let countries = store.countries_for_game(1).await.unwrap();
    assert_eq!(countries.len(), 1);
    let country = &countries[0];
    assert_eq!(country.id, id);
    assert_eq!(country.name, "Солярия");
    assert_eq!(country.capital.as_deref(), Some("Солнечный Город"));
    assert_eq!(country.population, Some(5_000_000));
    assert_eq!(country.synonyms, solaria.synonyms);
    assert_eq!(country.aspects, solaria.aspects);
}

#[tokio::test]
async fn snapshots_keep_storage_order_and_sentinels() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    for name in ["Бета", "Альфа", "Гамма"] {
        store.insert_country(NewCountry::new(1, name)).await.unwrap();
    }

    let snapshots = build_country_snapshots(&store, 1).await.unwrap();
    let names: Vec<_> = snapshots.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Бета", "Альфа", "Гамма"]);
    assert!(snapshots.iter().all(|c| c.capital == CAPITAL_NOT_SPECIFIED));
    assert!(snapshots.iter().all(|c| c.population == 0));
    assert!(snapshots[0].aspect_lines().contains("- Экономика: 5\n"));

    assert!(build_country_snapshots(&store, 99).await.unwrap().is_empty());
}

#[tokio::test]
async fn latest_admin_message_orders_by_time_then_id() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    assert!(store.latest_admin_message(5, 1).await.unwrap().is_none());

    store.insert_message(message(5, "older", true, 0)).await.unwrap();
    store.insert_message(message(5, "tie first", true, 10)).await.unwrap();
    let tie_second = store.insert_message(message(5, "tie second", true, 10)).await.unwrap();
    store.insert_message(message(5, "player text", false, 20)).await.unwrap();

    let latest = store.latest_admin_message(5, 1).await.unwrap().unwrap();
    assert_eq!(latest.id, tie_second);
    assert_eq!(latest.content, "tie second");
    assert!(latest.is_admin_reply);

    assert!(store.latest_admin_message(6, 1).await.unwrap().is_none());
    assert!(store.latest_admin_message(5, 2).await.unwrap().is_none());
}

#[tokio::test]
async fn file_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.db");

    {
        let store = SqliteStore::open(&path).await.unwrap();
        store.insert_country(NewCountry::new(1, "Testland")).await.unwrap();
    }

    let store = SqliteStore::open(&path).await.unwrap();
    let countries = store.countries_for_game(1).await.unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].name, "Testland");
}
