use std::ops::{Index, IndexMut};

use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::StoreError;
use crate::store::GameStore;

pub const ASPECT_COUNT: usize = 10;
pub const DEFAULT_ASPECT_VALUE: i64 = 5;
pub const CAPITAL_NOT_SPECIFIED: &str = "Не указана";

// The ten scored dimensions of a country, in catalogue order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Aspect {
    Economy,
    Military,
    ForeignPolicy,
    Territory,
    Technology,
    ReligionCulture,
    GovernanceLaw,
    ConstructionInfrastructure,
    SocialRelations,
    Intelligence,
}

impl Aspect {
    /// Name shown to the model and to players.
    pub fn label(self) -> &'static str {
        match self {
            Aspect::Economy => "Экономика",
            Aspect::Military => "Военное дело",
            Aspect::ForeignPolicy => "Внешняя политика",
            Aspect::Territory => "Территория",
            Aspect::Technology => "Технологии",
            Aspect::ReligionCulture => "Религия и культура",
            Aspect::GovernanceLaw => "Управление и право",
            Aspect::ConstructionInfrastructure => "Строительство и инфраструктура",
            Aspect::SocialRelations => "Общественные отношения",
            Aspect::Intelligence => "Разведка",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AspectValue {
    pub value: i64,
    pub description: Option<String>,
}

impl Default for AspectValue {
    fn default() -> Self {
        AspectValue {
            value: DEFAULT_ASPECT_VALUE,
            description: None,
        }
    }
}

/// Exactly one value per [`Aspect`]; the fixed array makes a missing aspect unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Aspects([AspectValue; ASPECT_COUNT]);

impl Aspects {
    pub fn uniform(value: i64) -> Self {
        let mut aspects = Self::default();
        for aspect in Aspect::iter() {
            aspects[aspect].value = value;
        }
        aspects
    }

    pub fn with(mut self, aspect: Aspect, value: i64, description: Option<&str>) -> Self {
        self[aspect] = AspectValue {
            value,
            description: description.map(str::to_string),
        };
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Aspect, &AspectValue)> {
        Aspect::iter().map(move |aspect| (aspect, &self[aspect]))
    }
}

impl Index<Aspect> for Aspects {
    type Output = AspectValue;

    fn index(&self, aspect: Aspect) -> &AspectValue {
        &self.0[aspect.index()]
    }
}

impl IndexMut<Aspect> for Aspects {
    fn index_mut(&mut self, aspect: Aspect) -> &mut AspectValue {
        &mut self.0[aspect.index()]
    }
}

// A country row as the game database holds it.
#[derive(Clone, Debug, PartialEq)]
pub struct CountryRecord {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub population: Option<i64>,
    pub synonyms: Vec<String>,
    pub aspects: Aspects,
}

/// Read-only view of one country, rebuilt for every classification or briefing.
#[derive(Clone, Debug, PartialEq)]
pub struct CountrySnapshot {
    pub name: String,
    pub capital: String,
    pub population: i64,
    pub synonyms: Vec<String>,
    pub aspects: Aspects,
}

impl From<CountryRecord> for CountrySnapshot {
    fn from(record: CountryRecord) -> Self {
        CountrySnapshot {
            name: record.name,
            capital: record
                .capital
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| CAPITAL_NOT_SPECIFIED.to_string()),
            population: record.population.unwrap_or(0),
            synonyms: record.synonyms,
            aspects: record.aspects,
        }
    }
}

impl CountrySnapshot {
    /// True when `query` equals the name or one of the synonyms, ignoring case.
    pub fn matches_name(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        self.name.to_lowercase() == query
            || self.synonyms.iter().any(|s| s.to_lowercase() == query)
    }

    /// `"- Экономика: 7 - stable trade"`, one line per aspect; the description suffix is
    /// dropped when absent.
    pub fn aspect_lines(&self) -> String {
        let mut lines = String::new();
        for (aspect, value) in self.aspects.iter() {
            lines.push_str(&format_aspect_line(aspect, value));
            lines.push('\n');
        }
        lines
    }
}

pub fn format_aspect_line(aspect: Aspect, value: &AspectValue) -> String {
    match value.description.as_deref().filter(|d| !d.is_empty()) {
        Some(description) => format!("- {}: {} - {}", aspect.label(), value.value, description),
        None => format!("- {}: {}", aspect.label(), value.value),
    }
}

/// Groups digits in threes with commas: `5000000` becomes `5,000,000`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Reads every country of a game and reshapes it into snapshots. Storage errors propagate.
pub async fn build_country_snapshots<S: GameStore>(
    store: &S,
    game_id: i64,
) -> Result<Vec<CountrySnapshot>, StoreError> {
    let records = store.countries_for_game(game_id).await?;
    log::debug!("Loaded {} countries for game {game_id}", records.len());
    Ok(records.into_iter().map(CountrySnapshot::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record() -> CountryRecord {
        CountryRecord {
            id: 1,
            game_id: 1,
            name: "Солярия".to_string(),
            capital: None,
            population: None,
            synonyms: vec!["СИ".to_string()],
            aspects: Aspects::default(),
        }
    }

    #[test]
    fn aspect_keys_are_snake_case_and_ordered() {
        let keys: Vec<String> = Aspect::iter().map(|a| a.to_string()).collect();
        assert_eq!(
            keys,
            [
                "economy",
                "military",
                "foreign_policy",
                "territory",
                "technology",
                "religion_culture",
                "governance_law",
                "construction_infrastructure",
                "social_relations",
                "intelligence",
            ]
        );
        assert_eq!(Aspect::from_str("foreign_policy").unwrap(), Aspect::ForeignPolicy);
    }

    #[test]
    fn snapshot_substitutes_sentinels() {
        let snapshot = CountrySnapshot::from(record());
        assert_eq!(snapshot.capital, CAPITAL_NOT_SPECIFIED);
        assert_eq!(snapshot.population, 0);
    }

    #[test]
    fn snapshot_keeps_out_of_range_values() {
        let mut rec = record();
        rec.aspects = Aspects::default().with(Aspect::Military, 42, None);
        let snapshot = CountrySnapshot::from(rec);
        assert!(snapshot.aspect_lines().contains("- Военное дело: 42\n"));
    }

    #[test]
    fn aspect_line_omits_missing_description() {
        let plain = AspectValue {
            value: 7,
            description: None,
        };
        assert_eq!(format_aspect_line(Aspect::Economy, &plain), "- Экономика: 7");

        let described = AspectValue {
            value: 7,
            description: Some("stable trade".to_string()),
        };
        assert_eq!(
            format_aspect_line(Aspect::Economy, &described),
            "- Экономика: 7 - stable trade"
        );
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(5_000_000), "5,000,000");
        assert_eq!(format_thousands(12_345_678), "12,345,678");
        assert_eq!(format_thousands(-1_234), "-1,234");
        assert_eq!(format_thousands(-999), "-999");
    }

    #[test]
    fn snapshot_passes_negative_population_through() {
        let mut rec = record();
        rec.population = Some(-1_500);
        let snapshot = CountrySnapshot::from(rec);
        assert_eq!(snapshot.population, -1_500);
        assert_eq!(format_thousands(snapshot.population), "-1,500");
    }

    #[test]
    fn name_matching_covers_synonyms() {
        let snapshot = CountrySnapshot::from(record());
        assert!(snapshot.matches_name("солярия"));
        assert!(snapshot.matches_name(" си "));
        assert!(!snapshot.matches_name("Вирджиния"));
    }
}
