//! Prompt strategies, one per message kind that warrants a briefing.
//!
//! All three share the country catalogue and the admin-context section; they differ only
//! in how the message is framed and what the model is asked to add.

use enum_dispatch::enum_dispatch;

use crate::classifier::ClassificationLabel;
use crate::country::{CountrySnapshot, format_thousands};
use crate::error::AnalyzerError;

pub const PREAMBLE: &str = "Ты помощник администратора многопользовательской стратегической игры.";
pub const CONTEXT_HEADER: &str = "КОНТЕКСТ: Предыдущее сообщение от администратора к этому игроку:";
pub const SUCCESS_PROBABILITY: &str = "ВЕРОЯТНОСТЬ УСПЕХА";
pub const COMPLETION_TIME: &str = "СРОК ИСПОЛНЕНИЯ";
pub const FACTUAL_ANSWER: &str = "дать точный ответ на вопрос игрока";

/// Labels that lead to a briefing. `Other` has no counterpart, so a briefing for it cannot
/// be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisKind {
    Question,
    Order,
    Project,
}

impl TryFrom<ClassificationLabel> for AnalysisKind {
    type Error = AnalyzerError;

    fn try_from(label: ClassificationLabel) -> Result<Self, AnalyzerError> {
        match label {
            ClassificationLabel::Question => Ok(AnalysisKind::Question),
            ClassificationLabel::Order => Ok(AnalysisKind::Order),
            ClassificationLabel::Project => Ok(AnalysisKind::Project),
            ClassificationLabel::Other => Err(AnalyzerError::UnsupportedLabel(label)),
        }
    }
}

impl From<AnalysisKind> for ClassificationLabel {
    fn from(kind: AnalysisKind) -> Self {
        match kind {
            AnalysisKind::Question => ClassificationLabel::Question,
            AnalysisKind::Order => ClassificationLabel::Order,
            AnalysisKind::Project => ClassificationLabel::Project,
        }
    }
}

#[enum_dispatch]
pub trait AnalysisPrompt {
    fn kind(&self) -> AnalysisKind;

    fn create_analysis_prompt(&self, message: &str, previous_admin_message: Option<&str>) -> String;
}

// Countries and sender shared by every strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzerBase {
    pub countries: Vec<CountrySnapshot>,
    pub sender_country: String,
}

impl AnalyzerBase {
    pub fn new(countries: Vec<CountrySnapshot>, sender_country: impl Into<String>) -> Self {
        Self {
            countries,
            sender_country: sender_country.into(),
        }
    }

    pub fn format_countries_info(&self) -> String {
        format_countries_info(&self.countries)
    }

    /// Everything before the kind-specific task list.
    fn header(&self, framing: &str, message: &str, previous_admin_message: Option<&str>) -> String {
        format!(
            "{PREAMBLE}\n{}\nИгрок из страны \"{}\" {framing}:\n\"{message}\"\n\nДоступные страны в игре:\n{}",
            format_context_section(previous_admin_message),
            self.sender_country,
            self.format_countries_info(),
        )
    }
}

pub fn format_countries_info(countries: &[CountrySnapshot]) -> String {
    let mut info = String::new();
    for country in countries {
        let synonyms = if country.synonyms.is_empty() {
            String::new()
        } else {
            format!(" (синонимы: {})", country.synonyms.join(", "))
        };
        info.push_str(&format!(
            "\n{}{synonyms}\nСтолица: {}\nНаселение: {}\nАспекты (1-10):\n{}",
            country.name,
            country.capital,
            format_thousands(country.population),
            country.aspect_lines(),
        ));
    }
    info
}

/// Quotes the latest admin message to the player, or nothing when there was none.
pub fn format_context_section(previous_admin_message: Option<&str>) -> String {
    match previous_admin_message {
        Some(text) if !text.is_empty() => format!(
            "\n{CONTEXT_HEADER}\n\"{text}\"\n\nТекущее сообщение игрока может быть ответом на это сообщение администратора.\n"
        ),
        _ => String::new(),
    }
}

fn context_note(previous_admin_message: Option<&str>) -> &'static str {
    match previous_admin_message {
        Some(text) if !text.is_empty() => " (учитывая контекст предыдущих сообщений)",
        _ => "",
    }
}

const MILITARY_COMPARISON: &str = "Если в {subject} упоминаются военные действия, обязательно сравни военную мощь всех задействованных стран.";
const CLOSING: &str = "Отвечай на русском языке. Будь кратким и информативным.";

fn military_comparison(subject: &str) -> String {
    MILITARY_COMPARISON.replace("{subject}", subject)
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuestionAnalyzer(pub AnalyzerBase);

impl AnalysisPrompt for QuestionAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Question
    }

    fn create_analysis_prompt(&self, message: &str, previous_admin_message: Option<&str>) -> String {
        format!(
            "{}
Твоя задача:
1. Проанализировать вопрос игрока{}
2. Определить, какие страны упоминаются или подразумеваются в вопросе (включая синонимы)
3. Предоставить администратору краткую справку по релевантным странам

Создай краткую справку для администратора, которая поможет ему {FACTUAL_ANSWER}. Сосредоточься на:
- релевантных аспектах упомянутых стран в контексте вопроса
- фактических данных, которые помогут ответить на вопрос

{CLOSING}",
            self.0.header("задал ВОПРОС", message, previous_admin_message),
            context_note(previous_admin_message),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderAnalyzer(pub AnalyzerBase);

impl AnalysisPrompt for OrderAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Order
    }

    fn create_analysis_prompt(&self, message: &str, previous_admin_message: Option<&str>) -> String {
        format!(
            "{}
Твоя задача:
1. Проанализировать приказ игрока{}
2. Определить, какие страны упоминаются или подразумеваются в приказе (включая синонимы)
3. Оценить {SUCCESS_PROBABILITY} приказа (от 0 до 100%)
4. Предоставить администратору краткую справку по релевантным странам

Создай краткую справку для администратора, которая поможет ему принять правильное решение по приказу. Обязательно включи:
- релевантные аспекты упомянутых стран в контексте приказа
- {SUCCESS_PROBABILITY} (0-100%) с обоснованием
- ключевые факторы, влияющие на успех приказа

{}

{CLOSING}",
            self.0.header("отдал ПРИКАЗ", message, previous_admin_message),
            context_note(previous_admin_message),
            military_comparison("приказе"),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectAnalyzer(pub AnalyzerBase);

impl AnalysisPrompt for ProjectAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Project
    }

    fn create_analysis_prompt(&self, message: &str, previous_admin_message: Option<&str>) -> String {
        format!(
            "{}
Твоя задача:
1. Проанализировать проект игрока{}
2. Определить, какие страны упоминаются или подразумеваются в проекте (включая синонимы)
3. Оценить {COMPLETION_TIME} проекта (в годах)
4. Предоставить администратору краткую справку по релевантным странам

Создай краткую справку для администратора, которая поможет ему принять правильное решение по проекту. Обязательно включи:
- релевантные аспекты упомянутых стран в контексте проекта
- {COMPLETION_TIME} (в годах) с обоснованием
- ключевые факторы, влияющие на реализацию проекта
- необходимые ресурсы и условия

{}

{CLOSING}",
            self.0.header("предложил ПРОЕКТ", message, previous_admin_message),
            context_note(previous_admin_message),
            military_comparison("проекте"),
        )
    }
}

#[enum_dispatch(AnalysisPrompt)]
#[derive(Clone, Debug, PartialEq)]
pub enum Analyzer {
    QuestionAnalyzer,
    OrderAnalyzer,
    ProjectAnalyzer,
}

impl Analyzer {
    pub fn for_kind(
        kind: AnalysisKind,
        countries: Vec<CountrySnapshot>,
        sender_country: impl Into<String>,
    ) -> Self {
        let base = AnalyzerBase::new(countries, sender_country);
        match kind {
            AnalysisKind::Question => QuestionAnalyzer(base).into(),
            AnalysisKind::Order => OrderAnalyzer(base).into(),
            AnalysisKind::Project => ProjectAnalyzer(base).into(),
        }
    }
}

/// Picks the strategy for a classified label; `Other` is refused.
pub fn create_analyzer(
    label: ClassificationLabel,
    countries: Vec<CountrySnapshot>,
    sender_country: impl Into<String>,
) -> Result<Analyzer, AnalyzerError> {
    let kind = AnalysisKind::try_from(label)?;
    Ok(Analyzer::for_kind(kind, countries, sender_country))
}
