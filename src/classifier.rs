use strum_macros::Display;

use crate::llm::{CallOptions, CompletionProvider};

// The four kinds of player message. Anything the model says that is not recognisably one
// of the first three collapses to `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ClassificationLabel {
    Question,
    Order,
    Project,
    Other,
}

impl ClassificationLabel {
    /// The word the model is asked to answer with.
    pub fn russian(self) -> &'static str {
        match self {
            ClassificationLabel::Question => "вопрос",
            ClassificationLabel::Order => "приказ",
            ClassificationLabel::Project => "проект",
            ClassificationLabel::Other => "иное",
        }
    }

    // Checked in this order; the first hit wins.
    const PRIORITY: [ClassificationLabel; 3] = [
        ClassificationLabel::Question,
        ClassificationLabel::Order,
        ClassificationLabel::Project,
    ];

    /// Maps a raw model reply onto a label by case-insensitive substring match, accepting
    /// both the Russian word and its English name.
    pub fn normalize(raw: &str) -> Self {
        let reply = raw.trim().to_lowercase();
        Self::PRIORITY
            .into_iter()
            .find(|label| reply.contains(label.russian()) || reply.contains(&label.to_string()))
            .unwrap_or(ClassificationLabel::Other)
    }
}

pub fn classification_prompt(message: &str, sender_country: &str) -> String {
    format!(
        r#"Определи тип сообщения игрока из страны "{sender_country}":
"{message}"

ТИПЫ СООБЩЕНИЙ:

ВОПРОС - сообщение СОДЕРЖИТ вопрос (даже если есть и другой текст)
Признаки: вопросительный знак, вопросительные слова (что, как, где, когда, почему, сколько, какой, кто)
Примеры: "какой год?", "сколько у нас войск и где они?", "кто напал?"

ПРИКАЗ - игрок дает команду или указание (действие, которое можно выполнить)
Признаки: глаголы в повелительном наклонении, слова действия
Примеры: "атаковать", "построить завод", "отправить войска", "объявить войну", "заключить мир"

ПРОЕКТ - долгосрочный план или масштабное действие (займет год и более)
Признаки: слова о строительстве, развитии, долгих процессах
Примеры: "развить экономику", "построить космодром", "захватить континент", "создать империю"

ИНОЕ - короткие реакции, подтверждения, эмоции, неясные сообщения
Примеры: "ок", "понял", "хаха", "да", "нет", "спасибо"

ПРАВИЛА:
- Если есть вопросительный знак или вопросительное слово = ВОПРОС
- Если есть глагол-действие = ПРИКАЗ или ПРОЕКТ (зависит от масштаба)
- Если текст короткий и не содержит действий = ИНОЕ

Ответь ОДНИМ словом: вопрос, приказ, проект или иное

Тип:"#
    )
}

/// Labels player messages. Without a provider (no API key) every message is `Other`.
#[derive(Clone, Debug)]
pub struct MessageClassifier<P> {
    provider: Option<P>,
    options: CallOptions,
}

impl<P: CompletionProvider> MessageClassifier<P> {
    pub fn new(provider: Option<P>) -> Self {
        Self {
            provider,
            options: CallOptions::classification(),
        }
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Never fails: transport errors are logged and reported as `Other`.
    pub async fn classify_message(&self, message: &str, sender_country: &str) -> ClassificationLabel {
        let Some(provider) = &self.provider else {
            return ClassificationLabel::Other;
        };

        let prompt = classification_prompt(message, sender_country);
        match provider.complete(&prompt, &self.options).await {
            Ok(reply) => {
                let label = ClassificationLabel::normalize(&reply);
                log::debug!("Classified message from {sender_country} as {label} (raw: {reply:?})");
                label
            }
            Err(e) => {
                log::error!("Error classifying message: {e}");
                ClassificationLabel::Other
            }
        }
    }
}
