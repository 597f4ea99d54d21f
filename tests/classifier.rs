mod common;

use common::ScriptedProvider;
use wpg_engine::{ClassificationLabel, LlmError, MessageClassifier};

#[tokio::test]
async fn disabled_classifier_returns_other() {
    let classifier: MessageClassifier<ScriptedProvider> = MessageClassifier::new(None);
    assert!(!classifier.is_enabled());
    assert_eq!(
        classifier.classify_message("Какой год?", "Testland").await,
        ClassificationLabel::Other
    );
}

#[tokio::test]
async fn verbose_reply_is_normalized() {
    let provider = ScriptedProvider::replying(&["Тип сообщения: ПРОЕКТ."]);
    let classifier = MessageClassifier::new(Some(provider.clone()));

    let label = classifier
        .classify_message("Построить космодром", "Testland")
        .await;

    assert_eq!(label, ClassificationLabel::Project);
    let (prompt, options) = &provider.calls()[0];
    assert!(prompt.contains("из страны \"Testland\""));
    assert_eq!(options.max_tokens, 10);
    assert!(options.temperature < 0.2);
}

#[tokio::test]
async fn transport_errors_become_other() {
    for err in [
        LlmError::Timeout { attempts: 1 },
        LlmError::Http {
            status: 500,
            body: String::new(),
        },
        LlmError::MalformedResponse("empty".to_string()),
    ] {
        let classifier = MessageClassifier::new(Some(ScriptedProvider::new(vec![Err(err)])));
        assert_eq!(
            classifier.classify_message("Атаковать", "Testland").await,
            ClassificationLabel::Other
        );
    }
}
