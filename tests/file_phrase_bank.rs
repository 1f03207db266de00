//! Phrase banks read from disk through the configured file source
//!
//! Run:
//!   cargo test --test file_phrase_bank

use std::path::Path;

use voice_reply::{
    ConfigurationError, DispatchError, EngineConfig, OutputDescriptor, OutputFormat,
    PhraseBankError, PhraseSourceConfig,
};

fn write_bank(root: &Path, leading: &str, locale: &str, yaml: &str) {
    let dir = root.join(leading).join(locale);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("utterances.yml"), yaml).unwrap();
}

fn config(root: &Path) -> EngineConfig {
    EngineConfig {
        phrases: PhraseSourceConfig::File {
            root: root.to_path_buf(),
            leading_path: "skills/calc".to_string(),
            resource_location: "utterances.yml".to_string(),
        },
        seed: Some(1),
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_renders_from_file_with_leading_path() {
    let dir = tempfile::tempdir().unwrap();
    write_bank(
        dir.path(),
        "skills/calc",
        "en-US",
        "SayHello:\n  - [\"Hello {name}\"]\n  - [\"Still there, {name}?\"]\n",
    );

    let assembler = config(dir.path()).build_assembler().unwrap();
    let output = OutputDescriptor::ask("SayHello")
        .put_slot_formatted("name", "Joe", OutputFormat::SpellOut)
        .with_reprompt(true)
        .build()
        .unwrap();

    let response = assembler.assemble(&output, None).await.unwrap();
    assert_eq!(
        response.speech,
        "<speak>Hello <say-as interpret-as=\"spell-out\">Joe</say-as></speak>"
    );
    assert_eq!(
        response.reprompt.as_deref(),
        Some("<speak>Still there, <say-as interpret-as=\"spell-out\">Joe</say-as>?</speak>")
    );
}

#[tokio::test]
async fn test_bank_is_read_once_until_invalidated() {
    let dir = tempfile::tempdir().unwrap();
    write_bank(dir.path(), "skills/calc", "en-US", "SayHi: [\"Hi\"]\n");

    let assembler = config(dir.path()).build_assembler().unwrap();
    let output = OutputDescriptor::tell("SayHi").build().unwrap();
    assert_eq!(
        assembler.assemble(&output, None).await.unwrap().speech,
        "<speak>Hi</speak>"
    );

    write_bank(dir.path(), "skills/calc", "en-US", "SayHi: [\"Howdy\"]\n");
    assert_eq!(
        assembler.assemble(&output, None).await.unwrap().speech,
        "<speak>Hi</speak>"
    );

    assembler.cache().invalidate(assembler.source().as_ref());
    assert_eq!(
        assembler.assemble(&output, None).await.unwrap().speech,
        "<speak>Howdy</speak>"
    );
}

#[tokio::test]
async fn test_missing_and_malformed_banks() {
    let dir = tempfile::tempdir().unwrap();
    write_bank(dir.path(), "skills/calc", "de-DE", "SayHi: [\"Hallo\"\n");

    let assembler = config(dir.path()).build_assembler().unwrap();
    let output = OutputDescriptor::tell("SayHi").build().unwrap();

    let err = assembler.assemble(&output, Some("fr-FR")).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::PhraseBank(PhraseBankError::NotFound { .. })
    ));

    let err = assembler.assemble(&output, Some("de-DE")).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::PhraseBank(PhraseBankError::Parse { .. })
    ));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_locale_cannot_leave_the_phrase_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root");
    write_bank(&root, "skills/calc", "en-US", "SayHi: [\"Hi\"]\n");
    write_bank(dir.path(), "skills/calc", "secret", "SayHi: [\"leaked\"]\n");

    let assembler = config(&root).build_assembler().unwrap();
    let output = OutputDescriptor::tell("SayHi").build().unwrap();

    let err = assembler
        .assemble(&output, Some("../../../skills/calc/secret"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Configuration(ConfigurationError::InvalidLocale(_))
    ));
    assert!(assembler.cache().is_empty());

    let err = OutputDescriptor::tell("SayHi")
        .with_locale("../secret")
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigurationError::InvalidLocale("../secret".into()));
}

#[tokio::test]
async fn test_seeded_config_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    write_bank(
        dir.path(),
        "skills/calc",
        "en-US",
        "SayMood: [\"I feel [great|fine|okay|superb|grand]\", \"[Fine|Good], [thanks|thank you]\"]\n",
    );

    let output = OutputDescriptor::tell("SayMood").build().unwrap();
    let mut runs = Vec::new();
    for _ in 0..2 {
        let assembler = config(dir.path()).build_assembler().unwrap();
        let mut spoken = Vec::new();
        for _ in 0..10 {
            spoken.push(assembler.assemble(&output, None).await.unwrap().speech);
        }
        runs.push(spoken);
    }
    assert_eq!(runs[0], runs[1]);
    assert!(runs[0]
        .iter()
        .all(|s| !s.contains('[') && !s.contains('|')));
}
