use std::collections::BTreeMap;
use std::fs;

use chat_provider::{ChatMessage, MessagePart, Role};
use pretty_assertions::assert_eq;
use prompt_store::{
    ArtifactKind, ChatStorage, FsPromptStore, Session, StoreError, Strategy, StrategyLoader,
    TemplateError,
};
use tempfile::TempDir;

fn store() -> (TempDir, FsPromptStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = FsPromptStore::new(dir.path());
    (dir, store)
}

fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

#[test]
fn missing_artifacts_report_not_found_with_kind() {
    let (_dir, store) = store();

    assert!(matches!(
        store.session("nope"),
        Err(StoreError::NotFound { kind: ArtifactKind::Session, ref name }) if name == "nope"
    ));
    assert!(matches!(
        store.context("nope"),
        Err(StoreError::NotFound { kind: ArtifactKind::Context, .. })
    ));
    assert!(matches!(
        store.pattern("nope", &BTreeMap::new(), "x"),
        Err(StoreError::NotFound { kind: ArtifactKind::Pattern, .. })
    ));
    assert!(matches!(
        store.strategy("nope"),
        Err(StoreError::NotFound { kind: ArtifactKind::Strategy, .. })
    ));
}

#[test]
fn session_round_trips_through_disk() {
    let (dir, store) = store();
    let mut session = Session::named("daily");
    session.append(ChatMessage::meta("trace"));
    session.append(ChatMessage::user("hi"));
    session.append(ChatMessage::with_parts(
        Role::User,
        vec![
            MessagePart::text("look"),
            MessagePart::ImageUrl {
                url: "https://example.com/cat.png".to_owned(),
            },
        ],
    ));
    session.append(ChatMessage::assistant("hello"));

    store.save_session(&session).expect("session should save");
    assert!(dir.path().join("sessions/daily.json").is_file());

    let loaded = store.session("daily").expect("session should load");
    assert_eq!(loaded, session);
}

#[test]
fn anonymous_sessions_are_not_written() {
    let (dir, store) = store();
    let mut session = Session::anonymous();
    session.append(ChatMessage::user("hi"));

    store.save_session(&session).expect("no-op save");
    assert!(!dir.path().join("sessions").exists());
}

#[test]
fn create_session_keeps_existing_history() {
    let (_dir, store) = store();
    let created = store.create_session("work").expect("create");
    assert!(created.is_empty());

    let mut session = created;
    session.append(ChatMessage::user("first"));
    store.save_session(&session).expect("save");

    let again = store.create_session("work").expect("existing session");
    assert_eq!(again.messages, vec![ChatMessage::user("first")]);
}

#[test]
fn malformed_session_file_is_a_json_error() {
    let (dir, store) = store();
    fs::create_dir_all(dir.path().join("sessions")).expect("sessions dir");
    fs::write(dir.path().join("sessions/broken.json"), "{ not json").expect("write");

    assert!(matches!(
        store.session("broken"),
        Err(StoreError::Json { .. })
    ));
}

#[test]
fn context_is_returned_verbatim() {
    let (_dir, store) = store();
    store
        .save_context("repo", "  The repo is a Rust workspace.\n")
        .expect("save context");
    assert_eq!(
        store.context("repo").expect("context"),
        "  The repo is a Rust workspace.\n"
    );
}

#[test]
fn pattern_without_placeholder_gets_input_appended() {
    let (_dir, store) = store();
    store
        .save_pattern("summarize", "Summarize the text.")
        .expect("save pattern");

    let pattern = store
        .pattern("summarize", &BTreeMap::new(), "some text")
        .expect("pattern");
    assert_eq!(pattern, "Summarize the text.\nsome text");
}

#[test]
fn pattern_variables_apply_before_input_placement() {
    let (_dir, store) = store();
    store
        .save_pattern(
            "translate",
            "Translate into {{lang}}:\n\n{{input}}\n\nKeep the {{ tone }} tone.\n",
        )
        .expect("save pattern");

    let pattern = store
        .pattern(
            "translate",
            &vars(&[("lang", "German"), ("tone", "casual")]),
            "good morning {{lang}}",
        )
        .expect("pattern");
    assert_eq!(
        pattern,
        "Translate into German:\n\ngood morning {{lang}}\n\nKeep the casual tone.\n"
    );
}

#[test]
fn variable_values_cannot_reach_the_input_placeholder() {
    let (_dir, store) = store();
    store
        .save_pattern("echo", "{{prefix}} {{input}}")
        .expect("save pattern");

    let pattern = store
        .pattern("echo", &vars(&[("prefix", "{{input}}")]), "user text")
        .expect("pattern");
    assert_eq!(pattern, "{{input}} user text");
}

#[test]
fn missing_pattern_variable_fails() {
    let (_dir, store) = store();
    store
        .save_pattern("greet", "Greet {{name}}.")
        .expect("save pattern");

    let error = store
        .pattern("greet", &BTreeMap::new(), "")
        .expect_err("name is required");
    assert!(matches!(
        error,
        StoreError::Template(TemplateError::MissingVariable(ref name)) if name == "name"
    ));
}

#[test]
fn raw_pattern_keeps_variables_literal() {
    let (_dir, store) = store();
    store
        .save_pattern("greet", "Greet {{name}}.\n{{input}}")
        .expect("save pattern");

    assert_eq!(
        store.raw_pattern("greet", "Ada").expect("raw pattern"),
        "Greet {{name}}.\nAda"
    );
}

#[test]
fn strategy_file_supplies_prompt_prefix() {
    let (dir, store) = store();
    fs::create_dir_all(dir.path().join("strategies")).expect("strategies dir");
    fs::write(
        dir.path().join("strategies/cot.json"),
        r#"{"description":"Chain of thought","prompt":"Think step by step."}"#,
    )
    .expect("write strategy");

    assert_eq!(
        store.strategy("cot").expect("strategy"),
        Strategy {
            description: "Chain of thought".to_owned(),
            prompt: "Think step by step.".to_owned(),
        }
    );

    store
        .save_strategy(
            "plain",
            &Strategy {
                description: String::new(),
                prompt: "Answer plainly.".to_owned(),
            },
        )
        .expect("save strategy");
    assert_eq!(
        store.strategy("plain").expect("strategy").prompt,
        "Answer plainly."
    );
}

#[test]
fn traversal_names_are_rejected_before_touching_disk() {
    let (_dir, store) = store();
    assert!(matches!(
        store.context("../etc/passwd"),
        Err(StoreError::InvalidName { kind: ArtifactKind::Context, .. })
    ));
    assert!(matches!(
        store.save_session(&Session::named("a/b")),
        Err(StoreError::InvalidName { kind: ArtifactKind::Session, .. })
    ));
}
