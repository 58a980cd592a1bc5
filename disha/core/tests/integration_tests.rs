//! End-to-end tests for the advisor core
//!
//! These tests drive the public API the way a surface does: launch the app
//! against a store, open the chat, and exchange messages with a scripted
//! backend. Tests cover:
//! - Greeting with and without a reachable backend
//! - Skill Swipe results relayed into the chat
//! - Streamed replies accumulating into the timeline
//! - Theme and profile restoration from the store
//! - Single-session, one-placeholder, relay and onboarding invariants

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::{NamedTempFile, TempDir};
use tokio::sync::mpsc;

use disha_core::backend::test_utils::{Reply, ScriptedBackend};
use disha_core::config::{load_config_from_path, ConfigOverrides};
use disha_core::games::discussion_prompt;
use disha_core::store::{PROFILE_KEY, THEME_KEY};
use disha_core::{
    App, ChatAvailability, ChatController, ChatUpdate, DishaConfig, FileStore, KeyValueStore,
    Launch, MemoryStore, Onboarding, PromptRelay, SessionProvider, Tab, Theme, UserProfile,
    ViewRouter, GREETING_FALLBACK,
};

// =============================================================================
// Helpers
// =============================================================================

fn priya() -> UserProfile {
    UserProfile::new("Priya", "biology", "math", "curious")
}

fn chat_with(backend: &ScriptedBackend) -> (ChatController, mpsc::Receiver<ChatUpdate>) {
    let provider = SessionProvider::with_backend(Arc::new(backend.clone()), "mock");
    let session = provider.create(&priya()).unwrap();
    let (tx, rx) = mpsc::channel(1024);
    (ChatController::new(session, tx), rx)
}

fn ready_chat(availability: ChatAvailability) -> ChatController {
    match availability {
        ChatAvailability::Ready(chat) => chat,
        ChatAvailability::Unavailable(e) => panic!("chat unavailable: {e}"),
    }
}

// =============================================================================
// Scenario a: Greeting
// =============================================================================

#[tokio::test]
async fn test_greeting_returns_reply() {
    let backend = ScriptedBackend::new();
    let provider = SessionProvider::with_backend(Arc::new(backend.clone()), "mock");
    let session = provider.create(&priya()).unwrap();

    let reply = session.send_buffered("Hello!").await.unwrap();
    assert!(!reply.is_empty());
    assert!(backend.requests()[0]
        .system
        .as_deref()
        .is_some_and(|s| s.contains("- Name: Priya")));
}

#[tokio::test]
async fn test_greeting_fallback_literal() {
    let backend = ScriptedBackend::with_replies([Reply::fail("network unreachable")]);
    let (mut chat, _rx) = chat_with(&backend);

    let greeting = chat.greet().await.unwrap();
    assert_eq!(
        greeting,
        "Hello! I'm having a little trouble connecting right now, but I'm here to help."
    );
    assert_eq!(greeting, GREETING_FALLBACK);
}

// =============================================================================
// Scenario b: Skill Swipe -> relay -> chat
// =============================================================================

#[tokio::test]
async fn test_game_results_relayed_to_chat() {
    let router = ViewRouter::new(Tab::Games);
    let relay = PromptRelay::new(router.clone());

    let top_skills = ["creativity", "problem-solving", "empathy"];
    let prompt = discussion_prompt(&top_skills);
    relay.offer(prompt.clone());

    assert!(prompt.contains("creativity, problem-solving, empathy"));
    assert_eq!(router.active(), Tab::Chat);

    let backend = ScriptedBackend::new();
    let (mut chat, _rx) = chat_with(&backend);
    chat.take_pending(&relay).await.unwrap();

    assert_eq!(backend.requests()[0].prompt, prompt);
    assert_eq!(chat.timeline().snapshot()[0].text, prompt);
    assert_eq!(relay.consume(), None);
}

// =============================================================================
// Scenario c: Streaming accumulation
// =============================================================================

#[tokio::test]
async fn test_streamed_fragments_accumulate() {
    let backend = ScriptedBackend::with_replies([Reply::fragments(["Hi ", "Priya", "!"])]);
    let (mut chat, mut rx) = chat_with(&backend);

    let id = chat.send("Hello").await.unwrap();
    let msg = chat.timeline().get(&id).unwrap();
    assert_eq!(msg.text, "Hi Priya!");
    assert!(!msg.generating);

    // Replay updates: the placeholder is generating for every intermediate state
    let mut text = String::new();
    let mut generating = false;
    while let Ok(update) = rx.try_recv() {
        match update {
            ChatUpdate::Appended {
                id: ref appended,
                generating: g,
                ..
            } if *appended == id => generating = g,
            ChatUpdate::Delta { id: ref delta, fragment } if *delta == id => {
                assert!(generating);
                text.push_str(&fragment);
            }
            ChatUpdate::Finalized { id: ref done, text: ref final_text } if *done == id => {
                assert_eq!(final_text, &text);
                generating = false;
            }
            _ => {}
        }
    }
    assert_eq!(text, "Hi Priya!");
    assert!(!generating);
}

// =============================================================================
// Scenario d: Stored theme
// =============================================================================

#[test]
fn test_stored_dark_theme_restored() {
    let store = Arc::new(MemoryStore::with_entries([(THEME_KEY, "dark")]));
    let mut config = DishaConfig::default();
    config.prefer_dark = false;

    let (app, _) = App::launch_with(
        config,
        store,
        SessionProvider::with_backend(Arc::new(ScriptedBackend::new()), "mock"),
    );
    assert_eq!(app.theme(), Theme::Dark);
}

#[test]
fn test_system_preference_used_when_unset() {
    let store = Arc::new(MemoryStore::new());
    let mut config = DishaConfig::default();
    config.prefer_dark = true;

    let (app, _) = App::launch(config, store.clone());
    assert_eq!(app.theme(), Theme::Dark);
    assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
}

// =============================================================================
// Scenario e: Malformed profile
// =============================================================================

#[test]
fn test_malformed_profile_routes_to_onboarding() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::in_dir(dir.path());
    store.set(PROFILE_KEY, "{not json").unwrap();

    let (app, launch) = App::launch(DishaConfig::default(), Arc::new(store));
    assert!(matches!(launch, Launch::Onboarding(_)));
    assert!(app.profile().is_none());
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_single_session_invariant() {
    let provider = SessionProvider::with_backend(Arc::new(ScriptedBackend::new()), "mock");
    let first = provider.create(&priya()).unwrap();
    let instruction = first.system_instruction().to_string();

    for name in ["Arjun", "Meera", "Kabir"] {
        let again = provider
            .create(&UserProfile::new(name, "music", "singing", "calm"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.system_instruction(), instruction);
    }
}

#[tokio::test]
async fn test_at_most_one_open_placeholder() {
    let backend = ScriptedBackend::with_replies([
        Reply::fragments(["Welcome!"]),
        Reply::fragments(["a", "b"]),
        Reply::FailMidStream {
            fragments: vec!["c".into()],
            error: "reset".into(),
        },
        Reply::fail("503"),
    ]);
    let (mut chat, mut rx) = chat_with(&backend);

    chat.greet().await;
    for text in ["one", "two", "three"] {
        chat.send(text).await;
        let generating = chat
            .timeline()
            .snapshot()
            .iter()
            .filter(|m| m.generating)
            .count();
        assert_eq!(generating, 0);
    }
    assert_eq!(chat.timeline().len(), 7);

    // Replay every update: while fragments arrive exactly one message is open
    let mut open = HashSet::new();
    let mut deltas = 0;
    while let Ok(update) = rx.try_recv() {
        match update {
            ChatUpdate::Appended {
                id,
                generating: true,
                ..
            } => {
                assert!(open.is_empty(), "placeholder opened while another is open");
                open.insert(id);
            }
            ChatUpdate::Delta { id, .. } => {
                assert_eq!(open.len(), 1);
                assert!(open.contains(&id));
                deltas += 1;
            }
            ChatUpdate::Finalized { id, .. } => {
                open.remove(&id);
            }
            _ => {}
        }
    }
    assert_eq!(deltas, 3);
    assert!(open.is_empty());
}

#[test]
fn test_relay_one_shot() {
    let relay = PromptRelay::new(ViewRouter::default());
    relay.offer("hello");
    assert_eq!(relay.consume().as_deref(), Some("hello"));
    assert_eq!(relay.consume(), None);
}

#[test]
fn test_onboarding_guard() {
    let mut onboarding = Onboarding::new();
    onboarding.back();
    assert_eq!(onboarding.index(), 0);

    onboarding.next();
    assert_eq!(onboarding.index(), 0);
}

// =============================================================================
// Full run: onboarding -> persisted profile -> relaunch
// =============================================================================

#[test]
fn test_onboarding_then_relaunch() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend::with_replies([Reply::fragments(["Namaste, Priya!"])]);

    let mut config = DishaConfig::default();
    config.data_dir = dir.path().to_path_buf();
    config.finish_delay = Duration::from_millis(1);

    let store = Arc::new(FileStore::in_dir(&config.data_dir));
    let provider = SessionProvider::with_backend(Arc::new(backend.clone()), "mock");
    let (mut app, launch) = App::launch_with(config.clone(), store, provider);

    let Launch::Onboarding(mut onboarding) = launch else {
        panic!("expected onboarding");
    };
    for answer in ["Priya", "biology", "math", "curious"] {
        onboarding.set_answer(answer);
        onboarding.next();
    }
    let profile = tokio_test::block_on(onboarding.finish_after(config.finish_delay)).unwrap();

    let (tx, _rx) = mpsc::channel(64);
    let mut chat = ready_chat(app.complete_onboarding(profile, tx));
    let greeting = tokio_test::block_on(chat.greet()).unwrap();
    assert_eq!(greeting, "Namaste, Priya!");

    let store = Arc::new(FileStore::in_dir(dir.path()));
    let (app, launch) = App::launch_with(
        config,
        store,
        SessionProvider::with_backend(Arc::new(backend), "mock"),
    );
    assert!(matches!(launch, Launch::Ready(ref p) if *p == priya()));
    assert_eq!(app.profile(), Some(&priya()));
}

#[test]
fn test_config_file_feeds_app() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[appearance]\nprefer_dark = true\n\n[onboarding]\nfinish_delay_ms = 5").unwrap();

    let mut config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
    ConfigOverrides::new().with_prefer_dark(false).apply(&mut config);

    assert_eq!(config.finish_delay, Duration::from_millis(5));
    assert!(!config.prefer_dark);
}
