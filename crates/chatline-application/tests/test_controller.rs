use async_trait::async_trait;
use chatline_application::{ConnectionState, ControllerEvent, Screen, SyncController};
use chatline_core::backend::{Capabilities, ChatBackend, LoginOutcome};
use chatline_core::config::ClientConfig;
use chatline_core::conversation::Conversation;
use chatline_core::error::{ChatError, Result};
use chatline_core::format::ResponseFormatSpec;
use chatline_core::message::{Message, MessageRole};
use chatline_core::notification::Notification;
use chatline_core::session::{MemorySelectionRepository, PersistedSelection, SessionStore};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

// Mock ChatBackend with scripted results
struct MockBackend {
    capabilities: Capabilities,
    conversations: Vec<Conversation>,
    formats: Vec<String>,
    history: Vec<Message>,
    login_error: Option<ChatError>,
    login_history: Option<Vec<Message>>,
    auth_results: Mutex<VecDeque<Result<()>>>,
    list_formats_error: Option<ChatError>,
    set_conversation_error: Option<ChatError>,
    set_format_error: Option<ChatError>,
    history_error: Option<ChatError>,
    delete_history_error: Option<ChatError>,
    send_results: Mutex<VecDeque<Result<Vec<Message>>>>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    fn chats() -> Self {
        Self {
            capabilities: Capabilities {
                confirms_session: true,
                server_history: true,
                history_per_conversation: true,
                clear_history: true,
            },
            conversations: vec![
                Conversation::new("c1", "Main"),
                Conversation::new("c2", "Scratch"),
            ],
            formats: vec!["[DEFAULT]".to_string(), "[JSON]".to_string()],
            history: vec![
                Message::user("earlier question").with_id(1),
                Message::agent("earlier answer").with_id(2),
            ],
            login_error: None,
            login_history: None,
            auth_results: Mutex::new(VecDeque::new()),
            list_formats_error: None,
            set_conversation_error: None,
            set_format_error: None,
            history_error: None,
            delete_history_error: None,
            send_results: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn legacy() -> Self {
        Self {
            capabilities: Capabilities {
                confirms_session: false,
                server_history: false,
                history_per_conversation: false,
                clear_history: false,
            },
            conversations: vec![Conversation::new("a1", "Analyst")],
            formats: vec!["[DEFAULT]".into(), "[JSON]".into(), "[XML]".into()],
            login_history: Some(vec![Message::user("hello"), Message::agent("hi there")]),
            ..Self::chats()
        }
    }

    fn script_auth(self, results: Vec<Result<()>>) -> Self {
        *self.auth_results.lock().unwrap() = results.into();
        self
    }

    fn script_send(self, results: Vec<Result<Vec<Message>>>) -> Self {
        *self.send_results.lock().unwrap() = results.into();
        self
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn login(&self, credential: &str) -> Result<LoginOutcome> {
        self.record(&format!("login:{credential}"));
        match &self.login_error {
            Some(err) => Err(err.clone()),
            None => Ok(LoginOutcome {
                history: self.login_history.clone(),
            }),
        }
    }

    async fn check_auth(&self) -> Result<()> {
        self.record("check_auth");
        self.auth_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.record("list_conversations");
        Ok(self.conversations.clone())
    }

    async fn set_conversation(&self, conversation_id: &str) -> Result<()> {
        self.record(&format!("set_conversation:{conversation_id}"));
        match &self.set_conversation_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn list_formats(&self) -> Result<Vec<String>> {
        self.record("list_formats");
        match &self.list_formats_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.formats.clone()),
        }
    }

    async fn set_format(&self, format: &ResponseFormatSpec) -> Result<()> {
        self.record(&format!("set_format:{}", format.kind));
        match &self.set_format_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn send_message(&self, text: &str) -> Result<Vec<Message>> {
        self.record(&format!("send:{text}"));
        self.send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_history(&self, conversation_id: Option<&str>) -> Result<Vec<Message>> {
        self.record(&format!("fetch_history:{}", conversation_id.unwrap_or("*")));
        match &self.history_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.history.clone()),
        }
    }

    async fn delete_history(&self, conversation_id: Option<&str>) -> Result<()> {
        self.record(&format!("delete_history:{}", conversation_id.unwrap_or("*")));
        match &self.delete_history_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

struct Harness {
    controller: SyncController,
    events: UnboundedReceiver<ControllerEvent>,
    backend: Arc<MockBackend>,
    repository: Arc<MemorySelectionRepository>,
}

impl Harness {
    fn new(backend: MockBackend) -> Self {
        Self::with_selection(backend, PersistedSelection::default())
    }

    fn with_selection(backend: MockBackend, selection: PersistedSelection) -> Self {
        let backend = Arc::new(backend);
        let repository = Arc::new(MemorySelectionRepository::with_selection(selection));
        let config = ClientConfig {
            confirm_delay_ms: 0,
            ..ClientConfig::default()
        };
        let (controller, events) =
            SyncController::new(backend.clone(), SessionStore::new(repository.clone()), &config);
        Self {
            controller,
            events,
            backend,
            repository,
        }
    }

    async fn logged_in(backend: MockBackend) -> Self {
        let mut harness = Self::new(backend);
        harness.controller.login("secret").await.unwrap();
        harness.drain();
        harness
    }

    fn drain(&mut self) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    fn notifications(&mut self) -> Vec<Notification> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                ControllerEvent::Notify(notification) => Some(notification),
                _ => None,
            })
            .collect()
    }
}

#[tokio::test]
async fn test_login_confirms_bootstraps_and_selects() {
    let mut harness = Harness::new(MockBackend::chats());

    harness.controller.login("  secret  ").await.unwrap();

    assert_eq!(harness.controller.state(), ConnectionState::Ready);
    assert_eq!(
        harness.backend.calls(),
        vec![
            "login:secret",
            "check_auth",
            "list_conversations",
            "list_formats"
        ]
    );
    let view = harness.controller.view();
    assert_eq!(view.screen, Screen::Chat);
    assert_eq!(view.conversations.len(), 2);
    assert_eq!(view.formats.len(), 2);
    assert!(view.selected_conversation.is_none());
    assert!(harness.controller.transcript().is_empty());
    assert!(
        harness
            .drain()
            .contains(&ControllerEvent::ScreenChanged(Screen::Chat))
    );

    harness.controller.select_conversation(Some("c1")).await.unwrap();

    assert_eq!(harness.backend.count("set_conversation:c1"), 1);
    assert_eq!(harness.backend.count("fetch_history:c1"), 1);
    assert_eq!(harness.controller.transcript().len(), 2);
    assert_eq!(harness.controller.selected_conversation(), Some("c1"));
    assert_eq!(
        harness.repository.snapshot().await.conversation_id.as_deref(),
        Some("c1")
    );
    let notifications = harness.notifications();
    assert_eq!(
        notifications,
        vec![Notification::success("Chat \"Main\" selected")]
    );
}

#[tokio::test]
async fn test_empty_password_is_rejected_locally() {
    let mut harness = Harness::new(MockBackend::chats());

    let err = harness.controller.login("   ").await.unwrap_err();

    assert!(err.is_validation());
    assert!(harness.backend.calls().is_empty());
    assert_eq!(
        harness.controller.view().auth_error.as_deref(),
        Some("Enter a password")
    );
}

#[tokio::test]
async fn test_bad_credential_stays_logged_out() {
    let backend = MockBackend {
        login_error: Some(ChatError::unauthorized("Invalid password")),
        ..MockBackend::chats()
    };
    let mut harness = Harness::new(backend);

    let err = harness.controller.login("wrong").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(harness.controller.state(), ConnectionState::LoggedOut);
    assert_eq!(
        harness.controller.view().auth_error.as_deref(),
        Some("Invalid password")
    );
    assert_eq!(harness.backend.count("check_auth"), 0);
}

#[tokio::test]
async fn test_unconfirmed_session_is_distinct_from_bad_credential() {
    let backend = MockBackend::chats().script_auth(vec![
        Err(ChatError::unauthorized("no cookie")),
        Err(ChatError::unauthorized("no cookie")),
        Err(ChatError::unauthorized("no cookie")),
    ]);
    let mut harness = Harness::new(backend);

    let err = harness.controller.login("secret").await.unwrap_err();

    assert!(matches!(err, ChatError::SessionNotConfirmed(_)));
    assert_eq!(harness.controller.state(), ConnectionState::LoggedOut);
    assert_eq!(harness.backend.count("check_auth"), 3);
    assert_eq!(harness.backend.count("list_conversations"), 0);
}

#[tokio::test]
async fn test_session_confirmed_on_a_later_probe() {
    let backend =
        MockBackend::chats().script_auth(vec![Err(ChatError::unauthorized("not yet")), Ok(())]);
    let mut harness = Harness::new(backend);

    harness.controller.login("secret").await.unwrap();

    assert_eq!(harness.controller.state(), ConnectionState::Ready);
    assert_eq!(harness.backend.count("check_auth"), 2);
}

#[tokio::test]
async fn test_resume_probes_once() {
    let mut harness = Harness::new(MockBackend::chats());
    assert!(harness.controller.resume().await);
    assert_eq!(harness.controller.state(), ConnectionState::Ready);
    assert!(harness.controller.session().unwrap().credential.is_empty());

    let backend = MockBackend::chats().script_auth(vec![Err(ChatError::unauthorized("nope"))]);
    let mut harness = Harness::new(backend);
    assert!(!harness.controller.resume().await);
    assert_eq!(harness.controller.state(), ConnectionState::LoggedOut);
    assert_eq!(harness.backend.count("check_auth"), 1);
    assert!(harness.notifications().is_empty());
}

#[tokio::test]
async fn test_bootstrap_restores_persisted_selection() {
    let selection = PersistedSelection {
        conversation_id: Some("c2".into()),
        format_kind: Some("[JSON]".into()),
        format_body: Some("{\"answer\": string}".into()),
    };
    let mut harness = Harness::with_selection(MockBackend::chats(), selection);

    harness.controller.login("secret").await.unwrap();

    let view = harness.controller.view();
    assert_eq!(view.selected_conversation.as_deref(), Some("c2"));
    assert_eq!(view.presented_conversation.as_deref(), Some("c2"));
    assert_eq!(view.current_format.unwrap().kind, "[JSON]");
    assert_eq!(harness.backend.count("fetch_history:c2"), 1);
    assert_eq!(harness.controller.transcript().len(), 2);
}

#[tokio::test]
async fn test_bootstrap_ignores_unknown_persisted_conversation() {
    let selection = PersistedSelection {
        conversation_id: Some("gone".into()),
        ..Default::default()
    };
    let mut harness = Harness::with_selection(MockBackend::chats(), selection);

    harness.controller.login("secret").await.unwrap();

    assert!(harness.controller.selected_conversation().is_none());
    assert!(harness.controller.view().presented_conversation.is_none());
    assert_eq!(harness.backend.count("fetch_history:gone"), 0);
    assert!(harness.notifications().iter().all(|n| !n.is_error()));
}

#[tokio::test]
async fn test_bootstrap_keeps_applied_steps_after_failure() {
    let backend = MockBackend {
        list_formats_error: Some(ChatError::server(500, "formats unavailable")),
        ..MockBackend::chats()
    };
    let mut harness = Harness::new(backend);

    harness.controller.login("secret").await.unwrap();

    let view = harness.controller.view();
    assert_eq!(view.screen, Screen::Chat);
    assert_eq!(view.conversations.len(), 2);
    assert!(view.formats.is_empty());
    let notifications = harness.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications[0].message,
        "Failed to load response formats: formats unavailable"
    );
}

#[tokio::test]
async fn test_failed_select_reverts_presented_selector() {
    let selection = PersistedSelection {
        conversation_id: Some("c1".into()),
        ..Default::default()
    };
    let backend = MockBackend {
        set_conversation_error: Some(ChatError::validation("Chat is archived")),
        ..MockBackend::chats()
    };
    let mut harness = Harness::with_selection(backend, selection);
    harness.controller.login("secret").await.unwrap();
    harness.drain();

    let err = harness
        .controller
        .select_conversation(Some("c2"))
        .await
        .unwrap_err();

    assert_eq!(err, ChatError::validation("Chat is archived"));
    let view = harness.controller.view();
    assert_eq!(view.selected_conversation.as_deref(), Some("c1"));
    assert_eq!(view.presented_conversation.as_deref(), Some("c1"));
    assert_eq!(
        harness.repository.snapshot().await.conversation_id.as_deref(),
        Some("c1")
    );
    assert_eq!(harness.backend.count("fetch_history:c2"), 0);
    let notifications = harness.notifications();
    assert!(notifications[0].is_error());
    assert_eq!(
        notifications[0].message,
        "Failed to select conversation: Chat is archived"
    );
}

#[tokio::test]
async fn test_deselect_forgets_persisted_conversation() {
    let mut harness = Harness::logged_in(MockBackend::chats()).await;
    harness.controller.select_conversation(Some("c1")).await.unwrap();

    harness.controller.select_conversation(None).await.unwrap();

    assert!(harness.controller.selected_conversation().is_none());
    assert!(harness.repository.snapshot().await.conversation_id.is_none());
}

#[tokio::test]
async fn test_single_reply_appends_after_user_message() {
    let backend = MockBackend::chats().script_send(vec![Ok(vec![Message::agent("pong")])]);
    let mut harness = Harness::logged_in(backend).await;
    harness.controller.select_conversation(Some("c1")).await.unwrap();
    let before = harness.controller.transcript().len();

    harness.controller.send_message("  ping ").await.unwrap();

    let messages = harness.controller.transcript().to_messages();
    assert_eq!(messages.len(), before + 2);
    assert_eq!(messages[before].text, "ping");
    assert_eq!(messages[before].role, MessageRole::User);
    assert_eq!(messages[before].conversation_id.as_deref(), Some("c1"));
    assert_eq!(messages[before + 1].text, "pong");
    assert!(!harness.controller.transcript().has_provisional());
    assert_eq!(harness.backend.count("send:ping"), 1);
}

#[tokio::test]
async fn test_multi_reply_replaces_transcript() {
    let payload = vec![
        Message::user("a").with_id(10),
        Message::agent("b").with_id(11),
        Message::user("c").with_id(12),
    ];
    let backend = MockBackend::chats().script_send(vec![Ok(payload.clone())]);
    let mut harness = Harness::logged_in(backend).await;
    harness.controller.select_conversation(Some("c1")).await.unwrap();

    harness.controller.send_message("c").await.unwrap();

    assert_eq!(harness.controller.transcript().to_messages(), payload);
}

#[tokio::test]
async fn test_empty_reply_confirms_user_message_only() {
    let mut harness = Harness::logged_in(MockBackend::chats()).await;

    harness.controller.send_message("note to self").await.unwrap();

    let messages = harness.controller.transcript().to_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "note to self");
    assert!(!harness.controller.transcript().has_provisional());
}

#[tokio::test]
async fn test_blank_message_is_ignored() {
    let mut harness = Harness::logged_in(MockBackend::chats()).await;

    harness.controller.send_message("   ").await.unwrap();

    assert_eq!(harness.backend.count("send:"), 0);
    assert!(harness.drain().is_empty());
}

#[tokio::test]
async fn test_offline_send_rolls_back_with_notification() {
    let backend = MockBackend::chats()
        .script_send(vec![Err(ChatError::network("connection refused"))]);
    let mut harness = Harness::logged_in(backend).await;
    harness.controller.select_conversation(Some("c1")).await.unwrap();
    harness.drain();
    let before = harness.controller.transcript().to_messages();

    let err = harness.controller.send_message("hello").await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(harness.controller.transcript().to_messages(), before);
    assert!(!harness.controller.view().busy);

    let events = harness.drain();
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == ControllerEvent::TranscriptChanged)
            .count(),
        2
    );
    assert!(events.contains(&ControllerEvent::Notify(Notification::error(
        "Failed to send message: Network unavailable: connection refused"
    ))));
    assert_eq!(harness.controller.state(), ConnectionState::Ready);
}

#[tokio::test]
async fn test_unauthorized_send_returns_to_login() {
    let selection = PersistedSelection {
        conversation_id: Some("c1".into()),
        ..Default::default()
    };
    let backend =
        MockBackend::chats().script_send(vec![Err(ChatError::unauthorized("Session expired"))]);
    let mut harness = Harness::with_selection(backend, selection);
    harness.controller.login("secret").await.unwrap();
    harness.drain();

    let err = harness.controller.send_message("hello").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(harness.controller.state(), ConnectionState::LoggedOut);
    assert!(harness.controller.session().is_none());
    assert!(harness.controller.transcript().is_empty());
    let view = harness.controller.view();
    assert!(view.conversations.is_empty());
    assert!(view.auth_error.is_some());
    assert!(harness.repository.snapshot().await.is_empty());
    assert!(
        harness
            .drain()
            .contains(&ControllerEvent::ScreenChanged(Screen::Login))
    );
}

#[tokio::test]
async fn test_clear_history_requires_confirmation() {
    let mut harness = Harness::logged_in(MockBackend::chats()).await;
    harness.controller.select_conversation(Some("c1")).await.unwrap();

    harness.controller.clear_history(false).await.unwrap();
    assert_eq!(harness.controller.transcript().len(), 2);
    assert_eq!(harness.backend.count("delete_history:c1"), 0);

    harness.controller.clear_history(true).await.unwrap();
    assert!(harness.controller.transcript().is_empty());
    assert_eq!(harness.backend.count("delete_history:c1"), 1);
}

#[tokio::test]
async fn test_clear_history_without_chat_is_rejected() {
    let mut harness = Harness::logged_in(MockBackend::chats()).await;

    let err = harness.controller.clear_history(true).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(harness.backend.count("delete_history:*"), 0);
}

#[tokio::test]
async fn test_format_without_body_never_reaches_backend() {
    let mut harness = Harness::logged_in(MockBackend::chats()).await;

    let err = harness
        .controller
        .set_response_format("[JSON]", "   ")
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(harness.backend.count("set_format:[JSON]"), 0);
    let view = harness.controller.view();
    assert_eq!(view.modal_error.as_deref(), Some("Enter a format description"));
    assert_eq!(view.current_format.unwrap().kind, "[DEFAULT]");
    assert!(harness.notifications().is_empty());
}

#[tokio::test]
async fn test_unknown_format_kind_is_rejected() {
    let mut harness = Harness::logged_in(MockBackend::chats()).await;

    let err = harness
        .controller
        .set_response_format("[YAML]", "key: value")
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(harness.backend.count("set_format:[YAML]"), 0);
}

#[tokio::test]
async fn test_format_applied_and_persisted_together() {
    let mut harness = Harness::logged_in(MockBackend::chats()).await;

    harness
        .controller
        .set_response_format("[JSON]", "{\"answer\": string}")
        .await
        .unwrap();

    let view = harness.controller.view();
    assert!(view.modal_error.is_none());
    assert_eq!(
        view.current_format,
        Some(ResponseFormatSpec::new("[JSON]", "{\"answer\": string}").unwrap())
    );
    let persisted = harness.repository.snapshot().await;
    assert_eq!(persisted.format_kind.as_deref(), Some("[JSON]"));
    assert_eq!(persisted.format_body.as_deref(), Some("{\"answer\": string}"));
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let mut harness = Harness::logged_in(MockBackend::chats()).await;
    harness.controller.select_conversation(Some("c1")).await.unwrap();

    harness.controller.logout().await;

    assert_eq!(harness.controller.screen(), Screen::Login);
    assert!(harness.controller.transcript().is_empty());
    assert!(harness.repository.snapshot().await.is_empty());
    let err = harness.controller.send_message("hi").await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_legacy_login_seeds_transcript() {
    let mut harness = Harness::new(MockBackend::legacy());

    harness.controller.login("secret").await.unwrap();

    assert_eq!(harness.backend.count("check_auth"), 0);
    assert_eq!(harness.controller.transcript().len(), 2);
    assert_eq!(harness.controller.view().formats.len(), 3);

    harness.controller.select_conversation(Some("a1")).await.unwrap();
    assert_eq!(harness.backend.count("set_conversation:a1"), 1);
    assert_eq!(harness.controller.transcript().len(), 2);

    let err = harness.controller.clear_history(true).await.unwrap_err();
    assert!(matches!(err, ChatError::Unsupported(_)));
}

#[tokio::test]
async fn test_provisional_message_is_visible_while_in_flight() {
    let backend = MockBackend::chats()
        .script_send(vec![Err(ChatError::network("connection refused"))]);
    let mut harness = Harness::logged_in(backend).await;
    harness.controller.select_conversation(Some("c1")).await.unwrap();
    harness.drain();
    let before = harness.controller.transcript().len();

    let pending = harness.controller.begin_send("hello").unwrap().unwrap();

    assert_eq!(harness.controller.transcript().len(), before + 1);
    assert!(harness.controller.transcript().has_provisional());
    assert!(harness.controller.view().busy);
    assert_eq!(harness.drain(), vec![ControllerEvent::TranscriptChanged]);
    assert_eq!(harness.backend.count("send:hello"), 0);
    assert!(harness.controller.begin_send("again").is_err());

    harness.controller.finish_send(pending).await.unwrap_err();

    assert_eq!(harness.controller.transcript().len(), before);
    assert!(!harness.controller.view().busy);
    assert_eq!(
        harness.notifications(),
        vec![Notification::error(
            "Failed to send message: Network unavailable: connection refused"
        )]
    );
}

#[tokio::test]
async fn test_failed_clear_keeps_transcript() {
    let backend = MockBackend {
        delete_history_error: Some(ChatError::server(500, "database locked")),
        ..MockBackend::chats()
    };
    let mut harness = Harness::logged_in(backend).await;
    harness.controller.select_conversation(Some("c1")).await.unwrap();
    harness.drain();
    let before = harness.controller.transcript().to_messages();

    let err = harness.controller.clear_history(true).await.unwrap_err();

    assert_eq!(err, ChatError::server(500, "database locked"));
    assert_eq!(harness.controller.transcript().to_messages(), before);
    assert_eq!(harness.backend.count("delete_history:c1"), 1);
    assert_eq!(
        harness.notifications(),
        vec![Notification::error("Failed to clear history: database locked")]
    );
}

#[tokio::test]
async fn test_rejected_format_keeps_previous_selection() {
    let selection = PersistedSelection {
        format_kind: Some("[JSON]".into()),
        format_body: Some("{\"answer\": string}".into()),
        ..Default::default()
    };
    let backend = MockBackend {
        set_format_error: Some(ChatError::validation("Invalid format description")),
        ..MockBackend::chats()
    };
    let mut harness = Harness::with_selection(backend, selection.clone());
    harness.controller.login("secret").await.unwrap();
    harness.drain();
    let format_before = harness.controller.view().current_format;

    let err = harness
        .controller
        .set_response_format("[DEFAULT]", "")
        .await
        .unwrap_err();

    assert_eq!(err, ChatError::validation("Invalid format description"));
    assert_eq!(harness.backend.count("set_format:[DEFAULT]"), 1);
    let view = harness.controller.view();
    assert_eq!(view.current_format, format_before);
    assert_eq!(view.current_format.unwrap().kind, "[JSON]");
    assert_eq!(
        view.modal_error.as_deref(),
        Some("Invalid format description")
    );
    assert_eq!(harness.repository.snapshot().await, selection);
    assert!(harness.notifications().is_empty());
}

#[tokio::test]
async fn test_failed_history_reload_after_select_clears_transcript() {
    let backend = MockBackend {
        history_error: Some(ChatError::server(503, "history unavailable")),
        ..MockBackend::chats()
    };
    let mut harness = Harness::logged_in(backend).await;
    harness.controller.send_message("written before switching").await.unwrap();
    assert_eq!(harness.controller.transcript().len(), 1);
    harness.drain();

    let err = harness
        .controller
        .select_conversation(Some("c2"))
        .await
        .unwrap_err();

    assert_eq!(err, ChatError::server(503, "history unavailable"));
    assert_eq!(harness.controller.selected_conversation(), Some("c2"));
    assert!(harness.controller.transcript().is_empty());
    let events = harness.drain();
    assert!(events.contains(&ControllerEvent::TranscriptChanged));
    assert!(events.contains(&ControllerEvent::Notify(Notification::error(
        "Failed to load history: history unavailable"
    ))));
}
