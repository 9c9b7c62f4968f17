use async_trait::async_trait;
use mediawise::bias::{BiasQuiz, PhraseDictionary, PickClass, PickOutcome};
use mediawise::content::{ContentSource, LlmContentSource, StaticHeadlines, DEFAULT_HEADLINE};
use mediawise::debate::{
    ApplyOutcome, ContentRequest, DebateEngine, DebatePhase, ExchangeRole, THINKING_PLACEHOLDER,
};
use mediawise::llm::{
    GenerateRequest, GenerateResponse, LlmError, LlmProvider, LlmResult, ResponseMetadata,
};
use mediawise::protocol::{ClientMessage, ServerMessage};
use mediawise::session::{self, DebateSession};
use mediawise::types::GameConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Provider that answers list requests with a numbered list and
/// everything else with a one-line rebuttal
struct ScriptedProvider {
    calls: AtomicUsize,
    fail: bool,
}

impl ScriptedProvider {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail,
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LlmError::ApiError("rate limited".to_string()));
        }

        let text = if request.system.contains("JSON array") {
            "1) First.\n2) Second.\n3) Third.".to_string()
        } else {
            format!("Rebuttal number {}.", n)
        };
        Ok(GenerateResponse {
            text,
            metadata: ResponseMetadata {
                provider: "scripted".to_string(),
                model: "test".to_string(),
                tokens_used: None,
                latency_ms: 1,
            },
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn content_source(provider: Arc<ScriptedProvider>) -> Arc<dyn ContentSource> {
    Arc::new(LlmContentSource::new(
        provider,
        Arc::new(StaticHeadlines::builtin()),
        Duration::from_secs(5),
    ))
}

/// Perform a request the way a host would and hand back the raw result
async fn fulfil(
    source: &Arc<dyn ContentSource>,
    request: &ContentRequest,
) -> mediawise::content::ContentResult<String> {
    match request {
        ContentRequest::OpponentArgument {
            topic,
            history,
            knobs,
            ..
        } => source.opponent_argument(topic, history, *knobs).await,
        ContentRequest::CandidateArguments { topic, knobs, .. } => {
            source.candidate_arguments_raw(topic, *knobs).await
        }
    }
}

/// End-to-end flow of the bias screen: headline lookup, picks, completion
#[tokio::test]
async fn test_full_bias_quiz_flow() {
    let config = GameConfig::default();
    let source = content_source(ScriptedProvider::new(false));
    let mut quiz =
        session::load_quiz(source.as_ref(), "1", PhraseDictionary::builtin(), &config).await;

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    quiz.on_complete(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let text: String = quiz.tokens().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(text, DEFAULT_HEADLINE);

    // Drag across "the truth just" out of order
    assert_eq!(quiz.start_pick(24), PickOutcome::Pending);
    quiz.extend_pick(20);
    quiz.extend_pick(22);
    assert_eq!(
        quiz.commit_pick(),
        PickOutcome::Committed {
            phrase: "just the truth".to_string()
        }
    );
    assert_eq!(quiz.selections()[0].token_indices, vec![20, 21, 22, 23, 24]);
    assert_eq!(quiz.selections()[0].text, "just the truth");

    // Click-built "plain sight?"
    assert_eq!(quiz.start_pick(30), PickOutcome::Pending);
    quiz.commit_pick();
    assert!(matches!(quiz.start_pick(32), PickOutcome::Committed { .. }));

    // Two phrases: not yet armed
    assert!(!quiz.on_tick(Duration::from_secs(10)));

    assert!(matches!(quiz.start_pick(26), PickOutcome::Committed { .. }));
    assert!(!quiz.on_tick(Duration::from_millis(1500)));
    assert!(quiz.on_tick(Duration::from_millis(500)));
    assert!(!quiz.on_tick(Duration::from_secs(5)));
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    let view = quiz.view();
    assert!(view.complete);
    assert_eq!(view.polarization_score, 60);
    assert_eq!(view.remaining, 2);
    assert_eq!(
        view.tokens[22].class,
        PickClass::Committed {
            color: "#E9D5FF".to_string()
        }
    );

    // Clicking anywhere inside a found phrase removes all of it
    assert_eq!(
        quiz.start_pick(22),
        PickOutcome::Removed {
            phrase: "just the truth".to_string()
        }
    );
    assert_eq!(quiz.selections().len(), 2);
    assert!(quiz.selections().iter().all(|s| !s.contains(22)));
}

/// A long drag commits under the first declared key it contains
#[test]
fn test_long_selection_uses_first_declared_key() {
    let mut quiz = BiasQuiz::new(
        DEFAULT_HEADLINE,
        1,
        PhraseDictionary::builtin(),
        &GameConfig::default(),
    );

    // "it's just the truth hiding", started from "just" so "it's" alone never commits
    quiz.start_pick(20);
    quiz.extend_pick(26);
    quiz.extend_pick(18);
    assert_eq!(
        quiz.commit_pick(),
        PickOutcome::Committed {
            phrase: "just the truth".to_string()
        }
    );
    let selection = &quiz.selections()[0];
    assert_eq!(selection.text, "it's just the truth hiding");
    assert_eq!(selection.token_indices, (18..=26).collect::<Vec<_>>());
}

/// Debate engine driven by hand against the LLM-backed content source
#[tokio::test]
async fn test_full_debate_flow() {
    let config = GameConfig::default();
    let source = content_source(ScriptedProvider::new(false));
    let mut engine = DebateEngine::new(&config);

    let requests = engine.start();
    assert_eq!(requests.len(), 2);
    assert!(engine.start().is_empty());
    assert_eq!(engine.opponent_text(), THINKING_PLACEHOLDER);

    for request in &requests {
        let result = fulfil(&source, request).await;
        assert_eq!(engine.apply(request.ticket(), result), ApplyOutcome::Applied);
    }
    assert_eq!(engine.phase(), DebatePhase::AwaitingUserChoice);
    assert_eq!(
        engine.selectable_options().map(|o| o.to_vec()),
        Some(vec![
            "First.".to_string(),
            "Second.".to_string(),
            "Third.".to_string()
        ])
    );

    for expected_round in 2..=4 {
        engine.choose(2).unwrap();
        assert!(engine.on_tick(Duration::from_millis(1000)).is_empty());
        let requests = engine.on_tick(Duration::from_millis(200));
        assert_eq!(engine.round().number, expected_round);

        for request in &requests {
            let result = fulfil(&source, request).await;
            engine.apply(request.ticket(), result);
        }
        assert_eq!(engine.phase(), DebatePhase::AwaitingUserChoice);
    }

    let history = engine.history();
    assert_eq!(history.len(), 6);
    assert_eq!(history[0].role, ExchangeRole::Assistant);
    assert_eq!(history[1].role, ExchangeRole::User);
    assert_eq!(history[1].text, "Third.");

    // Time runs out while the next round is in flight
    engine.choose(0).unwrap();
    let pending = engine.on_tick(Duration::from_secs(2));
    assert_eq!(pending.len(), 2);
    assert!(engine.expire());

    for request in &pending {
        let result = fulfil(&source, request).await;
        assert_eq!(
            engine.apply(request.ticket(), result),
            ApplyOutcome::Discarded
        );
    }
    let view = engine.view();
    assert_eq!(view.phase, DebatePhase::TimeExpired);
    assert_eq!(view.round_number, 5);
    assert_eq!(view.opponent_argument, THINKING_PLACEHOLDER);
    assert!(view.options.is_none());
}

/// Failing provider: placeholder opponent line and the built-in options
#[tokio::test(start_paused = true)]
async fn test_debate_session_with_failing_provider() {
    let config = GameConfig {
        debate_seconds: 3,
        ..GameConfig::default()
    };
    let provider = ScriptedProvider::new(true);
    let source = content_source(provider.clone());
    let (events, mut rx) = session::event_channel();
    let (actions_tx, actions_rx) = mpsc::channel(16);

    let session = DebateSession::new(DebateEngine::new(&config), &config, source, events);
    let handle = tokio::spawn(session.run(actions_rx));

    let ready = loop {
        if let ServerMessage::DebateState { debate } = rx.recv().await.unwrap() {
            if debate.phase == DebatePhase::AwaitingUserChoice {
                break debate;
            }
        }
    };
    assert_eq!(ready.opponent_argument, "⚠️ Unable to fetch AI argument.");
    let options = ready.options.unwrap();
    assert_eq!(options.len(), 3);
    assert_eq!(
        options[0],
        "AI helps people do creative work faster so we can focus on what matters."
    );

    actions_tx
        .send(ClientMessage::Choose { index: 0 })
        .await
        .unwrap();
    actions_tx
        .send(ClientMessage::StartPick { index: 0 })
        .await
        .unwrap();

    let last = handle.await.unwrap();
    assert_eq!(last.phase, DebatePhase::TimeExpired);
    // The placeholder never enters the history
    assert_eq!(last.history.len(), 1);
    assert_eq!(last.history[0].role, ExchangeRole::User);
    assert!(provider.calls.load(Ordering::SeqCst) >= 2);

    let mut saw_wrong_screen = false;
    let mut saw_complete = false;
    while let Ok(msg) = rx.try_recv() {
        let json = serde_json::to_value(&msg).unwrap();
        match json["t"].as_str() {
            Some("error") => saw_wrong_screen |= json["code"] == "WRONG_SCREEN",
            Some("complete") => saw_complete = json["screen"] == "debate",
            _ => {}
        }
    }
    assert!(saw_wrong_screen);
    assert!(saw_complete);
}
