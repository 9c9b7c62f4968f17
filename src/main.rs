use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediawise::bias::PhraseDictionary;
use mediawise::content::{
    ContentSource, HeadlineStore, LlmContentSource, RestHeadlineStore, StaticHeadlines,
};
use mediawise::debate::DebateEngine;
use mediawise::llm::{self, LlmManager, LlmProvider};
use mediawise::protocol::{ClientMessage, ServerMessage};
use mediawise::session::{self, BiasSession, DebateSession};
use mediawise::types::{GameConfig, Screen};

const USAGE: &str = "Usage: mediawise [bias [QUESTION_ID] | debate]";

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediawise=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (screen, question_id) = match args.first().map(String::as_str) {
        None | Some("bias") => (
            Screen::Bias,
            args.get(1).cloned().unwrap_or_else(|| "1".to_string()),
        ),
        Some("debate") => (Screen::Debate, String::new()),
        Some(other) => {
            eprintln!("Unknown screen '{}'\n{}", other, USAGE);
            std::process::exit(2);
        }
    };

    let mut config = GameConfig::from_env();
    let llm_config = llm::LlmConfig::from_env();
    config.opponent_knobs.max_tokens = llm_config.default_max_tokens;
    config.options_knobs.max_tokens = llm_config.default_max_tokens;

    let llm_manager = match llm_config.build_manager() {
        Ok(manager) => {
            tracing::info!(
                "LLM providers initialized: {:?}",
                manager.provider_names()
            );
            manager
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize LLM providers: {}. Debate lines will fall back.",
                e
            );
            LlmManager::new(Vec::new())
        }
    };
    let llm: Arc<dyn LlmProvider> = Arc::new(llm_manager);

    let headlines: Arc<dyn HeadlineStore> = match RestHeadlineStore::from_env() {
        Ok(Some(store)) => Arc::new(store),
        Ok(None) => Arc::new(StaticHeadlines::builtin()),
        Err(e) => {
            tracing::warn!("Headline store misconfigured, using built-in: {}", e);
            Arc::new(StaticHeadlines::builtin())
        }
    };
    let source: Arc<dyn ContentSource> = Arc::new(LlmContentSource::new(
        llm,
        headlines,
        llm_config.default_timeout,
    ));

    let (events, _) = session::event_channel();
    let (actions_tx, actions_rx) = mpsc::channel(64);
    let writer = write_events(events.subscribe());
    tokio::spawn(read_actions(actions_tx, events.clone()));

    tracing::info!("Starting {:?} screen", screen);
    match screen {
        Screen::Bias => {
            let dictionary = load_dictionary(&config);
            let quiz =
                session::load_quiz(source.as_ref(), &question_id, dictionary, &config).await;
            let run = BiasSession::new(quiz, &config, events).run(actions_rx);
            let (summary, ()) = futures::future::join(run, writer).await;
            tracing::info!(
                "Found {:?}, polarization {}%",
                summary.found,
                summary.polarization_score
            );
        }
        Screen::Debate => {
            let engine = DebateEngine::new(&config);
            let run = DebateSession::new(engine, &config, source, events).run(actions_rx);
            let (last, ()) = futures::future::join(run, writer).await;
            tracing::info!(
                "Debate ended after {} rounds, {} lines exchanged",
                last.round_number,
                last.history.len()
            );
        }
    }

    // A pending stdin read would otherwise hold up runtime shutdown
    std::process::exit(0);
}

fn load_dictionary(config: &GameConfig) -> PhraseDictionary {
    let Some(path) = &config.phrase_dictionary_path else {
        return PhraseDictionary::builtin();
    };
    match PhraseDictionary::from_json_file(path) {
        Ok(dictionary) => {
            tracing::info!("Loaded {} phrases from {}", dictionary.len(), path);
            dictionary
        }
        Err(e) => {
            tracing::warn!("Failed to load phrase dictionary {}: {}", path, e);
            PhraseDictionary::builtin()
        }
    }
}

/// Forward JSON lines from stdin to the session
async fn read_actions(
    actions: mpsc::Sender<ClientMessage>,
    events: broadcast::Sender<ServerMessage>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        tracing::debug!("Received message: {}", line);
        match serde_json::from_str::<ClientMessage>(&line) {
            Ok(msg) => {
                if actions.send(msg).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!("Failed to parse client message: {}", e);
                let _ = events.send(ServerMessage::error(
                    "PARSE_ERROR",
                    format!("Invalid message format: {}", e),
                ));
            }
        }
    }
}

/// Write every published message to stdout until the screen completes
async fn write_events(mut rx: broadcast::Receiver<ServerMessage>) {
    let mut stdout = tokio::io::stdout();
    loop {
        let msg = match rx.recv().await {
            Ok(msg) => msg,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Output fell behind, skipped {} messages", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if let Ok(mut json) = serde_json::to_string(&msg) {
            json.push('\n');
            if stdout.write_all(json.as_bytes()).await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }

        if matches!(msg, ServerMessage::Complete { .. }) {
            break;
        }
    }
}
