use super::{publish, welcome, Clock, Ticker};
use crate::bias::{BiasQuiz, PhraseDictionary};
use crate::content::{ContentSource, DEFAULT_HEADLINE};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::timer::Countdown;
use crate::types::{GameConfig, QuizId, Screen};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

/// How a bias quiz ended
#[derive(Debug, Clone, Serialize)]
pub struct BiasSummary {
    pub quiz_id: QuizId,
    pub found: Vec<String>,
    pub polarization_score: u32,
    /// True when the countdown ran out before completion
    pub timed_out: bool,
}

/// Fetch the headline for `question_id` and build a quiz around it.
/// A failed lookup falls back to the built-in headline.
pub async fn load_quiz(
    source: &dyn ContentSource,
    question_id: &str,
    dictionary: PhraseDictionary,
    config: &GameConfig,
) -> BiasQuiz {
    let headline = match source.headline_text(question_id).await {
        Ok(headline) => headline,
        Err(e) => {
            tracing::warn!(
                "Headline for question {} unavailable, using built-in: {}",
                question_id,
                e
            );
            DEFAULT_HEADLINE.to_string()
        }
    };
    let question_number = question_id.trim().parse().unwrap_or(1);
    BiasQuiz::new(&headline, question_number, dictionary, config)
}

pub struct BiasSession {
    quiz: BiasQuiz,
    clock: Clock,
    events: broadcast::Sender<ServerMessage>,
}

impl BiasSession {
    pub fn new(
        quiz: BiasQuiz,
        config: &GameConfig,
        events: broadcast::Sender<ServerMessage>,
    ) -> Self {
        Self {
            quiz,
            clock: Clock::new(Countdown::from_secs(config.bias_seconds)),
            events,
        }
    }

    /// Run until the quiz completes, the countdown ends or `actions` closes
    pub async fn run(mut self, mut actions: mpsc::Receiver<ClientMessage>) -> BiasSummary {
        tracing::info!("Bias session {} started", self.quiz.id());
        publish(&self.events, welcome(Screen::Bias));
        self.publish_state();
        self.clock.publish(&self.events);

        let mut ticker = Ticker::new();
        let timed_out = loop {
            tokio::select! {
                elapsed = ticker.tick() => {
                    if self.quiz.on_tick(elapsed) {
                        self.publish_state();
                        break false;
                    }
                    if self.clock.tick(elapsed, &self.events) {
                        tracing::info!("Bias session {} ran out of time", self.quiz.id());
                        break true;
                    }
                }

                action = actions.recv() => {
                    match action {
                        Some(msg) => self.handle(msg),
                        None => {
                            tracing::info!("Action channel closed, ending bias session");
                            break !self.quiz.is_complete();
                        }
                    }
                }
            }
        };

        publish(
            &self.events,
            ServerMessage::Complete {
                screen: Screen::Bias,
            },
        );

        BiasSummary {
            quiz_id: self.quiz.id().to_string(),
            found: self
                .quiz
                .selections()
                .iter()
                .map(|s| s.matched_phrase.clone())
                .collect(),
            polarization_score: self.quiz.polarization_score(),
            timed_out,
        }
    }

    fn handle(&mut self, msg: ClientMessage) {
        tracing::debug!("Bias action: {:?}", msg);
        let outcome = match msg {
            ClientMessage::StartPick { index } => self.quiz.start_pick(index),
            ClientMessage::ExtendPick { index } => self.quiz.extend_pick(index),
            ClientMessage::CommitPick => self.quiz.commit_pick(),
            ClientMessage::Choose { .. } => {
                publish(
                    &self.events,
                    ServerMessage::error("WRONG_SCREEN", "No debate is running"),
                );
                return;
            }
        };

        publish(&self.events, ServerMessage::PickResult { outcome });
        self.publish_state();
    }

    fn publish_state(&self) {
        publish(
            &self.events,
            ServerMessage::BiasState {
                quiz: self.quiz.view(),
            },
        );
    }
}
