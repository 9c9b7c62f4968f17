//! Turn-based debate round machine for the "Burst the Bubble" screen.
//!
//! The engine never performs I/O. It hands out [`ContentRequest`]s tagged with
//! a [`RequestTicket`] and accepts their results through [`DebateEngine::apply`],
//! dropping any result whose round has already passed or that arrives after
//! the countdown expired.

use super::parse::{candidate_arguments_or_default, CandidateArguments};
use crate::content::ContentResult;
use crate::types::{DebateId, GameConfig, GenerationKnobs};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const THINKING_PLACEHOLDER: &str = "Thinking...";
pub const UNAVAILABLE_PLACEHOLDER: &str = "⚠️ Unable to fetch AI argument.";
pub const EMPTY_PLACEHOLDER: &str = "No response";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DebateError {
    #[error("Cannot choose an argument while {0:?}")]
    NotAwaitingChoice(DebatePhase),

    #[error("Option {0} does not exist, expected 0, 1 or 2")]
    InvalidOption(usize),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebatePhase {
    Initializing,
    AwaitingUserChoice,
    Advancing,
    TimeExpired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeRole {
    User,
    Assistant,
}

/// One line of the debate so far
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exchange {
    pub role: ExchangeRole,
    pub text: String,
    pub ts: String,
}

impl Exchange {
    fn new(role: ExchangeRole, text: String) -> Self {
        Self {
            role,
            text,
            ts: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    OpponentArgument,
    CandidateArguments,
}

/// Identity of an outstanding request, checked before its result is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub debate_id: DebateId,
    pub round: u32,
    pub kind: RequestKind,
}

/// Work the host must perform on the engine's behalf
#[derive(Debug, Clone)]
pub enum ContentRequest {
    /// One sentence against the topic, conditioned on the history
    OpponentArgument {
        ticket: RequestTicket,
        topic: String,
        history: Vec<Exchange>,
        knobs: GenerationKnobs,
    },
    /// Three fresh sentences in favour of the topic
    CandidateArguments {
        ticket: RequestTicket,
        topic: String,
        knobs: GenerationKnobs,
    },
}

impl ContentRequest {
    pub fn ticket(&self) -> &RequestTicket {
        match self {
            ContentRequest::OpponentArgument { ticket, .. }
            | ContentRequest::CandidateArguments { ticket, .. } => ticket,
        }
    }
}

/// Whether a result was used or thrown away as stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpponentLine {
    Thinking,
    Argument(String),
    Empty,
    Unavailable,
}

impl OpponentLine {
    pub fn text(&self) -> &str {
        match self {
            OpponentLine::Thinking => THINKING_PLACEHOLDER,
            OpponentLine::Argument(text) => text,
            OpponentLine::Empty => EMPTY_PLACEHOLDER,
            OpponentLine::Unavailable => UNAVAILABLE_PLACEHOLDER,
        }
    }

    fn is_resolved(&self) -> bool {
        !matches!(self, OpponentLine::Thinking)
    }
}

#[derive(Debug, Clone)]
pub struct Round {
    pub number: u32,
    pub opponent: OpponentLine,
    pub candidates: Option<CandidateArguments>,
    pub chosen_index: Option<usize>,
}

impl Round {
    fn new(number: u32) -> Self {
        Self {
            number,
            opponent: OpponentLine::Thinking,
            candidates: None,
            chosen_index: None,
        }
    }

    fn is_resolved(&self) -> bool {
        self.opponent.is_resolved() && self.candidates.is_some()
    }
}

/// Serializable snapshot of the debate for rendering
#[derive(Debug, Clone, Serialize)]
pub struct DebateView {
    pub id: DebateId,
    pub topic: String,
    pub phase: DebatePhase,
    pub round_number: u32,
    pub opponent_argument: String,
    /// Present only while an option can be chosen
    pub options: Option<Vec<String>>,
    pub chosen_index: Option<usize>,
    pub history: Vec<Exchange>,
}

type CompletionCallback = Box<dyn FnOnce() + Send>;

pub struct DebateEngine {
    id: DebateId,
    topic: String,
    opponent_knobs: GenerationKnobs,
    options_knobs: GenerationKnobs,
    advance_delay: Duration,
    phase: DebatePhase,
    round: Round,
    history: Vec<Exchange>,
    started: bool,
    /// Set while waiting to fetch the next round after a choice
    advance_remaining: Option<Duration>,
    on_complete: Option<CompletionCallback>,
}

impl DebateEngine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            topic: config.debate_topic.clone(),
            opponent_knobs: config.opponent_knobs,
            options_knobs: config.options_knobs,
            advance_delay: config.advance_delay,
            phase: DebatePhase::Initializing,
            round: Round::new(1),
            history: Vec::new(),
            started: false,
            advance_remaining: None,
            on_complete: None,
        }
    }

    /// Register the callback invoked once the debate time runs out
    pub fn on_complete(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn phase(&self) -> DebatePhase {
        self.phase
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn opponent_text(&self) -> &str {
        self.round.opponent.text()
    }

    /// Candidate arguments, only once the round is ready for a choice
    pub fn selectable_options(&self) -> Option<&CandidateArguments> {
        match self.phase {
            DebatePhase::AwaitingUserChoice => self.round.candidates.as_ref(),
            _ => None,
        }
    }

    /// Issue the first round's requests; later calls return nothing
    pub fn start(&mut self) -> Vec<ContentRequest> {
        if self.started || self.phase != DebatePhase::Initializing {
            return Vec::new();
        }
        self.started = true;
        tracing::info!("Debate {} started on topic {}", self.id, self.topic);
        self.round_requests()
    }

    /// Apply the result of a request if it is still relevant
    pub fn apply(&mut self, ticket: &RequestTicket, result: ContentResult<String>) -> ApplyOutcome {
        if !self.is_current(ticket) {
            tracing::debug!(
                "Discarding stale {:?} result for round {} (now round {}, {:?})",
                ticket.kind,
                ticket.round,
                self.round.number,
                self.phase
            );
            return ApplyOutcome::Discarded;
        }

        match ticket.kind {
            RequestKind::OpponentArgument => {
                if self.round.opponent.is_resolved() {
                    return ApplyOutcome::Discarded;
                }
                self.round.opponent = match result {
                    Ok(text) if text.trim().is_empty() => OpponentLine::Empty,
                    Ok(text) => OpponentLine::Argument(text.trim().to_string()),
                    Err(e) => {
                        tracing::warn!("Opponent argument unavailable: {}", e);
                        OpponentLine::Unavailable
                    }
                };
            }
            RequestKind::CandidateArguments => {
                if self.round.candidates.is_some() {
                    return ApplyOutcome::Discarded;
                }
                self.round.candidates = Some(candidate_arguments_or_default(result));
            }
        }

        if self.round.is_resolved() {
            self.phase = DebatePhase::AwaitingUserChoice;
            tracing::debug!("Round {} ready for a choice", self.round.number);
        }
        ApplyOutcome::Applied
    }

    /// Pick candidate `index` (0-based) as the user's argument for this round
    pub fn choose(&mut self, index: usize) -> Result<(), DebateError> {
        if self.phase != DebatePhase::AwaitingUserChoice {
            return Err(DebateError::NotAwaitingChoice(self.phase));
        }
        let chosen = self
            .round
            .candidates
            .as_ref()
            .and_then(|c| c.get(index))
            .cloned()
            .ok_or(DebateError::InvalidOption(index))?;

        if let OpponentLine::Argument(text) = &self.round.opponent {
            self.history
                .push(Exchange::new(ExchangeRole::Assistant, text.clone()));
        }
        self.history.push(Exchange::new(ExchangeRole::User, chosen));

        self.round.chosen_index = Some(index);
        self.phase = DebatePhase::Advancing;
        self.advance_remaining = Some(self.advance_delay);
        tracing::info!("Round {}: user chose option {}", self.round.number, index);
        Ok(())
    }

    /// Advance the post-choice delay; returns the next round's requests when it ends
    pub fn on_tick(&mut self, elapsed: Duration) -> Vec<ContentRequest> {
        if self.phase != DebatePhase::Advancing {
            return Vec::new();
        }
        let Some(remaining) = self.advance_remaining else {
            return Vec::new();
        };

        let remaining = remaining.saturating_sub(elapsed);
        if !remaining.is_zero() {
            self.advance_remaining = Some(remaining);
            return Vec::new();
        }

        self.advance_remaining = None;
        self.round = Round::new(self.round.number + 1);
        self.round_requests()
    }

    /// The shared countdown reached zero. Returns false if already expired.
    pub fn expire(&mut self) -> bool {
        if self.phase == DebatePhase::TimeExpired {
            return false;
        }
        self.phase = DebatePhase::TimeExpired;
        self.advance_remaining = None;
        tracing::info!(
            "Debate {} over after {} rounds",
            self.id,
            self.round.number
        );

        if let Some(callback) = self.on_complete.take() {
            callback();
        }
        true
    }

    pub fn view(&self) -> DebateView {
        DebateView {
            id: self.id.clone(),
            topic: self.topic.clone(),
            phase: self.phase,
            round_number: self.round.number,
            opponent_argument: self.opponent_text().to_string(),
            options: self.selectable_options().map(|c| c.to_vec()),
            chosen_index: self.round.chosen_index,
            history: self.history.clone(),
        }
    }

    fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.debate_id == self.id
            && ticket.round == self.round.number
            && matches!(
                self.phase,
                DebatePhase::Initializing | DebatePhase::Advancing
            )
            && self.advance_remaining.is_none()
    }

    fn ticket(&self, kind: RequestKind) -> RequestTicket {
        RequestTicket {
            debate_id: self.id.clone(),
            round: self.round.number,
            kind,
        }
    }

    fn round_requests(&self) -> Vec<ContentRequest> {
        vec![
            ContentRequest::OpponentArgument {
                ticket: self.ticket(RequestKind::OpponentArgument),
                topic: self.topic.clone(),
                history: self.history.clone(),
                knobs: self.opponent_knobs,
            },
            ContentRequest::CandidateArguments {
                ticket: self.ticket(RequestKind::CandidateArguments),
                topic: self.topic.clone(),
                knobs: self.options_knobs,
            },
        ]
    }
}
