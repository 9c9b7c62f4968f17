use super::{publish, welcome, Clock, Ticker};
use crate::content::{ContentResult, ContentSource};
use crate::debate::{ApplyOutcome, ContentRequest, DebateEngine, DebateView, RequestTicket};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::timer::{ClockFormat, Countdown};
use crate::types::{GameConfig, Screen};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

type ContentReply = (RequestTicket, ContentResult<String>);

pub struct DebateSession {
    engine: DebateEngine,
    clock: Clock,
    source: Arc<dyn ContentSource>,
    events: broadcast::Sender<ServerMessage>,
}

impl DebateSession {
    pub fn new(
        engine: DebateEngine,
        config: &GameConfig,
        source: Arc<dyn ContentSource>,
        events: broadcast::Sender<ServerMessage>,
    ) -> Self {
        Self {
            engine,
            clock: Clock::new(
                Countdown::from_secs(config.debate_seconds)
                    .with_format(ClockFormat::PaddedMinutes),
            ),
            source,
            events,
        }
    }

    /// Run until the countdown ends or `actions` closes; returns the final snapshot
    pub async fn run(mut self, mut actions: mpsc::Receiver<ClientMessage>) -> DebateView {
        let (replies_tx, mut replies_rx) = mpsc::unbounded_channel::<ContentReply>();

        publish(&self.events, welcome(Screen::Debate));
        let requests = self.engine.start();
        self.dispatch(requests, &replies_tx);
        self.publish_state();
        self.clock.publish(&self.events);

        let mut ticker = Ticker::new();
        loop {
            tokio::select! {
                elapsed = ticker.tick() => {
                    let requests = self.engine.on_tick(elapsed);
                    if !requests.is_empty() {
                        self.dispatch(requests, &replies_tx);
                        self.publish_state();
                    }
                    if self.clock.tick(elapsed, &self.events) {
                        self.engine.expire();
                        self.publish_state();
                        break;
                    }
                }

                Some((ticket, result)) = replies_rx.recv() => {
                    if self.engine.apply(&ticket, result) == ApplyOutcome::Applied {
                        self.publish_state();
                    }
                }

                action = actions.recv() => {
                    match action {
                        Some(msg) => self.handle(msg),
                        None => {
                            tracing::info!("Action channel closed, ending debate session");
                            self.engine.expire();
                            break;
                        }
                    }
                }
            }
        }

        publish(
            &self.events,
            ServerMessage::Complete {
                screen: Screen::Debate,
            },
        );
        self.engine.view()
    }

    fn handle(&mut self, msg: ClientMessage) {
        tracing::debug!("Debate action: {:?}", msg);
        match msg {
            ClientMessage::Choose { index } => match self.engine.choose(index) {
                Ok(()) => self.publish_state(),
                Err(e) => publish(
                    &self.events,
                    ServerMessage::error("INVALID_CHOICE", e.to_string()),
                ),
            },
            _ => publish(
                &self.events,
                ServerMessage::error("WRONG_SCREEN", "No bias quiz is running"),
            ),
        }
    }

    /// Run each request on its own task; results come back through `replies`
    fn dispatch(
        &self,
        requests: Vec<ContentRequest>,
        replies: &mpsc::UnboundedSender<ContentReply>,
    ) {
        for request in requests {
            let source = self.source.clone();
            let replies = replies.clone();
            tokio::spawn(async move {
                let ticket = request.ticket().clone();
                let result = match request {
                    ContentRequest::OpponentArgument {
                        topic,
                        history,
                        knobs,
                        ..
                    } => source.opponent_argument(&topic, &history, knobs).await,
                    ContentRequest::CandidateArguments { topic, knobs, .. } => {
                        source.candidate_arguments_raw(&topic, knobs).await
                    }
                };
                // The session may already be over
                let _ = replies.send((ticket, result));
            });
        }
    }

    fn publish_state(&self) {
        publish(
            &self.events,
            ServerMessage::DebateState {
                debate: self.engine.view(),
            },
        );
    }
}
