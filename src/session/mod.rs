//! Async hosts for the two screens.
//!
//! A session owns one engine, drives it with a fixed-interval tick, feeds it
//! renderer actions from an mpsc channel and publishes snapshots on a
//! broadcast channel. Content lookups run as spawned tasks and report back
//! through a channel so the engine itself stays synchronous.

mod bias;
mod debate;

pub use bias::{load_quiz, BiasSession, BiasSummary};
pub use debate::DebateSession;

use crate::protocol::ServerMessage;
use crate::timer::Countdown;
use crate::types::Screen;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{Instant, Interval, MissedTickBehavior};

pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
pub const PROTOCOL_VERSION: &str = "1.0";

const EVENT_BUFFER: usize = 256;

/// Broadcast channel sessions publish on
pub fn event_channel() -> (
    broadcast::Sender<ServerMessage>,
    broadcast::Receiver<ServerMessage>,
) {
    broadcast::channel(EVENT_BUFFER)
}

/// Interval that reports the time elapsed since its previous tick
struct Ticker {
    interval: Interval,
    last: Instant,
}

impl Ticker {
    fn new() -> Self {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            last: Instant::now(),
        }
    }

    async fn tick(&mut self) -> Duration {
        let now = self.interval.tick().await;
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed
    }
}

/// Shared countdown plumbing: only publishes when the shown second changes
struct Clock {
    countdown: Countdown,
    shown: Option<u64>,
}

impl Clock {
    fn new(countdown: Countdown) -> Self {
        Self {
            countdown,
            shown: None,
        }
    }

    /// Returns true on the tick the countdown runs out
    fn tick(&mut self, elapsed: Duration, events: &broadcast::Sender<ServerMessage>) -> bool {
        let expired = self.countdown.tick(elapsed);
        self.publish(events);
        expired
    }

    fn publish(&mut self, events: &broadcast::Sender<ServerMessage>) {
        let view = self.countdown.view();
        if self.shown == Some(view.seconds_left) {
            return;
        }
        self.shown = Some(view.seconds_left);
        publish(
            events,
            ServerMessage::Timer {
                seconds_left: view.seconds_left,
                display: view.display,
            },
        );
    }
}

fn welcome(screen: Screen) -> ServerMessage {
    ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        screen,
        server_now: chrono::Utc::now().to_rfc3339(),
    }
}

fn publish(events: &broadcast::Sender<ServerMessage>, msg: ServerMessage) {
    // No subscribers is fine
    let _ = events.send(msg);
}
