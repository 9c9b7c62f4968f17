use crate::bias::{BiasQuizView, PickOutcome};
use crate::debate::DebateView;
use crate::types::Screen;
use serde::{Deserialize, Serialize};

/// Pointer and choice events coming from the renderer, one JSON object per line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Pointer pressed on a token
    StartPick {
        index: usize,
    },
    /// Pointer entered a token while held
    ExtendPick {
        index: usize,
    },
    /// Pointer released
    CommitPick,
    /// Debate: pick candidate argument 0, 1 or 2
    Choose {
        index: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        screen: Screen,
        server_now: String,
    },
    BiasState {
        quiz: BiasQuizView,
    },
    PickResult {
        outcome: PickOutcome,
    },
    DebateState {
        debate: DebateView,
    },
    Timer {
        seconds_left: u64,
        display: String,
    },
    /// The screen is over; the renderer should move on
    Complete {
        screen: Screen,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}
