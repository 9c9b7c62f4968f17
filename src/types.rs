use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque ID types for type safety
pub type QuizId = String;
pub type DebateId = String;

/// Topic argued over in the "Burst the Bubble" debate screen
pub const DEFAULT_DEBATE_TOPIC: &str =
    "\"AI is an insult to life itself.\" Miyazaki's predictions come true.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Bias,
    Debate,
}

/// Generation knobs passed along with every content request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationKnobs {
    /// Higher values produce more varied phrasing
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Countdown for the bias-spotting screen
    pub bias_seconds: u32,
    /// Countdown for the debate screen
    pub debate_seconds: u32,
    /// Number of found phrases that completes the bias quiz
    pub completion_threshold: usize,
    /// Number of phrases the score and "left" counter are measured against
    pub phrase_target: usize,
    /// Delay between reaching the threshold and signalling completion
    pub completion_delay: Duration,
    /// Delay after a debate choice before the next round is fetched
    pub advance_delay: Duration,
    pub debate_topic: String,
    pub opponent_knobs: GenerationKnobs,
    pub options_knobs: GenerationKnobs,
    /// Optional JSON file replacing the built-in phrase dictionary
    pub phrase_dictionary_path: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bias_seconds: 120,
            debate_seconds: 90,
            completion_threshold: 3,
            phrase_target: 5,
            completion_delay: Duration::from_millis(2000),
            advance_delay: Duration::from_millis(1200),
            debate_topic: DEFAULT_DEBATE_TOPIC.to_string(),
            opponent_knobs: GenerationKnobs {
                temperature: 0.7,
                max_tokens: 200,
            },
            options_knobs: GenerationKnobs {
                temperature: 0.8,
                max_tokens: 200,
            },
            phrase_dictionary_path: None,
        }
    }
}

impl GameConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bias_seconds = std::env::var("BIAS_SECONDS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|s: &u32| *s > 0)
            .unwrap_or(defaults.bias_seconds);

        let debate_seconds = std::env::var("DEBATE_SECONDS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|s: &u32| *s > 0)
            .unwrap_or(defaults.debate_seconds);

        let debate_topic = std::env::var("DEBATE_TOPIC")
            .ok()
            .and_then(|topic| {
                let trimmed = topic.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or(defaults.debate_topic);

        let phrase_dictionary_path = std::env::var("PHRASE_DICTIONARY").ok().and_then(|path| {
            let trimmed = path.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        Self {
            bias_seconds,
            debate_seconds,
            debate_topic,
            phrase_dictionary_path,
            ..defaults
        }
    }
}
