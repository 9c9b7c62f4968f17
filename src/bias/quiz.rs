//! Phrase selection engine for the "Spot the Bias" screen.
//!
//! Players click or drag across the words of a headline. A gesture whose
//! covered text matches the phrase dictionary is committed as a found phrase;
//! clicking inside a found phrase removes it again.

use super::dictionary::PhraseDictionary;
use super::tokens::{tokenize, Token};
use crate::types::{GameConfig, QuizId};
use serde::Serialize;
use std::time::Duration;

/// A committed, matched run of contiguous tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Ascending, gap-free token indices including interior whitespace
    pub token_indices: Vec<usize>,
    /// Dictionary key that triggered the commit
    pub matched_phrase: String,
    pub display_color: String,
    /// Concatenated token texts of the run
    pub text: String,
}

impl Selection {
    pub fn contains(&self, index: usize) -> bool {
        self.token_indices.contains(&index)
    }
}

/// How a token should be rendered, in priority order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PickClass {
    Building,
    Dragging,
    Committed { color: String },
    Unselected,
}

/// Result of a pointer event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PickOutcome {
    /// Whitespace, out of range, or no gesture to act on
    Ignored,
    /// A found phrase was clicked and removed as a whole
    Removed { phrase: String },
    /// A new found phrase was committed
    Committed { phrase: String },
    /// The pick was recorded but nothing matched yet
    Pending,
    /// The drag was released without a match and discarded
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Gesture {
    Idle,
    /// Click-accumulated word picks waiting for a match
    Building { picks: Vec<usize> },
    /// Pointer held down; `touched` is in insertion order
    Dragging {
        picks: Vec<usize>,
        touched: Vec<usize>,
    },
}

type CompletionCallback = Box<dyn FnOnce() + Send>;

/// Fires the completion callback once the threshold has held for the delay
struct Completion {
    threshold: usize,
    delay: Duration,
    remaining: Option<Duration>,
    fired: bool,
    callback: Option<CompletionCallback>,
}

impl Completion {
    fn rearm(&mut self, committed: usize) {
        if self.fired {
            return;
        }
        self.remaining = (committed >= self.threshold).then_some(self.delay);
    }

    fn tick(&mut self, elapsed: Duration) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };

        let remaining = remaining.saturating_sub(elapsed);
        if !remaining.is_zero() {
            self.remaining = Some(remaining);
            return false;
        }

        self.remaining = None;
        self.fired = true;
        if let Some(callback) = self.callback.take() {
            callback();
        }
        true
    }
}

/// Token as exposed to a renderer
#[derive(Debug, Clone, Serialize)]
pub struct TokenView {
    #[serde(flatten)]
    pub token: Token,
    pub class: PickClass,
}

/// Serializable snapshot of the quiz for rendering
#[derive(Debug, Clone, Serialize)]
pub struct BiasQuizView {
    pub id: QuizId,
    pub question_number: u32,
    pub tokens: Vec<TokenView>,
    pub selections: Vec<Selection>,
    pub polarization_score: u32,
    pub remaining: usize,
    pub complete: bool,
}

pub struct BiasQuiz {
    id: QuizId,
    question_number: u32,
    tokens: Vec<Token>,
    dictionary: PhraseDictionary,
    selections: Vec<Selection>,
    gesture: Gesture,
    phrase_target: usize,
    completion: Completion,
}

impl BiasQuiz {
    pub fn new(
        headline: &str,
        question_number: u32,
        dictionary: PhraseDictionary,
        config: &GameConfig,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            question_number,
            tokens: tokenize(headline),
            dictionary,
            selections: Vec::new(),
            gesture: Gesture::Idle,
            phrase_target: config.phrase_target,
            completion: Completion {
                threshold: config.completion_threshold,
                delay: config.completion_delay,
                remaining: None,
                fired: false,
                callback: None,
            },
        }
    }

    /// Register the callback invoked once the quiz is complete
    pub fn on_complete(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.completion.callback = Some(Box::new(callback));
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn is_complete(&self) -> bool {
        self.completion.fired
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    /// Pointer pressed on a token.
    ///
    /// Pressing inside a found phrase removes the whole phrase. Otherwise the
    /// word either extends the click-built selection (when it is the next word
    /// before or after it) or starts a new one, and the result is checked for
    /// a match right away. Unless that check commits, a drag starts here.
    pub fn start_pick(&mut self, index: usize) -> PickOutcome {
        if !self.is_pickable(index) {
            return PickOutcome::Ignored;
        }

        if let Some(pos) = self.selection_at(index) {
            let removed = self.selections.remove(pos);
            self.gesture = Gesture::Idle;
            self.completion.rearm(self.selections.len());
            tracing::debug!("Removed found phrase '{}'", removed.matched_phrase);
            return PickOutcome::Removed {
                phrase: removed.matched_phrase,
            };
        }

        let mut picks = match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Building { picks } | Gesture::Dragging { picks, .. } => picks,
            Gesture::Idle => Vec::new(),
        };

        let adjacent = match (picks.iter().min(), picks.iter().max()) {
            (Some(&first), Some(&last)) => index + 2 == first || index == last + 2,
            _ => false,
        };

        if adjacent {
            picks.push(index);
        } else {
            picks = vec![index];
        }

        if let Some(phrase) = self.try_commit(&picks) {
            return PickOutcome::Committed { phrase };
        }

        self.gesture = Gesture::Dragging {
            picks,
            touched: vec![index],
        };
        PickOutcome::Pending
    }

    /// Pointer moved over a token while held down
    pub fn extend_pick(&mut self, index: usize) -> PickOutcome {
        if !self.is_pickable(index) || self.selection_at(index).is_some() {
            return PickOutcome::Ignored;
        }

        match &mut self.gesture {
            Gesture::Dragging { touched, .. } => {
                if !touched.contains(&index) {
                    touched.push(index);
                }
                PickOutcome::Pending
            }
            _ => PickOutcome::Ignored,
        }
    }

    /// Pointer released: commit the dragged range if it matches
    pub fn commit_pick(&mut self) -> PickOutcome {
        let (picks, touched) = match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Dragging { picks, touched } => (picks, touched),
            other => {
                self.gesture = other;
                return PickOutcome::Ignored;
            }
        };

        if let Some(phrase) = self.try_commit(&touched) {
            return PickOutcome::Committed { phrase };
        }

        tracing::debug!("Drag over {:?} matched nothing", touched);
        self.gesture = Gesture::Building { picks };
        PickOutcome::Rejected
    }

    /// Render class of a token: building, dragging, committed, then unselected
    pub fn classify(&self, index: usize) -> PickClass {
        match &self.gesture {
            Gesture::Building { picks } | Gesture::Dragging { picks, .. }
                if picks.contains(&index) =>
            {
                return PickClass::Building;
            }
            _ => {}
        }

        if let Gesture::Dragging { touched, .. } = &self.gesture {
            if touched.contains(&index) {
                return PickClass::Dragging;
            }
        }

        match self.selections.iter().find(|s| s.contains(index)) {
            Some(selection) => PickClass::Committed {
                color: selection.display_color.clone(),
            },
            None => PickClass::Unselected,
        }
    }

    /// Advance the completion delay; returns true when completion fires
    pub fn on_tick(&mut self, elapsed: Duration) -> bool {
        let fired = self.completion.tick(elapsed);
        if fired {
            tracing::info!(
                "Bias quiz {} complete with {} phrases",
                self.id,
                self.selections.len()
            );
        }
        fired
    }

    /// Found phrases as a percentage of the phrase target
    pub fn polarization_score(&self) -> u32 {
        let target = self.phrase_target.max(1) as f64;
        (self.selections.len() as f64 / target * 100.0).round() as u32
    }

    /// Phrases still to find before the target is reached
    pub fn remaining(&self) -> usize {
        self.phrase_target.saturating_sub(self.selections.len())
    }

    pub fn view(&self) -> BiasQuizView {
        BiasQuizView {
            id: self.id.clone(),
            question_number: self.question_number,
            tokens: self
                .tokens
                .iter()
                .map(|token| TokenView {
                    token: token.clone(),
                    class: self.classify(token.index),
                })
                .collect(),
            selections: self.selections.clone(),
            polarization_score: self.polarization_score(),
            remaining: self.remaining(),
            complete: self.is_complete(),
        }
    }

    fn is_pickable(&self, index: usize) -> bool {
        self.tokens.get(index).is_some_and(Token::is_pickable)
    }

    fn selection_at(&self, index: usize) -> Option<usize> {
        self.selections.iter().position(|s| s.contains(index))
    }

    /// Normalize `indices` to their inclusive range and commit it on a match
    fn try_commit(&mut self, indices: &[usize]) -> Option<String> {
        let (&min, &max) = (indices.iter().min()?, indices.iter().max()?);
        let run: Vec<usize> = (min..=max).collect();

        if run.iter().any(|&i| self.selection_at(i).is_some()) {
            tracing::debug!("Range {}..={} overlaps a found phrase", min, max);
            return None;
        }

        let text: String = run.iter().map(|&i| self.tokens[i].text.as_str()).collect();
        let (key, info) = self.dictionary.find_match(&text)?;
        let selection = Selection {
            token_indices: run,
            matched_phrase: key.to_string(),
            display_color: info.color.clone(),
            text,
        };

        tracing::debug!(
            "Committed '{}' for '{}'",
            selection.matched_phrase,
            selection.text
        );
        let phrase = selection.matched_phrase.clone();
        self.selections.push(selection);
        self.gesture = Gesture::Idle;
        self.completion.rearm(self.selections.len());
        Some(phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const HEADLINE: &str =
        "How many times can there be lucky guesses before it's just the truth hiding in plain sight?";

    fn quiz() -> BiasQuiz {
        BiasQuiz::new(HEADLINE, 1, PhraseDictionary::builtin(), &GameConfig::default())
    }

    /// Token index of the n-th word (0-based)
    fn word(n: usize) -> usize {
        n * 2
    }

    fn assert_selection_invariants(quiz: &BiasQuiz) {
        let dictionary = PhraseDictionary::builtin();
        let mut seen = std::collections::HashSet::new();
        for selection in quiz.selections() {
            for pair in selection.token_indices.windows(2) {
                assert_eq!(pair[1], pair[0] + 1, "run must be contiguous");
            }
            let text: String = selection
                .token_indices
                .iter()
                .map(|&i| quiz.tokens()[i].text.as_str())
                .collect();
            assert_eq!(text, selection.text);
            assert!(dictionary.find_match(&text).is_some());
            for &i in &selection.token_indices {
                assert!(seen.insert(i), "token {} in two selections", i);
            }
        }
    }

    #[test]
    fn test_single_word_phrase_commits_on_click() {
        let mut quiz = quiz();
        // "hiding" is word 13
        assert_eq!(quiz.tokens()[word(13)].text, "hiding");

        let outcome = quiz.start_pick(word(13));
        assert_eq!(
            outcome,
            PickOutcome::Committed {
                phrase: "hiding".to_string()
            }
        );
        assert!(!quiz.is_dragging());

        // Releasing afterwards must not commit the same word twice
        assert_eq!(quiz.commit_pick(), PickOutcome::Ignored);
        assert_eq!(quiz.selections().len(), 1);
        assert_selection_invariants(&quiz);
    }

    #[test]
    fn test_adjacent_clicks_build_a_phrase() {
        let mut quiz = quiz();
        // "lucky guesses" are words 6 and 7
        assert_eq!(quiz.start_pick(word(6)), PickOutcome::Pending);
        assert_eq!(quiz.commit_pick(), PickOutcome::Rejected);
        assert_eq!(quiz.classify(word(6)), PickClass::Building);

        let outcome = quiz.start_pick(word(7));
        assert_eq!(
            outcome,
            PickOutcome::Committed {
                phrase: "lucky guesses".to_string()
            }
        );

        let selection = &quiz.selections()[0];
        assert_eq!(selection.token_indices, vec![12, 13, 14]);
        assert_eq!(selection.text, "lucky guesses");
        assert_eq!(
            quiz.classify(13),
            PickClass::Committed {
                color: "#E9D5FF".to_string()
            }
        );
        assert_selection_invariants(&quiz);
    }

    #[test]
    fn test_adjacent_click_before_first_pick_extends() {
        let mut quiz = quiz();
        // "plain sight" clicked right to left
        quiz.start_pick(word(16));
        quiz.commit_pick();
        let outcome = quiz.start_pick(word(15));
        assert_eq!(
            outcome,
            PickOutcome::Committed {
                phrase: "plain sight".to_string()
            }
        );
        assert_eq!(quiz.selections()[0].token_indices, vec![30, 31, 32]);
    }

    #[test]
    fn test_non_adjacent_click_restarts_building() {
        let mut quiz = quiz();
        quiz.start_pick(word(6));
        quiz.commit_pick();
        // Word 8 is two words away, so building restarts at word 8
        quiz.start_pick(word(8));
        quiz.commit_pick();

        assert_eq!(quiz.classify(word(6)), PickClass::Unselected);
        assert_eq!(quiz.classify(word(8)), PickClass::Building);
        assert!(quiz.selections().is_empty());
    }

    #[test]
    fn test_clicking_found_phrase_removes_it_whole() {
        let mut quiz = quiz();
        quiz.start_pick(word(13)); // hiding
        quiz.start_pick(word(6));
        quiz.commit_pick();
        quiz.start_pick(word(7)); // lucky guesses
        assert_eq!(quiz.selections().len(), 2);

        // Clicking "lucky" removes "lucky guesses" entirely, "hiding" stays
        let outcome = quiz.start_pick(word(6));
        assert_eq!(
            outcome,
            PickOutcome::Removed {
                phrase: "lucky guesses".to_string()
            }
        );
        assert_eq!(quiz.selections().len(), 1);
        assert_eq!(quiz.selections()[0].matched_phrase, "hiding");
        assert_eq!(quiz.classify(word(7)), PickClass::Unselected);
        assert!(!quiz.is_dragging());
    }

    #[test]
    fn test_out_of_order_drag_commits_ascending_range() {
        let mut quiz = BiasQuiz::new(
            "bad just the truth",
            1,
            PhraseDictionary::builtin(),
            &GameConfig::default(),
        );
        // Tokens: bad(0) ' '(1) just(2) ' '(3) the(4) ' '(5) truth(6)
        assert_eq!(quiz.start_pick(6), PickOutcome::Pending);
        assert_eq!(quiz.extend_pick(2), PickOutcome::Pending);
        assert_eq!(quiz.extend_pick(4), PickOutcome::Pending);
        assert_eq!(quiz.extend_pick(3), PickOutcome::Ignored);
        assert_eq!(quiz.classify(2), PickClass::Dragging);

        let outcome = quiz.commit_pick();
        assert_eq!(
            outcome,
            PickOutcome::Committed {
                phrase: "just the truth".to_string()
            }
        );
        assert_eq!(quiz.selections()[0].token_indices, vec![2, 3, 4, 5, 6]);
        assert_selection_invariants(&quiz);
    }

    #[test]
    fn test_drag_without_match_is_discarded() {
        let mut quiz = quiz();
        quiz.start_pick(word(0));
        quiz.extend_pick(word(1));
        quiz.extend_pick(word(2));

        assert_eq!(quiz.commit_pick(), PickOutcome::Rejected);
        assert!(quiz.selections().is_empty());
        assert!(!quiz.is_dragging());
        assert_eq!(quiz.classify(word(1)), PickClass::Unselected);
    }

    #[test]
    fn test_long_drag_over_matches_first_declared_key() {
        let mut quiz = quiz();
        // "it's just the truth hiding" covers words 9..=13
        quiz.start_pick(word(11)); // "the"
        quiz.extend_pick(word(13));
        quiz.extend_pick(word(9));
        quiz.extend_pick(word(10));

        let outcome = quiz.commit_pick();
        assert_eq!(
            outcome,
            PickOutcome::Committed {
                phrase: "just the truth".to_string()
            }
        );
        assert_eq!(quiz.selections()[0].text, "it's just the truth hiding");
    }

    #[test]
    fn test_drag_spanning_found_phrase_is_rejected() {
        let mut quiz = quiz();
        quiz.start_pick(word(13)); // hiding committed
        quiz.start_pick(word(12));
        quiz.extend_pick(word(13)); // ignored, already found
        quiz.extend_pick(word(14));

        assert_eq!(quiz.commit_pick(), PickOutcome::Rejected);
        assert_eq!(quiz.selections().len(), 1);
        assert_selection_invariants(&quiz);
    }

    #[test]
    fn test_whitespace_and_out_of_range_are_ignored() {
        let mut quiz = quiz();
        assert_eq!(quiz.start_pick(1), PickOutcome::Ignored);
        assert_eq!(quiz.start_pick(10_000), PickOutcome::Ignored);
        assert_eq!(quiz.extend_pick(0), PickOutcome::Ignored);
        assert_eq!(quiz.commit_pick(), PickOutcome::Ignored);
    }

    #[test]
    fn test_building_takes_priority_over_dragging() {
        let mut quiz = quiz();
        quiz.start_pick(word(0));
        quiz.extend_pick(word(1));
        assert_eq!(quiz.classify(word(0)), PickClass::Building);
        assert_eq!(quiz.classify(word(1)), PickClass::Dragging);
        assert_eq!(quiz.classify(word(2)), PickClass::Unselected);
    }

    #[test]
    fn test_completion_fires_once_after_delay() {
        let mut quiz = quiz();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        quiz.on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        quiz.start_pick(word(13)); // hiding
        quiz.start_pick(word(9)); // it's
        assert!(!quiz.on_tick(Duration::from_secs(5)));

        quiz.start_pick(word(6));
        quiz.commit_pick();
        quiz.start_pick(word(7)); // lucky guesses, third phrase
        assert_eq!(quiz.selections().len(), 3);

        assert!(!quiz.on_tick(Duration::from_millis(1500)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(quiz.on_tick(Duration::from_millis(500)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(quiz.is_complete());

        // A fourth phrase never fires again
        quiz.start_pick(word(15));
        quiz.commit_pick();
        quiz.start_pick(word(16));
        assert_eq!(quiz.selections().len(), 4);
        assert!(!quiz.on_tick(Duration::from_secs(10)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_completion_disarmed_when_phrase_removed() {
        let mut quiz = quiz();
        quiz.start_pick(word(13));
        quiz.start_pick(word(9));
        quiz.start_pick(word(6));
        quiz.commit_pick();
        quiz.start_pick(word(7));
        assert!(!quiz.on_tick(Duration::from_millis(1000)));

        quiz.start_pick(word(13)); // remove "hiding"
        assert!(!quiz.on_tick(Duration::from_secs(10)));
        assert!(!quiz.is_complete());
    }

    #[test]
    fn test_score_and_remaining() {
        let mut quiz = quiz();
        assert_eq!(quiz.polarization_score(), 0);
        assert_eq!(quiz.remaining(), 5);

        quiz.start_pick(word(13));
        quiz.start_pick(word(9));
        assert_eq!(quiz.polarization_score(), 40);
        assert_eq!(quiz.remaining(), 3);

        let view = quiz.view();
        assert_eq!(view.tokens.len(), quiz.tokens().len());
        assert_eq!(view.selections.len(), 2);
        assert!(!view.complete);
    }
}
