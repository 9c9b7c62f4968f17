mod dictionary;
mod quiz;
mod tokens;

pub use dictionary::{Difficulty, DictionaryError, PhraseDictionary, PhraseEntry, PhraseInfo};
pub use quiz::{BiasQuiz, BiasQuizView, PickClass, PickOutcome, Selection, TokenView};
pub use tokens::{tokenize, Token};
