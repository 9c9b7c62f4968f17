use serde::Serialize;

/// One word or whitespace run of a headline, addressed by its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub index: usize,
    pub text: String,
    pub is_whitespace: bool,
}

impl Token {
    fn new(index: usize, text: String) -> Self {
        let is_whitespace = !text.is_empty() && text.chars().all(char::is_whitespace);
        Self {
            index,
            text,
            is_whitespace,
        }
    }

    /// Whether a pointer gesture can land on this token
    pub fn is_pickable(&self) -> bool {
        !self.is_whitespace && !self.text.is_empty()
    }
}

/// Split a headline into alternating word and whitespace tokens.
///
/// Whitespace runs are kept as their own tokens and the sequence always starts
/// and ends with a word token, which is empty when the headline starts or ends
/// with whitespace. This keeps the neighbouring word of index `i` at `i ± 2`.
pub fn tokenize(headline: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_whitespace = false;

    for c in headline.chars() {
        if c.is_whitespace() != in_whitespace {
            let text = std::mem::take(&mut current);
            tokens.push(Token::new(tokens.len(), text));
            in_whitespace = !in_whitespace;
        }
        current.push(c);
    }

    tokens.push(Token::new(tokens.len(), current));
    if in_whitespace {
        tokens.push(Token::new(tokens.len(), String::new()));
    }

    tokens
}
