use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// One token handed over by the tokenizer, with (byte) offsets into the
/// original text. Offsets are carried, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// An ordered run of tokens, typically one sentence.
/// N-gram windows never cross the end of a span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub tokens: Vec<Token>,
}

impl TokenSpan {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Build a span from whitespace separated text, with offsets.
    /// Convenience for tests and demos; real input comes pre-tokenized.
    pub fn from_whitespace(text: &str) -> Self {
        let base = text.as_ptr() as usize;
        let tokens = text
            .split_whitespace()
            .map(|word| {
                let start = word.as_ptr() as usize - base;
                Token::new(word, start, start + word.len())
            })
            .collect();
        Self { tokens }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A document as seen by the extractors: named fields of token spans plus
/// the instance metadata carried through to the feature store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: IndexMap<String, Vec<TokenSpan>>,
    pub outcomes: Vec<String>,
    pub weight: f64,
    pub sequence_id: Option<u32>,
    pub sequence_position: Option<u32>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
            outcomes: Vec::new(),
            weight: 1.0,
            sequence_id: None,
            sequence_position: None,
        }
    }

    /// Append a span to a field, creating the field on first use
    pub fn with_span(mut self, field: &str, span: TokenSpan) -> Self {
        self.fields.entry(field.to_string()).or_default().push(span);
        self
    }

    /// Append one whitespace-tokenized span per line of `text`
    pub fn with_text(mut self, field: &str, text: &str) -> Self {
        let spans = self.fields.entry(field.to_string()).or_default();
        spans.extend(text.lines().map(TokenSpan::from_whitespace).filter(|s| !s.is_empty()));
        self
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcomes.push(outcome.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_sequence(mut self, id: u32, position: u32) -> Self {
        self.sequence_id = Some(id);
        self.sequence_position = Some(position);
        self
    }

    /// Spans of a field, if the document has it
    pub fn field(&self, name: &str) -> Option<&[TokenSpan]> {
        self.fields.get(name).map(|spans| spans.as_slice())
    }

    /// Spans of a field, `MissingField` if the document lacks it
    pub fn require_field(&self, name: &str) -> Result<&[TokenSpan]> {
        self.field(name).ok_or_else(|| FeatureError::MissingField {
            field: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_offsets_point_into_text() {
        let text = "Cats  eat mice";
        let span = TokenSpan::from_whitespace(text);
        assert_eq!(span.texts().collect::<Vec<_>>(), vec!["Cats", "eat", "mice"]);
        for token in &span.tokens {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let doc = Document::new("d1").with_text("part-one", "a b");
        assert_eq!(doc.require_field("part-one").unwrap().len(), 1);
        match doc.require_field("part-two") {
            Err(FeatureError::MissingField { field }) => assert_eq!(field, "part-two"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn with_text_makes_one_span_per_line() {
        let doc = Document::new("d").with_text("f", "one two\n\nthree");
        let spans = doc.field("f").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].texts().collect::<Vec<_>>(), vec!["three"]);
    }
}
