use regex::Regex;

use crate::error::Result;

/// Lowercases a sentence, splits terminal punctuation off the preceding word
/// and collapses every other non-letter run into a single space.
#[derive(Debug, Clone)]
pub struct Normalizer {
    punctuation: Regex,
    non_letters: Regex,
}

impl Normalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            punctuation: Regex::new(r"([.!?])")?,
            non_letters: Regex::new(r"[^\p{L}.!?]+")?,
        })
    }

    pub fn normalize(&self, sentence: &str) -> String {
        let lowered = sentence.trim().to_lowercase();
        let spaced = self.punctuation.replace_all(&lowered, " $1");
        let cleaned = self.non_letters.replace_all(&spaced, " ");
        cleaned.trim().to_string()
    }
}
