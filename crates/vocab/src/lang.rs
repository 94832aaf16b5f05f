use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{Result, VocabError};
use crate::{EOS_TOKEN, SOS_TOKEN};

/// Word-level vocabulary for one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lang {
    pub name: String,
    pub word_to_index: HashMap<String, i64>,
    pub word_to_count: HashMap<String, u32>,
    pub index_to_word: HashMap<i64, String>,
    pub n_words: i64,
}

impl Lang {
    pub fn new(name: impl Into<String>) -> Self {
        let mut index_to_word = HashMap::new();
        index_to_word.insert(SOS_TOKEN, "SOS".to_string());
        index_to_word.insert(EOS_TOKEN, "EOS".to_string());

        Self {
            name: name.into(),
            word_to_index: HashMap::new(),
            word_to_count: HashMap::new(),
            index_to_word,
            n_words: 2,
        }
    }

    pub fn add_sentence(&mut self, sentence: &str) {
        for word in sentence.split(' ') {
            self.add_word(word);
        }
    }

    pub fn add_word(&mut self, word: &str) {
        if let Some(count) = self.word_to_count.get_mut(word) {
            *count += 1;
            return;
        }
        self.word_to_index.insert(word.to_string(), self.n_words);
        self.word_to_count.insert(word.to_string(), 1);
        self.index_to_word.insert(self.n_words, word.to_string());
        self.n_words += 1;
    }

    pub fn index_of(&self, word: &str) -> Result<i64> {
        self.word_to_index
            .get(word)
            .copied()
            .ok_or_else(|| VocabError::WordNotFound(word.to_string()))
    }

    pub fn word_of(&self, index: i64) -> Option<&str> {
        self.index_to_word.get(&index).map(String::as_str)
    }

    /// Maps every space-separated word of `sentence` to its id.
    /// No EOS is appended here.
    pub fn indexes_from_sentence(&self, sentence: &str) -> Result<Vec<i64>> {
        sentence.split(' ').map(|word| self.index_of(word)).collect()
    }

    pub fn len(&self) -> usize {
        self.n_words as usize
    }

    pub fn is_empty(&self) -> bool {
        self.n_words == 0
    }

    /// True until a word other than SOS/EOS has been added.
    pub fn has_no_words(&self) -> bool {
        self.word_to_index.is_empty()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
