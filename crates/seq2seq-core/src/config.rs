use serde::{Deserialize, Serialize};

use crate::error::{Result, Seq2SeqError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Width of the merged (decoder side) recurrent state.
    /// Each encoder direction carries half of it.
    pub hidden_size: i64,
    /// Maximum number of tokens in a source sequence, EOS included.
    pub max_length: usize,
    /// Initialise the decoder's output projection from the output embedding matrix.
    pub tie_output_projection: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_size: 300,
            max_length: 10,
            tie_output_projection: true,
        }
    }
}

impl ModelConfig {
    pub fn direction_size(&self) -> i64 {
        self.hidden_size / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.hidden_size <= 0 || self.hidden_size % 2 != 0 {
            return Err(Seq2SeqError::InvalidHiddenSize(self.hidden_size));
        }
        Ok(())
    }
}
