use std::path::Path;

use log::info;
use tch::{nn, nn::RNN, Device, Kind, Tensor};

use crate::config::ModelConfig;
use crate::embeddings::check_rows;
use crate::error::{Result, Seq2SeqError};
use crate::state::HiddenState;

/// Unidirectional LSTM decoder producing log-probabilities over the output vocabulary.
pub struct Decoder {
    vs: nn::VarStore,
    embedding: nn::Embedding,
    lstm: nn::LSTM,
    out: nn::Linear,
    hidden_size: i64,
    output_size: i64,
}

impl Decoder {
    pub fn new(
        config: &ModelConfig,
        output_vocab_size: i64,
        embedding_matrix: &Tensor,
        device: Device,
    ) -> Result<Self> {
        config.validate()?;
        let embedding_dim = check_rows(embedding_matrix, output_vocab_size, "decoder embedding matrix")?;
        let matrix = embedding_matrix.to_kind(Kind::Float).to_device(device);

        let vs = nn::VarStore::new(device);
        let root = vs.root();

        let mut embedding = nn::embedding(&root / "embedding", output_vocab_size, embedding_dim, Default::default());
        tch::no_grad(|| {
            embedding.ws.copy_(&matrix);
        });

        let lstm = nn::lstm(&root / "lstm", embedding_dim, config.hidden_size, Default::default());
        let mut out = nn::linear(&root / "out", config.hidden_size, output_vocab_size, Default::default());

        // The projection reuses the embedding rows, one per output word.
        if config.tie_output_projection {
            if embedding_dim != config.hidden_size {
                return Err(Seq2SeqError::ShapeMismatch {
                    what: "decoder output projection".to_string(),
                    expected: vec![output_vocab_size, config.hidden_size],
                    actual: vec![output_vocab_size, embedding_dim],
                });
            }
            tch::no_grad(|| {
                out.ws.copy_(&matrix);
            });
        }

        info!(
            "Decoder ready: vocab={}, embedding_dim={}, hidden_size={}, tied_projection={}",
            output_vocab_size, embedding_dim, config.hidden_size, config.tie_output_projection
        );

        Ok(Self {
            vs,
            embedding,
            lstm,
            out,
            hidden_size: config.hidden_size,
            output_size: output_vocab_size,
        })
    }

    pub fn hidden_size(&self) -> i64 {
        self.hidden_size
    }

    pub fn output_size(&self) -> i64 {
        self.output_size
    }

    pub fn device(&self) -> Device {
        self.vs.device()
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    /// One decode step.
    /// Returns log-probabilities [1, output_size] and the next state (same shape as `state`).
    pub fn step(&self, token: i64, state: &HiddenState) -> (Tensor, HiddenState) {
        let input = Tensor::from_slice(&[token]).view([1, 1]).to(self.device());
        let embedded = input.apply(&self.embedding).relu();
        let (output, next) = self.lstm.seq_init(&embedded, &state.as_lstm_state());

        // |output| = (1, 1, hidden_size)
        let log_probs = output
            .view([1, self.hidden_size])
            .apply(&self.out)
            .log_softmax(-1, Kind::Float);

        (log_probs, next.into())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.vs.save(path)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.vs.load(path)?;
        Ok(())
    }
}
