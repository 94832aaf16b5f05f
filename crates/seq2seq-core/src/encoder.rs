use std::path::Path;

use log::info;
use tch::{nn, nn::RNN, Device, Kind, Tensor};

use crate::config::ModelConfig;
use crate::embeddings::check_rows;
use crate::error::{Result, Seq2SeqError};
use crate::state::HiddenState;

/// Result of running the encoder over one source sequence.
pub struct Encoded {
    /// [max_length, hidden_size]; rows past `steps` stay zero.
    pub outputs: Tensor,
    /// Final bidirectional state, [2, 1, hidden_size / 2].
    pub state: HiddenState,
    pub steps: usize,
}

/// Bidirectional single-layer LSTM encoder fed one token at a time.
pub struct Encoder {
    vs: nn::VarStore,
    embedding: nn::Embedding,
    lstm: nn::LSTM,
    hidden_size: i64,
    max_length: usize,
}

impl Encoder {
    pub fn new(
        config: &ModelConfig,
        input_vocab_size: i64,
        embedding_matrix: &Tensor,
        device: Device,
    ) -> Result<Self> {
        config.validate()?;
        let embedding_dim = check_rows(embedding_matrix, input_vocab_size, "encoder embedding matrix")?;

        let vs = nn::VarStore::new(device);
        let root = vs.root();

        let mut embedding = nn::embedding(&root / "embedding", input_vocab_size, embedding_dim, Default::default());
        tch::no_grad(|| {
            embedding.ws.copy_(&embedding_matrix.to_kind(Kind::Float).to_device(device));
        });

        let lstm_config = nn::RNNConfig {
            bidirectional: true,
            ..Default::default()
        };
        let lstm = nn::lstm(&root / "lstm", embedding_dim, config.direction_size(), lstm_config);

        info!(
            "Encoder ready: vocab={}, embedding_dim={}, hidden_size={} ({} per direction)",
            input_vocab_size,
            embedding_dim,
            config.hidden_size,
            config.direction_size()
        );

        Ok(Self {
            vs,
            embedding,
            lstm,
            hidden_size: config.hidden_size,
            max_length: config.max_length,
        })
    }

    pub fn hidden_size(&self) -> i64 {
        self.hidden_size
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn device(&self) -> Device {
        self.vs.device()
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    /// Zero state with one slice per direction.
    pub fn init_hidden(&self) -> HiddenState {
        self.lstm.zero_state(1).into()
    }

    /// One recurrence step.
    /// Returns the step output [1, 1, hidden_size] and the next state.
    pub fn step(&self, token: i64, state: &HiddenState) -> (Tensor, HiddenState) {
        let input = Tensor::from_slice(&[token]).view([1, 1]).to(self.device());
        let embedded = input.apply(&self.embedding);
        let (output, next) = self.lstm.seq_init(&embedded, &state.as_lstm_state());
        (output, next.into())
    }

    /// Runs the recurrence over `input` in order, threading state between steps.
    pub fn encode(&self, input: &[i64]) -> Result<Encoded> {
        if input.len() > self.max_length {
            return Err(Seq2SeqError::SequenceTooLong {
                length: input.len(),
                max_length: self.max_length,
            });
        }

        let outputs = Tensor::zeros(&[self.max_length as i64, self.hidden_size], (Kind::Float, self.device()));
        let mut state = self.init_hidden();

        for (ei, &token) in input.iter().enumerate() {
            let (output, next) = self.step(token, &state);
            let mut row = outputs.get(ei as i64);
            row.copy_(&output.view([-1]));
            state = next;
        }

        Ok(Encoded {
            outputs,
            state,
            steps: input.len(),
        })
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
