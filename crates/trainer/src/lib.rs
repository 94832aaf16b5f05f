pub mod dataset;
pub mod plot;
pub mod report;
pub mod step;
pub mod train;

pub use step::{train_step, Criterion, Networks, NllLoss, StepOutcome};
pub use train::{Trainer, TrainingSummary};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tch::Device;

/// Log level used when the environment does not set a filter.
pub const DEFAULT_LOG_FILTER: &str = "info";

pub fn logging_builder(env: env_logger::Env<'_>) -> env_logger::Builder {
    env_logger::Builder::from_env(env.default_filter_or(DEFAULT_LOG_FILTER))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceChoice {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl DeviceChoice {
    pub fn device(self) -> Device {
        match self {
            DeviceChoice::Auto => Device::cuda_if_available(),
            DeviceChoice::Cpu => Device::Cpu,
            DeviceChoice::Cuda => Device::Cuda(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub n_iters: usize,
    pub print_every: usize,
    pub plot_every: usize,
    pub learning_rate: f64,
    pub teacher_forcing_ratio: f64,
    pub seed: Option<u64>,
    pub device: DeviceChoice,
    pub output_dir: String,
    pub encoder_file: String,
    pub decoder_file: String,
    pub plot_file: String,
    pub losses_file: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_iters: 910_000,
            print_every: 5000,
            plot_every: 1000,
            learning_rate: 0.01,
            teacher_forcing_ratio: 0.5,
            seed: None,
            device: DeviceChoice::Auto,
            output_dir: ".".to_string(),
            encoder_file: "encoder.ot".to_string(),
            decoder_file: "decoder.ot".to_string(),
            plot_file: "reverse-embeddings-loss.svg".to_string(),
            losses_file: "reverse-embeddings-loss.json".to_string(),
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.print_every == 0 || self.plot_every == 0 {
            bail!("print_every and plot_every must be positive");
        }
        if !(0.0..=1.0).contains(&self.teacher_forcing_ratio) {
            bail!(
                "teacher_forcing_ratio must lie in [0, 1], got {}",
                self.teacher_forcing_ratio
            );
        }
        Ok(())
    }

    pub fn artifact_path(&self, file: &str) -> PathBuf {
        PathBuf::from(&self.output_dir).join(file)
    }
}

/// Where the corpus and pretrained embedding matrices live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub corpus_path: String,
    pub lang1: String,
    pub lang2: String,
    pub reverse: bool,
    pub filter_prefixes: bool,
    pub input_embeddings: String,
    pub output_embeddings: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_path: "data/eng-fra.txt".to_string(),
            lang1: "eng".to_string(),
            lang2: "fra".to_string(),
            reverse: true,
            filter_prefixes: true,
            input_embeddings: "input_emb_matrix.npy".to_string(),
            output_embeddings: "output_emb_matrix.npy".to_string(),
        }
    }
}
