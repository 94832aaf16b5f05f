use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use seq2seq_core::embeddings::load_embedding_matrix;
use seq2seq_core::{Decoder, Encoder, ModelConfig};
use trainer::{DataConfig, Trainer, TrainerConfig};
use vocab::{prepare_data, CorpusOptions};

#[derive(Parser)]
#[command(about = "Train a bidirectional LSTM translator from pretrained embeddings")]
struct Cli {
    #[arg(long, default_value = "configs/model_config.yaml")]
    model_config: PathBuf,
    #[arg(long, default_value = "configs/training_config.yaml")]
    training_config: PathBuf,
    #[arg(long, default_value = "configs/data_config.yaml")]
    data_config: PathBuf,
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if path.exists() {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    } else {
        info!("{:?} not found, using defaults", path);
        Ok(T::default())
    }
}

fn main() -> Result<()> {
    trainer::logging_builder(env_logger::Env::default()).init();
    let cli = Cli::parse();

    let model_config: ModelConfig = load_or_default(&cli.model_config)?;
    let trainer_config: TrainerConfig = load_or_default(&cli.training_config)?;
    let data_config: DataConfig = load_or_default(&cli.data_config)?;

    let device = trainer_config.device.device();
    info!("Using device: {:?}", device);

    let mut rng = match trainer_config.seed {
        Some(seed) => {
            tch::manual_seed(seed as i64);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    // 1. Corpus and vocabularies
    let options = CorpusOptions {
        lang1: data_config.lang1.clone(),
        lang2: data_config.lang2.clone(),
        reverse: data_config.reverse,
        filter_prefixes: data_config.filter_prefixes,
        max_length: model_config.max_length,
    };
    let data = prepare_data(&data_config.corpus_path, &options)
        .with_context(|| format!("Failed to prepare corpus {:?}", data_config.corpus_path))?;

    // 2. Pretrained embeddings
    let input_matrix = load_embedding_matrix(&data_config.input_embeddings)?;
    let output_matrix = load_embedding_matrix(&data_config.output_embeddings)?;
    info!(
        "Embedding-matrix shape: {:?}, {:?}",
        input_matrix.size(),
        output_matrix.size()
    );

    // 3. Networks
    let encoder = Encoder::new(&model_config, data.input_lang.n_words, &input_matrix, device)?;
    let decoder = Decoder::new(&model_config, data.output_lang.n_words, &output_matrix, device)?;

    // 4. Train
    let mut trainer = Trainer::new(encoder, decoder, trainer_config.clone())?;
    let summary = trainer.train(&data.pairs, &data.input_lang, &data.output_lang, &mut rng)?;

    // 5. Everything needed to rebuild the networks later
    data.input_lang
        .save(trainer_config.artifact_path("input_lang.json"))
        .context("Failed to save input vocabulary")?;
    data.output_lang
        .save(trainer_config.artifact_path("output_lang.json"))
        .context("Failed to save output vocabulary")?;
    fs::write(
        trainer_config.artifact_path("model_config.json"),
        serde_json::to_string_pretty(&model_config)?,
    )?;

    println!(
        "Training complete! {} iterations, encoder saved to {:?}, decoder saved to {:?}",
        summary.iterations, summary.encoder_path, summary.decoder_path
    );
    Ok(())
}
