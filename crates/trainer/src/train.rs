use anyhow::{Context, Result};
use log::info;
use rand::Rng;
use std::path::PathBuf;
use std::time::Instant;

use seq2seq_core::{Decoder, Encoder};
use vocab::{Lang, Pair};

use crate::dataset::{sample_pairs, sequences_from_pair, TrainingPair};
use crate::plot::save_loss_plot;
use crate::report::{LossTracker, ProgressLine};
use crate::step::{train_step, Criterion, Networks, NllLoss};
use crate::TrainerConfig;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub iterations: usize,
    pub plot_losses: Vec<f64>,
    pub encoder_path: PathBuf,
    pub decoder_path: PathBuf,
    pub plot_path: PathBuf,
    pub losses_path: PathBuf,
}

pub struct Trainer<C: Criterion = NllLoss> {
    config: TrainerConfig,
    networks: Networks,
    criterion: C,
}

impl Trainer<NllLoss> {
    pub fn new(encoder: Encoder, decoder: Decoder, config: TrainerConfig) -> Result<Self> {
        Self::with_criterion(encoder, decoder, config, NllLoss)
    }
}

impl<C: Criterion> Trainer<C> {
    pub fn with_criterion(encoder: Encoder, decoder: Decoder, config: TrainerConfig, criterion: C) -> Result<Self> {
        config.validate()?;
        let networks = Networks::new(encoder, decoder, config.learning_rate)?;
        Ok(Self {
            config,
            networks,
            criterion,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn networks(&self) -> &Networks {
        &self.networks
    }

    pub fn networks_mut(&mut self) -> &mut Networks {
        &mut self.networks
    }

    pub fn into_networks(self) -> Networks {
        self.networks
    }

    /// Samples `n_iters` pairs up front, then runs one training step per pair in order.
    /// Writes the loss curve and both parameter sets once every iteration has run.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        pairs: &[Pair],
        input_lang: &Lang,
        output_lang: &Lang,
        rng: &mut R,
    ) -> Result<TrainingSummary> {
        let n_iters = self.config.n_iters;
        info!("Starting training with configuration: {:?}", self.config);

        let training_pairs: Vec<TrainingPair> = sample_pairs(pairs, n_iters, rng)
            .into_iter()
            .map(|pair| sequences_from_pair(input_lang, output_lang, pair))
            .collect::<vocab::Result<_>>()?;
        if training_pairs.len() < n_iters {
            anyhow::bail!("Cannot sample {} training pairs from an empty corpus", n_iters);
        }

        let start = Instant::now();
        let mut tracker = LossTracker::new(self.config.print_every, self.config.plot_every);

        for (idx, pair) in training_pairs.iter().enumerate() {
            let iter = idx + 1;
            let outcome = train_step(
                &mut self.networks,
                &self.criterion,
                pair,
                self.config.teacher_forcing_ratio,
                rng,
            )?;

            if let Some(avg_loss) = tracker.record(outcome.loss) {
                let line = ProgressLine {
                    elapsed_secs: start.elapsed().as_secs_f64(),
                    iter,
                    n_iters,
                    avg_loss,
                };
                println!("{}", line);
            }
        }

        let plot_losses = tracker.into_plot_losses();
        self.save_artifacts(n_iters, plot_losses)
    }

    fn save_artifacts(&self, iterations: usize, plot_losses: Vec<f64>) -> Result<TrainingSummary> {
        let dir = PathBuf::from(&self.config.output_dir);
        if !dir.exists() {
            std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;
        }

        let summary = TrainingSummary {
            iterations,
            encoder_path: self.config.artifact_path(&self.config.encoder_file),
            decoder_path: self.config.artifact_path(&self.config.decoder_file),
            plot_path: self.config.artifact_path(&self.config.plot_file),
            losses_path: self.config.artifact_path(&self.config.losses_file),
            plot_losses,
        };

        save_loss_plot(&summary.plot_path, &summary.plot_losses)?;
        let losses_json = serde_json::to_string_pretty(&summary.plot_losses)?;
        std::fs::write(&summary.losses_path, losses_json)
            .with_context(|| format!("Failed to write {:?}", summary.losses_path))?;

        self.networks
            .save(&summary.encoder_path, &summary.decoder_path)
            .context("Failed to save network parameters")?;

        info!("Saved loss curve and parameters to {:?}", dir);
        Ok(summary)
    }
}
