use anyhow::Result;
use log::debug;
use rand::Rng;
use std::path::Path;
use tch::{nn, nn::OptimizerConfig, Tensor};

use seq2seq_core::{Decoder, Encoder, Seq2SeqError};
use vocab::{EOS_TOKEN, SOS_TOKEN};

use crate::dataset::TrainingPair;

/// Per-step loss between a log-probability row [1, V] and a target id.
pub trait Criterion {
    fn loss(&self, log_probs: &Tensor, target: i64) -> Tensor;
}

/// Negative log-likelihood of the target under the predicted distribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct NllLoss;

impl Criterion for NllLoss {
    fn loss(&self, log_probs: &Tensor, target: i64) -> Tensor {
        let target = Tensor::from_slice(&[target]).to(log_probs.device());
        log_probs.nll_loss(&target)
    }
}

/// Both networks together with their own SGD optimizer state.
pub struct Networks {
    pub encoder: Encoder,
    pub decoder: Decoder,
    pub encoder_optimizer: nn::Optimizer,
    pub decoder_optimizer: nn::Optimizer,
}

impl Networks {
    pub fn new(encoder: Encoder, decoder: Decoder, learning_rate: f64) -> Result<Self> {
        let encoder_optimizer = nn::Sgd::default().build(encoder.var_store(), learning_rate)?;
        let decoder_optimizer = nn::Sgd::default().build(decoder.var_store(), learning_rate)?;
        Ok(Self {
            encoder,
            decoder,
            encoder_optimizer,
            decoder_optimizer,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, encoder_path: P, decoder_path: P) -> Result<()> {
        self.encoder.save(encoder_path)?;
        self.decoder.save(decoder_path)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Accumulated loss divided by the full target length.
    pub loss: f64,
    pub decode_steps: usize,
    pub teacher_forced: bool,
    /// Argmax of the final decode step; only tracked when decoding free-running.
    pub last_prediction: Option<i64>,
}

/// One encode, merge, decode, backpropagate, update cycle for a single pair.
///
/// Teacher forcing is decided once per pair with probability
/// `teacher_forcing_ratio`. Without it the decoder feeds back its own argmax
/// and stops as soon as that is EOS; the reported loss is still divided by
/// the full target length.
pub fn train_step<C, R>(
    networks: &mut Networks,
    criterion: &C,
    pair: &TrainingPair,
    teacher_forcing_ratio: f64,
    rng: &mut R,
) -> Result<StepOutcome>
where
    C: Criterion + ?Sized,
    R: Rng + ?Sized,
{
    if pair.target.is_empty() {
        return Err(Seq2SeqError::EmptyTarget.into());
    }

    networks.encoder_optimizer.zero_grad();
    networks.decoder_optimizer.zero_grad();

    let encoded = networks.encoder.encode(&pair.input)?;
    // |encoded.state.h| = (2, 1, hidden_size/2)
    let mut state = encoded.state.merge_directions()?;
    // |state.h| = (1, 1, hidden_size)

    let mut decoder_input = SOS_TOKEN;
    let teacher_forced = rng.gen::<f64>() < teacher_forcing_ratio;

    let mut loss = Tensor::from(0f32).to_device(networks.decoder.device());
    let mut decode_steps = 0;
    let mut last_prediction = None;

    for &target in &pair.target {
        let (log_probs, next) = networks.decoder.step(decoder_input, &state);
        state = next;
        loss = loss + criterion.loss(&log_probs, target);
        decode_steps += 1;

        if teacher_forced {
            decoder_input = target;
        } else {
            decoder_input = log_probs.argmax(-1, false).int64_value(&[0]);
            last_prediction = Some(decoder_input);
            if decoder_input == EOS_TOKEN {
                break;
            }
        }
    }

    loss.backward();

    networks.encoder_optimizer.step();
    networks.decoder_optimizer.step();

    let outcome = StepOutcome {
        loss: loss.double_value(&[]) / pair.target.len() as f64,
        decode_steps,
        teacher_forced,
        last_prediction,
    };
    debug!(
        "step: input_len={} target_len={} decode_steps={} teacher_forced={} loss={:.4}",
        pair.input.len(),
        pair.target.len(),
        outcome.decode_steps,
        outcome.teacher_forced,
        outcome.loss
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use seq2seq_core::ModelConfig;
    use tch::{Device, Kind};

    fn networks(seed: i64) -> Networks {
        tch::manual_seed(seed);
        let config = ModelConfig {
            hidden_size: 4,
            max_length: 10,
            tie_output_projection: true,
        };
        let input_matrix = Tensor::randn(&[6, 4], (Kind::Float, Device::Cpu));
        let output_matrix = Tensor::randn(&[6, 4], (Kind::Float, Device::Cpu));
        let encoder = Encoder::new(&config, 6, &input_matrix, Device::Cpu).unwrap();
        let decoder = Decoder::new(&config, 6, &output_matrix, Device::Cpu).unwrap();
        Networks::new(encoder, decoder, 0.01).unwrap()
    }

    #[test]
    fn nll_is_negative_log_probability_of_target() {
        let log_probs = Tensor::from_slice(&[0.5f32, 0.25, 0.25]).log().view([1, 3]);
        let loss = NllLoss.loss(&log_probs, 1).double_value(&[]);
        assert!((loss - 4f64.ln()).abs() < 1e-6);
    }

    #[test]
    fn empty_target_is_rejected() {
        let mut networks = networks(1);
        let pair = TrainingPair {
            input: vec![2, 1],
            target: vec![],
        };
        let err = train_step(&mut networks, &NllLoss, &pair, 1.0, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err.downcast_ref::<Seq2SeqError>(), Some(Seq2SeqError::EmptyTarget)));
    }

    #[test]
    fn over_long_input_fails_before_update() {
        let mut networks = networks(1);
        let before: Vec<Tensor> = networks
            .encoder
            .var_store()
            .trainable_variables()
            .iter()
            .map(|t| t.copy())
            .collect();

        let pair = TrainingPair {
            input: vec![2; 11],
            target: vec![4, 1],
        };
        let err = train_step(&mut networks, &NllLoss, &pair, 1.0, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Seq2SeqError>(),
            Some(Seq2SeqError::SequenceTooLong { length: 11, max_length: 10 })
        ));

        let after = networks.encoder.var_store().trainable_variables();
        assert!(before.iter().zip(after.iter()).all(|(a, b)| a.equal(b)));
    }

    #[test]
    fn teacher_forcing_decision_follows_ratio() {
        let pair = TrainingPair {
            input: vec![2, 3, 1],
            target: vec![4, 5, 1],
        };
        let mut rng = StdRng::seed_from_u64(5);

        let mut forced = networks(2);
        for _ in 0..5 {
            let outcome = train_step(&mut forced, &NllLoss, &pair, 1.0, &mut rng).unwrap();
            assert!(outcome.teacher_forced);
            assert_eq!(outcome.decode_steps, 3);
            assert_eq!(outcome.last_prediction, None);
        }

        let mut free = networks(2);
        for _ in 0..5 {
            let outcome = train_step(&mut free, &NllLoss, &pair, 0.0, &mut rng).unwrap();
            assert!(!outcome.teacher_forced);
            assert!(outcome.decode_steps <= 3);
        }
    }
}
