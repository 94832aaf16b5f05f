use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Cursor;
use std::path::PathBuf;
use tch::{Device, Kind, Tensor};

use seq2seq_core::{Decoder, Encoder, ModelConfig};
use trainer::{DeviceChoice, Trainer, TrainerConfig};
use vocab::pairs::prepare_from_reader;
use vocab::CorpusOptions;

const CORPUS: &str = "I am cold.\tJ'ai froid.\n\
                      I am tired.\tJe suis fatigue.\n\
                      He is tall.\tIl est grand.\n\
                      She is happy.\tElle est heureuse.\n";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("trainer_loop_{}_{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).ok();
    }
    dir
}

fn model_config() -> ModelConfig {
    ModelConfig {
        hidden_size: 8,
        max_length: 10,
        tie_output_projection: true,
    }
}

#[test]
fn loop_reports_windows_and_writes_artifacts() {
    let dir = scratch_dir("artifacts");
    let data = prepare_from_reader(Cursor::new(CORPUS), &CorpusOptions::default()).unwrap();
    assert_eq!(data.pairs.len(), 4);

    tch::manual_seed(0);
    let input_matrix = Tensor::randn(&[data.input_lang.n_words, 8], (Kind::Float, Device::Cpu));
    let output_matrix = Tensor::randn(&[data.output_lang.n_words, 8], (Kind::Float, Device::Cpu));
    let encoder = Encoder::new(&model_config(), data.input_lang.n_words, &input_matrix, Device::Cpu).unwrap();
    let decoder = Decoder::new(&model_config(), data.output_lang.n_words, &output_matrix, Device::Cpu).unwrap();

    let config = TrainerConfig {
        n_iters: 12,
        print_every: 4,
        plot_every: 5,
        learning_rate: 0.05,
        teacher_forcing_ratio: 0.5,
        seed: Some(3),
        device: DeviceChoice::Cpu,
        output_dir: dir.to_string_lossy().into_owned(),
        ..Default::default()
    };

    let mut trainer = Trainer::new(encoder, decoder, config).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let summary = trainer
        .train(&data.pairs, &data.input_lang, &data.output_lang, &mut rng)
        .unwrap();

    assert_eq!(summary.iterations, 12);
    // 12 iterations with a window of 5 close two plot windows
    assert_eq!(summary.plot_losses.len(), 2);
    assert!(summary.plot_losses.iter().all(|l| l.is_finite() && *l > 0.0));

    for path in [
        &summary.encoder_path,
        &summary.decoder_path,
        &summary.plot_path,
        &summary.losses_path,
    ] {
        assert!(path.exists(), "missing artifact {:?}", path);
    }

    let svg = std::fs::read_to_string(&summary.plot_path).unwrap();
    assert!(svg.contains("<polyline"));
    let losses: Vec<f64> = serde_json::from_str(&std::fs::read_to_string(&summary.losses_path).unwrap()).unwrap();
    assert_eq!(losses, summary.plot_losses);

    // Saved parameters rebuild the trained networks exactly.
    let mut restored = Encoder::new(&model_config(), data.input_lang.n_words, &input_matrix, Device::Cpu).unwrap();
    restored.load(&summary.encoder_path).unwrap();
    let trained = trainer.networks().encoder.var_store().variables();
    for (name, tensor) in restored.var_store().variables() {
        assert!(tensor.equal(&trained[&name]), "parameter {} differs", name);
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_configuration_is_refused_before_training() {
    tch::manual_seed(0);
    let matrix = Tensor::randn(&[6, 8], (Kind::Float, Device::Cpu));
    let encoder = Encoder::new(&model_config(), 6, &matrix, Device::Cpu).unwrap();
    let decoder = Decoder::new(&model_config(), 6, &matrix, Device::Cpu).unwrap();

    let config = TrainerConfig {
        print_every: 0,
        ..Default::default()
    };
    assert!(Trainer::new(encoder, decoder, config).is_err());
}

#[test]
fn empty_corpus_is_an_error() {
    let data = prepare_from_reader(Cursor::new(""), &CorpusOptions::default()).unwrap();
    tch::manual_seed(0);
    let matrix = Tensor::randn(&[2, 8], (Kind::Float, Device::Cpu));
    let encoder = Encoder::new(&model_config(), 2, &matrix, Device::Cpu).unwrap();
    let decoder = Decoder::new(&model_config(), 2, &matrix, Device::Cpu).unwrap();

    let config = TrainerConfig {
        n_iters: 3,
        device: DeviceChoice::Cpu,
        output_dir: scratch_dir("empty").to_string_lossy().into_owned(),
        ..Default::default()
    };
    let mut trainer = Trainer::new(encoder, decoder, config).unwrap();
    let result = trainer.train(&data.pairs, &data.input_lang, &data.output_lang, &mut StdRng::seed_from_u64(0));
    assert!(result.is_err());
}
