use std::fs::File;
use std::path::Path;

use log::info;
use memmap2::MmapOptions;
use safetensors::SafeTensors;
use tch::{Kind, Tensor};

use crate::error::{Result, Seq2SeqError};

/// Loads a pretrained (vocab_size, embedding_dim) matrix.
///
/// `.npy` files are read directly; for `.safetensors` the first tensor
/// (by name) in the file is used.
pub fn load_embedding_matrix<P: AsRef<Path>>(path: P) -> Result<Tensor> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    let matrix = match extension {
        "npy" => Tensor::read_npy(path)?,
        "safetensors" => read_first_safetensor(path)?,
        other => return Err(Seq2SeqError::UnsupportedEmbeddingFormat(other.to_string())),
    };

    if matrix.dim() != 2 {
        return Err(Seq2SeqError::ShapeMismatch {
            what: format!("embedding matrix {:?}", path),
            expected: vec![-1, -1],
            actual: matrix.size(),
        });
    }

    info!("Loaded embedding matrix {:?} with shape {:?}", path, matrix.size());
    Ok(matrix.to_kind(Kind::Float))
}

fn read_first_safetensor(path: &Path) -> Result<Tensor> {
    let file = File::open(path)?;
    let buffer = unsafe { MmapOptions::new().map(&file)? };
    let tensors = SafeTensors::deserialize(&buffer)?;

    let mut names = tensors.names();
    names.sort();
    let name = names
        .first()
        .ok_or_else(|| Seq2SeqError::UnsupportedEmbeddingFormat("empty safetensors file".to_string()))?;
    let view = tensors.tensor(name)?;

    let shape: Vec<i64> = view.shape().iter().map(|&x| x as i64).collect();
    let kind = match view.dtype() {
        safetensors::Dtype::F32 => Kind::Float,
        safetensors::Dtype::F64 => Kind::Double,
        safetensors::Dtype::F16 => Kind::Half,
        safetensors::Dtype::BF16 => Kind::BFloat16,
        dtype => {
            return Err(Seq2SeqError::UnsupportedEmbeddingFormat(format!("{:?}", dtype)))
        }
    };

    Ok(Tensor::from_data_size(view.data(), &shape, kind))
}

/// Checks that a matrix has one row per vocabulary entry and returns its embedding dimension.
pub fn check_rows(matrix: &Tensor, vocab_size: i64, what: &str) -> Result<i64> {
    let size = matrix.size();
    if size.len() != 2 || size[0] != vocab_size {
        return Err(Seq2SeqError::ShapeMismatch {
            what: what.to_string(),
            expected: vec![vocab_size, -1],
            actual: size,
        });
    }
    Ok(size[1])
}
