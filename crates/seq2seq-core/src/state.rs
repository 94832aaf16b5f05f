use tch::{nn::LSTMState, Device, Kind, Tensor};

use crate::error::{Result, Seq2SeqError};

/// Recurrent hidden/cell pair.
/// Both tensors are laid out as [directions, batch, width].
#[derive(Debug)]
pub struct HiddenState {
    pub h: Tensor,
    pub c: Tensor,
}

impl HiddenState {
    pub fn zeros(directions: i64, width: i64, device: Device) -> Self {
        Self {
            h: Tensor::zeros(&[directions, 1, width], (Kind::Float, device)),
            c: Tensor::zeros(&[directions, 1, width], (Kind::Float, device)),
        }
    }

    pub fn directions(&self) -> i64 {
        self.h.size()[0]
    }

    pub fn width(&self) -> i64 {
        let size = self.h.size();
        size[size.len() - 1]
    }

    pub fn as_lstm_state(&self) -> LSTMState {
        LSTMState((self.h.shallow_clone(), self.c.shallow_clone()))
    }

    /// Folds a bidirectional state into a unidirectional one.
    ///
    /// Direction slices `2j` and `2j + 1` are concatenated along the feature
    /// axis, so `[2k, batch, w]` becomes `[k, batch, 2w]`. Hidden and cell
    /// are merged independently with the same rule.
    pub fn merge_directions(&self) -> Result<HiddenState> {
        Ok(HiddenState {
            h: merge_adjacent(&self.h)?,
            c: merge_adjacent(&self.c)?,
        })
    }
}

impl From<LSTMState> for HiddenState {
    fn from(state: LSTMState) -> Self {
        let LSTMState((h, c)) = state;
        Self { h, c }
    }
}

fn merge_adjacent(t: &Tensor) -> Result<Tensor> {
    let directions = t.size()[0];
    if directions == 0 || directions % 2 != 0 {
        return Err(Seq2SeqError::OddDirectionAxis(directions));
    }

    let merged: Vec<Tensor> = (0..directions)
        .step_by(2)
        .map(|i| Tensor::cat(&[t.get(i), t.get(i + 1)], -1))
        .collect();

    Ok(Tensor::stack(&merged, 0))
}
