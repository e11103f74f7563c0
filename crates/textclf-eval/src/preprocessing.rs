//! Standard scaling of numeric feature columns.
//!
//! The scaler is fit on a training fold and then applied to the held-out
//! fold, so that no statistics leak from test rows into training.

use ndarray::{Array2, Axis};

use crate::error::{EvalError, Result};

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Columns with a smaller std are treated as constant and left unscaled.
    const MIN_STD: f64 = 1e-12;
}

/// Fit a `Scaler` where rows are samples and columns are features.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    if x.nrows() == 0 {
        return Err(EvalError::InvalidInput(
            "Cannot fit a scaler on zero rows".to_string(),
        ));
    }

    let mean = x
        .mean_axis(Axis(0))
        .map(|m| m.to_vec())
        .unwrap_or_else(|| vec![0.0; x.ncols()]);

    let std = x
        .axis_iter(Axis(1))
        .zip(mean.iter())
        .map(|(column, &m)| {
            let var = column.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / x.nrows() as f64;
            let std = var.sqrt();
            if std < Scaler::MIN_STD {
                1.0
            } else {
                std
            }
        })
        .collect();

    Ok(Scaler { mean, std })
}

/// Transform all rows using the provided `Scaler`.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>> {
    if x.ncols() != sc.mean.len() {
        return Err(EvalError::InvalidInput(format!(
            "Scaler fit on {} columns cannot transform {} columns",
            sc.mean.len(),
            x.ncols()
        )));
    }
    let mut out = x.clone();
    for (mut column, (m, s)) in out.axis_iter_mut(Axis(1)).zip(sc.mean.iter().zip(sc.std.iter())) {
        column.mapv_inplace(|v| (v - m) / s);
    }
    Ok(out)
}

/// Fit a scaler and return the transformed matrix in one call.
pub fn fit_transform(x: &Array2<f64>) -> Result<Array2<f64>> {
    let sc = fit_scaler(x)?;
    transform_all(x, &sc)
}
