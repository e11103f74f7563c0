use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{check_fit_input, class_counts};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GradientBoostingParams {
    pub learning_rate: f32,
    pub max_depth: u32,
    pub num_boost_round: u32,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_depth: 3,
            num_boost_round: 50,
        }
    }
}

/// Gradient boosted decision trees, one log-likelihood booster per class.
///
/// Each booster scores "this class vs the rest"; the class with the highest
/// score wins.
pub struct GradientBoosting {
    params: GradientBoostingParams,
    /// `None` for classes absent from the training rows.
    boosters: Vec<Option<GBDT>>,
    n_features: usize,
}

impl GradientBoosting {
    pub fn new(params: GradientBoostingParams) -> Self {
        GradientBoosting {
            params,
            boosters: Vec::new(),
            n_features: 0,
        }
    }

    fn to_data_vec(x: &Array2<f64>, labels: impl Iterator<Item = ValueType>) -> DataVec {
        let mut data = DataVec::new();
        for (row, label) in x.rows().into_iter().zip(labels) {
            let features = row.iter().map(|&v| v as ValueType).collect();
            data.push(Data::new_training_data(features, 1.0, label, None));
        }
        data
    }
}

impl Classifier for GradientBoosting {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        check_fit_input(self.name(), x, y, n_classes)?;
        if x.ncols() == 0 {
            return Err(EvalError::InvalidInput(format!(
                "{} needs at least one feature",
                self.name()
            )));
        }

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(self.params.learning_rate);
        config.set_max_depth(self.params.max_depth);
        config.set_iterations(self.params.num_boost_round as usize);
        config.set_debug(false);
        config.set_loss("LogLikelyhood");

        let counts = class_counts(y, n_classes);
        let mut boosters = Vec::with_capacity(n_classes);
        for class in 0..n_classes {
            if counts[class] == 0 {
                boosters.push(None);
                continue;
            }
            // log-likelihood loss wants +1/-1 targets
            let targets = y.iter().map(|&c| if c == class { 1.0 } else { -1.0 });
            let mut train = Self::to_data_vec(x, targets);
            let mut booster = GBDT::new(&config);
            booster.fit(&mut train);
            boosters.push(Some(booster));
        }

        self.boosters = boosters;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        if self.boosters.is_empty() {
            return Err(EvalError::NotFitted(self.name().to_string()));
        }
        if x.ncols() != self.n_features {
            return Err(EvalError::InvalidInput(format!(
                "{} fit on {} features, got {}",
                self.name(),
                self.n_features,
                x.ncols()
            )));
        }

        let test = Self::to_data_vec(x, std::iter::repeat(0.0));
        let mut best = vec![(0usize, ValueType::NEG_INFINITY); x.nrows()];
        for (class, booster) in self.boosters.iter().enumerate() {
            let Some(booster) = booster else { continue };
            let scores = booster.predict(&test);
            for (slot, &score) in best.iter_mut().zip(scores.iter()) {
                if score > slot.1 {
                    *slot = (class, score);
                }
            }
        }
        Ok(best.into_iter().map(|(class, _)| class).collect())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(GradientBoosting::new(self.params.clone()))
    }

    fn name(&self) -> &str {
        "GradientBoosting"
    }
}
