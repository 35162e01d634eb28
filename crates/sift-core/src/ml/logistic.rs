//! Multinomial logistic regression over sparse rows
//!
//! Minimizes mean cross-entropy plus an L2 penalty of `1 / (2 * C * n)`
//! on the weights (intercepts are not penalized) with full-batch gradient
//! descent from a zero start, so a given dataset always yields the same
//! model.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::vectorizer::SparseVec;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
    /// Stop once the gradient's max-abs entry falls below this
    pub tol: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 2000,
            learning_rate: 1.0,
            tol: 1e-4,
        }
    }
}

/// Fitted weights: one row of `n_features` per class plus an intercept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    n_features: usize,
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl LogisticModel {
    /// Fit on rows `x` with class indices `y` in `0..n_classes`
    pub fn fit(
        x: &[SparseVec],
        y: &[usize],
        n_classes: usize,
        n_features: usize,
        params: LogisticParams,
    ) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::Training(format!(
                "{} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(Error::Training("No training rows".into()));
        }
        if n_classes < 2 {
            return Err(Error::Training(
                "This solver needs samples of at least 2 classes in the data".into(),
            ));
        }

        let n = x.len() as f64;
        let lambda = 1.0 / (params.c * n);
        let mut model = Self {
            n_features,
            weights: vec![vec![0.0; n_features]; n_classes],
            intercepts: vec![0.0; n_classes],
        };

        let mut grad_w = vec![vec![0.0; n_features]; n_classes];
        let mut grad_b = vec![0.0; n_classes];
        let mut iterations = 0;

        for iter in 0..params.max_iter {
            iterations = iter + 1;
            for row in grad_w.iter_mut() {
                row.iter_mut().for_each(|g| *g = 0.0);
            }
            grad_b.iter_mut().for_each(|g| *g = 0.0);

            for (row, &label) in x.iter().zip(y) {
                let probs = model.predict_proba(row);
                for (k, p) in probs.iter().enumerate() {
                    let err = (p - if k == label { 1.0 } else { 0.0 }) / n;
                    grad_b[k] += err;
                    for &(j, v) in row {
                        grad_w[k][j] += err * v;
                    }
                }
            }

            let mut max_grad: f64 = 0.0;
            for k in 0..n_classes {
                for j in 0..n_features {
                    let g = grad_w[k][j] + lambda * model.weights[k][j];
                    max_grad = max_grad.max(g.abs());
                    model.weights[k][j] -= params.learning_rate * g;
                }
                max_grad = max_grad.max(grad_b[k].abs());
                model.intercepts[k] -= params.learning_rate * grad_b[k];
            }

            if max_grad < params.tol {
                break;
            }
        }

        debug!(iterations, n_classes, n_features, "Logistic regression fitted");
        Ok(model)
    }

    pub fn n_classes(&self) -> usize {
        self.intercepts.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Raw per-class scores
    pub fn decision_function(&self, row: &SparseVec) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| {
                b + row
                    .iter()
                    .filter_map(|&(j, v)| w.get(j).map(|wj| wj * v))
                    .sum::<f64>()
            })
            .collect()
    }

    /// Softmax of the scores
    pub fn predict_proba(&self, row: &SparseVec) -> Vec<f64> {
        softmax(&self.decision_function(row))
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.weights.len() == self.intercepts.len()
            && self.weights.iter().all(|w| w.len() == self.n_features)
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; ties resolve to the lowest index
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ if v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
