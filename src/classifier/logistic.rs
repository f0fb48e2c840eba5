use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// Fitting parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
    /// Inverse regularization strength; the penalty is `‖W‖² / (2C)`.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once every gradient component is below this in magnitude.
    pub tol: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            c: 1.0,
            max_iter: 10_000,
            tol: 1e-6,
        }
    }
}

/// L2-regularized logistic regression over dense feature vectors.
///
/// With three or more labels the model is multinomial (one weight row per
/// label, softmax). With exactly two it is a single sigmoid row whose positive
/// class is the second label. Labels are kept sorted; ties in the decision
/// function go to the first label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    labels: Vec<String>,
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    iterations: usize,
}

impl LogisticRegression {
    pub fn fit<S: AsRef<str>>(
        features: &[Vec<f64>],
        targets: &[S],
        options: TrainOptions,
    ) -> Result<Self, ClassifierError> {
        if features.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }
        if features.len() != targets.len() {
            return Err(ClassifierError::LengthMismatch {
                samples: features.len(),
                labels: targets.len(),
            });
        }

        let label_set: BTreeSet<&str> = targets.iter().map(AsRef::as_ref).collect();
        if label_set.len() < 2 {
            let only = label_set.first().map(|l| l.to_string()).unwrap_or_default();
            return Err(ClassifierError::SingleClass(only));
        }

        let dims = features[0].len();
        if let Some(bad) = features.iter().find(|x| x.len() != dims) {
            return Err(ClassifierError::DimensionMismatch {
                expected: dims,
                found: bad.len(),
            });
        }

        // Sorted labels and their positions; every target is a key.
        let index: BTreeMap<&str, usize> = label_set
            .iter()
            .enumerate()
            .map(|(position, label)| (*label, position))
            .collect();
        let targets: Vec<usize> = targets
            .iter()
            .filter_map(|t| index.get(t.as_ref()).copied())
            .collect();
        let labels: Vec<String> = label_set.into_iter().map(str::to_string).collect();

        let rows = if labels.len() == 2 { 1 } else { labels.len() };
        let mut model = LogisticRegression {
            labels,
            weights: vec![vec![0.0; dims]; rows],
            intercepts: vec![0.0; rows],
            iterations: 0,
        };

        // Upper bound of the gradient's Lipschitz constant: the log-loss
        // Hessian is bounded by 1/2 per sample times ‖[x, 1]‖².
        let lipschitz = 0.5
            * features
                .iter()
                .map(|x| x.iter().map(|v| v * v).sum::<f64>() + 1.0)
                .sum::<f64>()
            + 1.0 / options.c;
        let step = 1.0 / lipschitz;

        for iteration in 1..=options.max_iter {
            let (grad_w, grad_b) = model.gradient(features, &targets, options.c);

            let max_grad = grad_w
                .iter()
                .flatten()
                .chain(grad_b.iter())
                .fold(0.0_f64, |acc, g| acc.max(g.abs()));

            model.iterations = iteration;
            if max_grad < options.tol {
                break;
            }

            for (row, grad_row) in model.weights.iter_mut().zip(&grad_w) {
                for (w, g) in row.iter_mut().zip(grad_row) {
                    *w -= step * g;
                }
            }
            for (b, g) in model.intercepts.iter_mut().zip(&grad_b) {
                *b -= step * g;
            }
        }

        Ok(model)
    }

    fn gradient(
        &self,
        features: &[Vec<f64>],
        targets: &[usize],
        c: f64,
    ) -> (Vec<Vec<f64>>, Vec<f64>) {
        let rows = self.weights.len();
        let mut grad_w: Vec<Vec<f64>> = self
            .weights
            .iter()
            .map(|row| row.iter().map(|w| w / c).collect())
            .collect();
        let mut grad_b = vec![0.0; rows];

        for (x, &target) in features.iter().zip(targets) {
            let residuals: Vec<f64> = if self.is_binary() {
                let p = sigmoid(self.score_row(0, x));
                let y = if target == 1 { 1.0 } else { 0.0 };
                vec![p - y]
            } else {
                softmax(&self.decision_function(x))
                    .into_iter()
                    .enumerate()
                    .map(|(k, p)| if k == target { p - 1.0 } else { p })
                    .collect()
            };

            for (k, residual) in residuals.into_iter().enumerate() {
                for (g, v) in grad_w[k].iter_mut().zip(x) {
                    *g += residual * v;
                }
                grad_b[k] += residual;
            }
        }

        (grad_w, grad_b)
    }

    fn is_binary(&self) -> bool {
        self.weights.len() == 1 && self.labels.len() == 2
    }

    fn score_row(&self, row: usize, x: &[f64]) -> f64 {
        self.weights[row]
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercepts[row]
    }

    /// Raw linear scores, one per weight row.
    pub fn decision_function(&self, x: &[f64]) -> Vec<f64> {
        (0..self.weights.len())
            .map(|row| self.score_row(row, x))
            .collect()
    }

    /// Class probabilities in label order.
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        if self.is_binary() {
            let p = sigmoid(self.score_row(0, x));
            vec![1.0 - p, p]
        } else {
            softmax(&self.decision_function(x))
        }
    }

    pub fn predict(&self, x: &[f64]) -> &str {
        if self.is_binary() {
            let index = if self.score_row(0, x) > 0.0 { 1 } else { 0 };
            return &self.labels[index];
        }

        let scores = self.decision_function(x);
        let mut best = 0;
        for (k, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = k;
            }
        }

        &self.labels[best]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn dimensions(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or_default()
    }

    /// Checks that the parts of a deserialized model agree with each other.
    pub fn validate(&self) -> Result<(), String> {
        if self.labels.len() < 2 {
            return Err(format!("expected at least two labels, found {}", self.labels.len()));
        }

        let rows = if self.labels.len() == 2 { 1 } else { self.labels.len() };
        if self.weights.len() != rows {
            return Err(format!(
                "{} labels need {} weight rows, found {}",
                self.labels.len(),
                rows,
                self.weights.len()
            ));
        }
        if self.intercepts.len() != rows {
            return Err(format!(
                "expected {} intercepts, found {}",
                rows,
                self.intercepts.len()
            ));
        }

        let dims = self.dimensions();
        if let Some(row) = self.weights.iter().find(|row| row.len() != dims) {
            return Err(format!(
                "weight rows of length {} and {} mixed",
                dims,
                row.len()
            ));
        }

        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
