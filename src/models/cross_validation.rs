//! K-fold cross-validation splits
//!
//! Deterministic, unshuffled folds: the stepwise selector scores candidate
//! feature sets out-of-fold, and shuffling would make two runs on identical
//! inputs disagree.

use ndarray::{Array1, Array2};

/// Cross-validation split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl CVSplit {
    /// Materialize the train/test design matrices for this split.
    pub fn partition(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
        let x_train = x.select(ndarray::Axis(0), &self.train_indices);
        let y_train = Array1::from_vec(self.train_indices.iter().map(|&i| y[i]).collect());
        let x_test = x.select(ndarray::Axis(0), &self.test_indices);
        let y_test = Array1::from_vec(self.test_indices.iter().map(|&i| y[i]).collect());
        (x_train, y_train, x_test, y_test)
    }
}

/// K-Fold cross-validation splits over `n_samples` contiguous indices.
///
/// The last fold absorbs the remainder when `n_samples` is not divisible
/// by `n_folds`.
pub fn k_fold(n_samples: usize, n_folds: usize) -> Vec<CVSplit> {
    assert!(n_folds > 1, "n_folds must be > 1");
    assert!(n_samples >= n_folds, "n_samples must be >= n_folds");

    let fold_size = n_samples / n_folds;
    let mut splits = Vec::with_capacity(n_folds);

    for i in 0..n_folds {
        let test_start = i * fold_size;
        let test_end = if i == n_folds - 1 {
            n_samples
        } else {
            (i + 1) * fold_size
        };

        let test_indices: Vec<usize> = (test_start..test_end).collect();
        let train_indices: Vec<usize> = (0..test_start).chain(test_end..n_samples).collect();

        splits.push(CVSplit {
            train_indices,
            test_indices,
        });
    }

    splits
}

/// Summary statistics for cross-validation scores
#[derive(Debug, Clone)]
pub struct CVScores {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CVScores {
    /// Calculate summary statistics from scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        Self {
            scores,
            mean,
            std: variance.sqrt(),
        }
    }
}
