//! Additive (Laplace) smoothing of count vectors.
//!
//! Every distribution the engine exposes is derived from a count vector
//! through the same rule: `(c[i] + alpha) / (sum(c) + n * alpha)`. An
//! all-zero count vector collapses to the uniform distribution, which the
//! callers also use as their explicit "no data" fallback.

use serde::{Deserialize, Serialize};

/// Default pseudo-count added to every bucket.
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Additive smoothing with a fixed pseudo-count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdditiveSmoothing {
    alpha: f64,
}

impl AdditiveSmoothing {
    /// Create a smoother. Returns `None` unless `alpha` is finite and positive.
    pub fn new(alpha: f64) -> Option<Self> {
        if alpha.is_finite() && alpha > 0.0 {
            Some(Self { alpha })
        } else {
            None
        }
    }

    /// Pseudo-count added to every bucket.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Smooth a count vector into a probability distribution.
    ///
    /// Returns an empty vector for empty input.
    pub fn apply(&self, counts: &[u64]) -> Vec<f64> {
        if counts.is_empty() {
            return Vec::new();
        }
        let total: f64 = counts.iter().map(|&c| c as f64).sum();
        let denom = total + self.alpha * counts.len() as f64;
        counts
            .iter()
            .map(|&c| (c as f64 + self.alpha) / denom)
            .collect()
    }

    /// Like [`apply`](Self::apply), but into a fixed-size array.
    pub fn apply_fixed<const N: usize>(&self, counts: &[u64; N]) -> [f64; N] {
        let mut out = [0.0; N];
        for (slot, p) in out.iter_mut().zip(self.apply(counts)) {
            *slot = p;
        }
        out
    }
}

impl Default for AdditiveSmoothing {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Uniform distribution over `N` outcomes.
pub fn uniform<const N: usize>() -> [f64; N] {
    [1.0 / N as f64; N]
}

/// Whether `probs` is a valid distribution within `tolerance`.
pub fn is_normalized(probs: &[f64], tolerance: f64) -> bool {
    if probs.is_empty() || probs.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return false;
    }
    let sum: f64 = probs.iter().sum();
    (sum - 1.0).abs() <= tolerance
}
