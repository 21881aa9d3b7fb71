//! Temperature sampling over an engine's move priors.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::coords::PASS;

/// Sharpness of the sampling distribution. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(f64);

impl Temperature {
    /// `1.7 ^ (5 - strength)`: strength 5 samples the raw priors, every
    /// step above divides the temperature by 1.7.
    pub fn from_strength(strength: i32) -> Self {
        Self(1.7f64.powi(5 - strength))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

/// Move label → prior probability, in the order labels were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    entries: Vec<(String, f64)>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a prior. A label seen again keeps its position and takes the
    /// new value. Negative or NaN priors are ignored.
    pub fn insert(&mut self, label: impl Into<String>, prior: f64) -> bool {
        if !prior.is_finite() || prior < 0.0 {
            return false;
        }
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = prior,
            None => self.entries.push((label, prior)),
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }

    /// Normalized sampling weights, in insertion order.
    ///
    /// Priors are scaled by the largest one before raising to `1/T`, which
    /// leaves the normalized result unchanged but keeps the best move at
    /// weight 1 however small `T` gets.
    pub fn weights(&self, temperature: Temperature) -> Vec<f64> {
        let n = self.entries.len();
        let max = self.entries.iter().map(|(_, p)| *p).fold(0.0, f64::max);
        if max <= 0.0 {
            return vec![1.0 / n as f64; n];
        }

        let exponent = 1.0 / temperature.get();
        let raw: Vec<f64> = self
            .entries
            .iter()
            .map(|(_, p)| (p / max).powf(exponent))
            .collect();
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|w| w / total).collect()
    }

    /// Draw one label, or `pass` when there is nothing to choose from.
    pub fn sample<R: Rng + ?Sized>(&self, temperature: Temperature, rng: &mut R) -> String {
        if self.entries.is_empty() {
            return PASS.to_string();
        }

        let weights = self.weights(temperature);
        let idx = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..self.entries.len()),
        };
        self.entries[idx].0.clone()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Policy {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut policy = Policy::new();
        for (label, prior) in iter {
            policy.insert(label, prior);
        }
        policy
    }
}
