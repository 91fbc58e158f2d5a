use rand::Rng;

use super::Choice;
use crate::{ensure_interval, Result};

/// Epsilon greedy exploration policy
///
/// The exploration rate is fixed per instance; time-decaying rates are produced by evaluating a
/// [`Decay`](crate::decay::Decay) and building a fresh policy each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl EpsilonGreedy {
    /// Initialize epsilon greedy policy with exploration rate `epsilon`
    ///
    /// Fails if `epsilon` is not in the interval `[0,1]`
    pub fn new(epsilon: f64) -> Result<Self> {
        ensure_interval!(epsilon, 0.0, 1.0);
        Ok(Self { epsilon })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Explore with probability `epsilon`, otherwise exploit
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Choice {
        if rng.gen::<f64>() < self.epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}
