use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, PoisonError, RwLock,
};

use serde::{Deserialize, Serialize};

use crate::{
    ensure_interval,
    exploration::{EpsilonGreedy, Policy, PolicyKind, Softmax},
    Error, Result,
};

/// Learning parameters that may be tuned while an agent is running
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Action-selection policy used while training
    pub policy: PolicyKind,
    /// ε for [`PolicyKind::EpsilonGreedy`], in `[0,1]`
    pub exploration_rate: Option<f64>,
    /// τ for [`PolicyKind::Softmax`], strictly positive
    pub temperature: Option<f64>,
    /// γ, in `[0,1]`
    pub discount_rate: f64,
    /// α, in `(0,1]`
    pub learning_rate: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            policy: PolicyKind::EpsilonGreedy,
            exploration_rate: Some(0.5),
            temperature: None,
            discount_rate: 0.9,
            learning_rate: 0.5,
        }
    }
}

impl Hyperparameters {
    pub fn validate(&self) -> Result<()> {
        self.policy()?;

        let discount_rate = self.discount_rate;
        ensure_interval!(discount_rate, 0.0, 1.0);

        let learning_rate = self.learning_rate;
        ensure_interval!(learning_rate, 0.0, 1.0);
        if learning_rate == 0.0 {
            return Err(Error::configuration(
                "invalid value for `learning_rate`: must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Build the training policy these parameters describe
    pub fn policy(&self) -> Result<Policy> {
        match self.policy {
            PolicyKind::Random => Ok(Policy::Random),
            PolicyKind::EpsilonGreedy => {
                let epsilon = self.exploration_rate.ok_or_else(|| {
                    Error::configuration("`exploration_rate` is required for the e-greedy policy")
                })?;
                Ok(Policy::EpsilonGreedy(EpsilonGreedy::new(epsilon)?))
            }
            PolicyKind::Softmax => {
                let tau = self.temperature.ok_or_else(|| {
                    Error::configuration("`temperature` is required for the softmax policy")
                })?;
                Ok(Policy::Softmax(Softmax::new(tau)?))
            }
        }
    }
}

/// Configuration for the [`QTableAgent`](crate::algo::QTableAgent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Initial learning parameters
    ///
    /// **Default**: e-greedy with ε = 0.5, γ = 0.9, α = 0.5
    #[serde(flatten)]
    pub hyperparameters: Hyperparameters,
    /// Number of episodes run by each call to train or evaluate
    ///
    /// **Default**: `100`
    pub episodes: u32,
    /// Cap on the number of steps in one episode
    ///
    /// **Default**: `None`
    pub max_steps: Option<u32>,
    /// Seed for the agent's random number generator
    ///
    /// **Default**: `None`, seeded from entropy
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hyperparameters: Hyperparameters::default(),
            episodes: 100,
            max_steps: None,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        self.hyperparameters.validate()?;
        if self.episodes == 0 {
            return Err(Error::configuration("`episodes` must be positive"));
        }
        if self.max_steps == Some(0) {
            return Err(Error::configuration("`max_steps` must be positive"));
        }
        Ok(())
    }

    /// Parse a configuration from JSON text and validate it
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Shared handle to a running agent's tunable state
///
/// Cloned handles all refer to the same state, so a controller on another thread can change
/// parameters, toggle learning, or request cancellation. The agent reads the parameters at the
/// start of every step; a change takes effect from the next step on.
#[derive(Debug, Clone)]
pub struct Controls {
    params: Arc<RwLock<Hyperparameters>>,
    stop: Arc<AtomicBool>,
    learning: Arc<AtomicBool>,
}

impl Controls {
    pub fn new(params: Hyperparameters) -> Self {
        Self {
            params: Arc::new(RwLock::new(params)),
            stop: Arc::new(AtomicBool::new(false)),
            learning: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Current parameters
    pub fn hyperparameters(&self) -> Hyperparameters {
        *self.params.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Modify the parameters, keeping the old ones if the result is invalid
    pub fn update(&self, f: impl FnOnce(&mut Hyperparameters)) -> Result<()> {
        let mut params = self.params.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = *params;
        f(&mut next);
        next.validate()?;
        *params = next;
        Ok(())
    }

    pub fn set_policy(&self, policy: PolicyKind) -> Result<()> {
        self.update(|p| p.policy = policy)
    }

    pub fn set_exploration_rate(&self, epsilon: f64) -> Result<()> {
        self.update(|p| p.exploration_rate = Some(epsilon))
    }

    pub fn set_temperature(&self, tau: f64) -> Result<()> {
        self.update(|p| p.temperature = Some(tau))
    }

    pub fn set_discount_rate(&self, gamma: f64) -> Result<()> {
        self.update(|p| p.discount_rate = gamma)
    }

    pub fn set_learning_rate(&self, alpha: f64) -> Result<()> {
        self.update(|p| p.learning_rate = alpha)
    }

    /// Request cancellation of the current run
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Clear a cancellation request
    pub fn resume(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Choose whether [`play`](crate::algo::QTableAgent::play) trains or evaluates
    pub fn set_learning(&self, enabled: bool) {
        self.learning.store(enabled, Ordering::SeqCst);
    }

    pub fn is_learning(&self) -> bool {
        self.learning.load(Ordering::SeqCst)
    }
}
