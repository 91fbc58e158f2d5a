use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    ds::QTable,
    env::{Action, Position},
    Error, Result,
};

/// Exploration policy result
pub enum Choice {
    Explore,
    Exploit,
}

mod epsilon_greedy;
pub mod random;
mod softmax;

pub use epsilon_greedy::EpsilonGreedy;
pub use softmax::Softmax;

/// Name of an action-selection policy, as it appears in configuration
#[derive(
    Serialize, Deserialize, Display, EnumString, Clone, Copy, Debug, Default, PartialEq, Eq, Hash,
)]
pub enum PolicyKind {
    #[serde(rename = "random")]
    #[strum(serialize = "random")]
    Random,
    #[default]
    #[serde(rename = "e-greedy")]
    #[strum(serialize = "e-greedy")]
    EpsilonGreedy,
    #[serde(rename = "softmax")]
    #[strum(serialize = "softmax")]
    Softmax,
}

/// An action-selection policy over a [`QTable`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy {
    /// Uniform over the legal actions
    Random,
    /// Random with probability ε, greedy otherwise
    EpsilonGreedy(EpsilonGreedy),
    /// Boltzmann distribution over the action values
    Softmax(Softmax),
    /// Highest action value, ties broken by [`Action`] order
    Greedy,
}

impl Policy {
    /// Select one of `actions` for the cell at `pos`
    ///
    /// Fails with [`Error::NoLegalAction`] if `actions` is empty.
    pub fn select<R: Rng + ?Sized>(
        &self,
        q_table: &QTable,
        pos: Position,
        actions: &[Action],
        rng: &mut R,
    ) -> Result<Action> {
        let choice = match self {
            Policy::Random => random::uniform(actions, rng),
            Policy::EpsilonGreedy(egreedy) => match egreedy.choose(rng) {
                Choice::Explore => random::uniform(actions, rng),
                Choice::Exploit => q_table.greedy(pos, actions),
            },
            Policy::Softmax(softmax) => softmax
                .choose(&q_table.values_of(pos, actions), rng)
                .map(|i| actions[i]),
            Policy::Greedy => q_table.greedy(pos, actions),
        };

        choice.ok_or(Error::NoLegalAction { position: pos })
    }
}
