mod action;
mod labyrinth;

pub use action::Action;
pub use labyrinth::{Cell, Labyrinth, Position};

use crate::Result;

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// Unlike a simulator, the environment holds no agent state: every query is answered for
/// an explicit `state`, so the agent is the sole owner of its position.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Get the legal actions from `state`, in a fixed enumeration order
    ///
    /// Empty if `state` itself cannot be occupied.
    fn legal_actions(&self, state: Self::State) -> Result<Vec<Self::Action>>;

    /// Get the state reached by taking `action` from `state`
    fn step(&self, state: Self::State, action: Self::Action) -> Result<Self::State>;

    /// Get the reward for taking `action` from `state`
    fn reward(&self, state: Self::State, action: Self::Action) -> Result<f64>;

    /// Determine if the state ends an episode
    fn is_terminal(&self, state: Self::State) -> bool;
}
