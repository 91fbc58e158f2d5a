//! Tabular Q-learning in grid-world labyrinths
//!
//! A [`QTableAgent`] learns to walk from the top-left cell of a [`Labyrinth`] to its goal while
//! avoiding traps, choosing actions with a random, ε-greedy, or softmax policy. Observers are
//! notified after every step, and the learned values can be exported alongside their grid.

/// Implemented RL algorithms
pub mod algo;

/// Agent configuration and shared runtime controls
pub mod config;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

pub mod error;

/// Exploration policies
pub mod exploration;

/// Transitions observed by an agent
pub mod memory;

pub mod model;

pub mod observer;

/// Per-episode running totals
pub mod report;

mod util;

pub use algo::QTableAgent;
pub use error::{Error, Result};
