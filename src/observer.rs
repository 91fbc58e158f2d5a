//! Observer pattern for agent runs
//!
//! Observers are notified synchronously after every step, before the agent moves on, so the
//! [`Snapshot`] they receive is always consistent with the update that was just applied.

use std::sync::mpsc::Sender;

use log::debug;

use crate::{
    algo::Mode,
    config::Hyperparameters,
    ds::QTable,
    env::{Action, Labyrinth, Position},
    memory::Exp,
    report::Report,
};

/// Read-only view of an agent after a step
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub mode: Mode,
    /// Episode counter, starting at 1 for the first episode
    pub episode: u32,
    /// Position the step was taken from
    pub position: Position,
    /// The step that was just taken
    pub transition: &'a Exp<Labyrinth>,
    pub q_table: &'a QTable,
    /// Totals of the running episode, including this step
    pub report: &'a Report,
    /// Parameters the step was taken with
    pub hyperparameters: Hyperparameters,
}

/// Receives a notification after every step of an agent
pub trait Observer: Send {
    fn notify(&mut self, snapshot: &Snapshot<'_>);
}

/// Adapter running a closure as an [`Observer`]
pub struct FnObserver<F>(pub F);

impl<F> Observer for FnObserver<F>
where
    F: FnMut(&Snapshot<'_>) + Send,
{
    fn notify(&mut self, snapshot: &Snapshot<'_>) {
        (self.0)(snapshot)
    }
}

/// An owned summary of one step
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub mode: Mode,
    pub episode: u32,
    pub position: Position,
    pub action: Action,
    pub next_position: Position,
    pub reward: f64,
    /// Value of `action` at `position` after the step's update
    pub value: f64,
}

impl From<&Snapshot<'_>> for Update {
    fn from(snapshot: &Snapshot<'_>) -> Self {
        Self {
            mode: snapshot.mode,
            episode: snapshot.episode,
            position: snapshot.position,
            action: snapshot.transition.action,
            next_position: snapshot.transition.next_state,
            reward: snapshot.transition.reward,
            value: snapshot
                .q_table
                .get(snapshot.position, snapshot.transition.action)
                .unwrap_or_default(),
        }
    }
}

/// Forwards every step as an [`Update`] over a channel, e.g. to a front-end on another thread
///
/// Once the receiver is dropped, updates are discarded.
pub struct ChannelObserver {
    tx: Sender<Update>,
    connected: bool,
}

impl ChannelObserver {
    pub fn new(tx: Sender<Update>) -> Self {
        Self {
            tx,
            connected: true,
        }
    }
}

impl Observer for ChannelObserver {
    fn notify(&mut self, snapshot: &Snapshot<'_>) {
        if self.connected && self.tx.send(Update::from(snapshot)).is_err() {
            debug!("update receiver disconnected");
            self.connected = false;
        }
    }
}
