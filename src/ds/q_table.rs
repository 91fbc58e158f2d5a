use std::collections::BTreeMap;

use crate::{
    env::{Action, Environment, Labyrinth, Position},
    memory::Exp,
    Error, Result,
};

/// Nested `row -> col -> action -> value` view of a [`QTable`], the shape it is persisted in
pub type NestedValues = BTreeMap<usize, BTreeMap<usize, BTreeMap<Action, f64>>>;

/// Action values for every cell of a [`Labyrinth`]
///
/// The table mirrors the grid's (possibly jagged) shape. Each cell maps exactly the actions that
/// are legal from it to a value estimate; the maps iterate in [`Action`] order, which makes
/// greedy selection deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    values: Vec<Vec<BTreeMap<Action, f64>>>,
}

impl QTable {
    /// Build a zero-initialized table for `env`
    pub fn new(env: &Labyrinth) -> Result<Self> {
        let mut values = Vec::with_capacity(env.height());
        for (i, row) in env.rows().iter().enumerate() {
            let mut cells = Vec::with_capacity(row.len());
            for j in 0..row.len() {
                let legal = env.legal_actions((i, j))?;
                cells.push(legal.into_iter().map(|a| (a, 0.0)).collect());
            }
            values.push(cells);
        }

        Ok(Self { values })
    }

    /// Rebuild a table from its nested form, checking it against `env`
    ///
    /// Fails with [`Error::ModelMismatch`] unless the rows, the columns of each row, and the
    /// action keys of each cell match the grid exactly.
    pub fn from_nested(env: &Labyrinth, nested: NestedValues) -> Result<Self> {
        if let Some(&row) = nested.keys().find(|&&i| i >= env.height()) {
            return Err(Error::mismatch(format!(
                "q-table has entries for row {row} but the grid has {} rows",
                env.height()
            )));
        }

        let mut nested = nested;
        let mut values = Vec::with_capacity(env.height());
        for (i, row) in env.rows().iter().enumerate() {
            let cells = nested.remove(&i).unwrap_or_default();
            if cells.len() != row.len() || cells.keys().any(|&j| j >= row.len()) {
                return Err(Error::mismatch(format!(
                    "q-table row {i} has {} cells but the grid row has {}",
                    cells.len(),
                    row.len()
                )));
            }

            let mut row_values = Vec::with_capacity(row.len());
            for (j, cell) in cells {
                let legal = env.legal_actions((i, j))?;
                if !cell.keys().copied().eq(legal.iter().copied()) {
                    return Err(Error::mismatch(format!(
                        "q-table actions at ({i}, {j}) are {:?} but the grid allows {legal:?}",
                        cell.keys().collect::<Vec<_>>()
                    )));
                }
                row_values.push(cell);
            }
            values.push(row_values);
        }

        Ok(Self { values })
    }

    /// Nested `row -> col -> action -> value` copy of the table
    pub fn to_nested(&self) -> NestedValues {
        self.values
            .iter()
            .enumerate()
            .map(|(i, row)| (i, row.iter().cloned().enumerate().collect()))
            .collect()
    }

    /// The action values recorded for `pos`
    pub fn actions(&self, pos: Position) -> Option<&BTreeMap<Action, f64>> {
        self.values.get(pos.0)?.get(pos.1)
    }

    pub fn get(&self, pos: Position, action: Action) -> Option<f64> {
        self.actions(pos)?.get(&action).copied()
    }

    /// Values of `actions` at `pos`, in the given order
    pub fn values_of(&self, pos: Position, actions: &[Action]) -> Vec<f64> {
        actions
            .iter()
            .map(|&a| self.get(pos, a).unwrap_or(0.0))
            .collect()
    }

    /// Highest value among `actions` at `pos`, or `0.0` if there are none
    pub fn max_value(&self, pos: Position, actions: &[Action]) -> f64 {
        actions
            .iter()
            .map(|&a| self.get(pos, a).unwrap_or(0.0))
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// Highest valued action among `actions` at `pos`
    ///
    /// Ties go to the first action in `actions`.
    pub fn greedy(&self, pos: Position, actions: &[Action]) -> Option<Action> {
        let mut best: Option<(Action, f64)> = None;
        for &action in actions {
            let value = self.get(pos, action).unwrap_or(0.0);
            if best.map_or(true, |(_, v)| value > v) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    /// One-step Q-learning update
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max<sub>a'</sub> Q(s',a') - Q(s,a)]
    ///
    /// `next_actions` are the actions bootstrapped from at `s'`; pass an empty slice for a
    /// terminal `s'`. Returns the updated value.
    pub fn update(
        &mut self,
        exp: &Exp<Labyrinth>,
        next_actions: &[Action],
        alpha: f64,
        gamma: f64,
    ) -> Result<f64> {
        let max_next_q = self.max_value(exp.next_state, next_actions);
        let q_value = self
            .values
            .get_mut(exp.state.0)
            .and_then(|row| row.get_mut(exp.state.1))
            .and_then(|cell| cell.get_mut(&exp.action))
            .ok_or(Error::IllegalAction {
                position: exp.state,
                action: exp.action,
            })?;

        *q_value += alpha * (exp.reward + gamma * max_next_q - *q_value);
        Ok(*q_value)
    }
}
