use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::Position;

/// One of the four moves available in a labyrinth
///
/// The declaration order (up, down, left, right) is the enumeration order used everywhere a set of
/// actions is iterated, and therefore breaks ties between equally valued actions.
#[derive(
    EnumIter,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// The `(row, col)` offset of this move
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    /// Apply the move to `pos`, or `None` if it would leave the non-negative quadrant
    pub fn apply(self, pos: Position) -> Option<Position> {
        let (dr, dc) = self.delta();
        Some((pos.0.checked_add_signed(dr)?, pos.1.checked_add_signed(dc)?))
    }
}
