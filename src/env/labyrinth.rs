use std::{fs::File, io, path::Path, str::FromStr};

use log::info;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::{Action, Environment};
use crate::{Error, Result};

/// `(row, col)` coordinates of a cell in the labyrinth
pub type Position = (usize, usize);

/// The meaning of a cell code
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Wall = 0,
    Free = 1,
    Trap = 2,
    Goal = -1,
}

impl Cell {
    /// Decode a raw cell code, or `None` for an unknown code
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Cell::Wall),
            1 => Some(Cell::Free),
            2 => Some(Cell::Trap),
            -1 => Some(Cell::Goal),
            _ => None,
        }
    }

    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Reward for stepping onto this cell, `None` for walls
    pub const fn reward(self) -> Option<f64> {
        match self {
            Cell::Free => Some(-1.0),
            Cell::Trap => Some(-10.0),
            Cell::Goal => Some(10.0),
            Cell::Wall => None,
        }
    }
}

/// A grid-world labyrinth
///
/// The grid is a matrix of raw cell codes (see [`Cell`]). Rows may be jagged: each row's own
/// length is its width, so a vertical move is only legal if the row above or below is long
/// enough to contain the target column. Any non-zero code is passable; codes other than those
/// of [`Cell`] are kept as-is and only rejected when a reward is requested for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i32>>", into = "Vec<Vec<i32>>")]
pub struct Labyrinth {
    grid: Vec<Vec<i32>>,
}

impl Labyrinth {
    /// Build a labyrinth from rows of cell codes
    ///
    /// Fails with [`Error::EmptyGrid`] if there is no start cell at `(0, 0)`.
    pub fn new(grid: Vec<Vec<i32>>) -> Result<Self> {
        if grid.first().map_or(true, Vec::is_empty) {
            return Err(Error::EmptyGrid);
        }
        Ok(Self { grid })
    }

    /// Parse a labyrinth from comma-separated rows of integers, one row per line
    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);

        let mut grid = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line);
            let row = record
                .iter()
                .enumerate()
                .map(|(column, value)| {
                    value.parse::<i32>().map_err(|_| Error::InvalidCell {
                        line,
                        column: column + 1,
                        value: value.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            grid.push(row);
        }

        Self::new(grid)
    }

    /// Load a labyrinth from a comma-separated text file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::io(format!("open grid {}", path.display()), e))?;
        let labyrinth = Self::from_reader(file)?;
        info!(
            "loaded {}-row labyrinth from {}",
            labyrinth.height(),
            path.display()
        );
        Ok(labyrinth)
    }

    pub fn rows(&self) -> &[Vec<i32>] {
        &self.grid
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }

    /// Width of `row`, or `None` if the row does not exist
    pub fn width(&self, row: usize) -> Option<usize> {
        self.grid.get(row).map(Vec::len)
    }

    /// Cell code at `pos`, or `None` if out of bounds
    pub fn get(&self, pos: Position) -> Option<i32> {
        self.grid.get(pos.0)?.get(pos.1).copied()
    }

    /// Cell code at `pos`
    pub fn code(&self, pos: Position) -> Result<i32> {
        self.get(pos).ok_or(Error::OutOfBounds { position: pos })
    }

    /// All positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.grid
            .iter()
            .enumerate()
            .flat_map(|(i, row)| (0..row.len()).map(move |j| (i, j)))
    }

    fn is_passable(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(|code| code != Cell::Wall.code())
    }
}

impl FromStr for Labyrinth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }
}

impl TryFrom<Vec<Vec<i32>>> for Labyrinth {
    type Error = Error;

    fn try_from(grid: Vec<Vec<i32>>) -> Result<Self> {
        Self::new(grid)
    }
}

impl From<Labyrinth> for Vec<Vec<i32>> {
    fn from(labyrinth: Labyrinth) -> Self {
        labyrinth.grid
    }
}

impl Environment for Labyrinth {
    type State = Position;
    type Action = Action;

    fn legal_actions(&self, state: Position) -> Result<Vec<Action>> {
        if self.code(state)? == Cell::Wall.code() {
            return Ok(Vec::new());
        }

        Ok(Action::iter()
            .filter(|a| a.apply(state).is_some_and(|next| self.is_passable(next)))
            .collect())
    }

    fn step(&self, state: Position, action: Action) -> Result<Position> {
        if !self.legal_actions(state)?.contains(&action) {
            return Err(Error::IllegalAction {
                position: state,
                action,
            });
        }

        action.apply(state).ok_or(Error::IllegalAction {
            position: state,
            action,
        })
    }

    fn reward(&self, state: Position, action: Action) -> Result<f64> {
        let next = self.step(state, action)?;
        let code = self.code(next)?;
        Cell::from_code(code)
            .and_then(Cell::reward)
            .ok_or(Error::UndefinedReward {
                position: next,
                code,
            })
    }

    fn is_terminal(&self, state: Position) -> bool {
        self.get(state) == Some(Cell::Goal.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maze() -> Labyrinth {
        Labyrinth::new(vec![
            vec![1, 0, 1, 1, 1],
            vec![1, 1, 1, 0, 1],
            vec![2, 0, 2, 1, -1],
        ])
        .unwrap()
    }

    #[test]
    fn walls_have_no_actions() {
        let env = maze();
        for pos in env.positions() {
            if env.get(pos) == Some(0) {
                assert!(env.legal_actions(pos).unwrap().is_empty(), "{pos:?}");
            }
        }
    }

    #[test]
    fn legal_actions_respect_walls_and_edges() {
        let env = maze();
        assert_eq!(env.legal_actions((0, 0)).unwrap(), [Action::Down]);
        assert_eq!(
            env.legal_actions((1, 0)).unwrap(),
            [Action::Up, Action::Down, Action::Right]
        );
        assert_eq!(
            env.legal_actions((1, 2)).unwrap(),
            [Action::Up, Action::Down, Action::Left]
        );
        assert_eq!(
            env.legal_actions((2, 4)).unwrap(),
            [Action::Up, Action::Left]
        );
    }

    #[test]
    fn out_of_bounds() {
        let env = maze();
        assert!(matches!(
            env.legal_actions((3, 0)),
            Err(Error::OutOfBounds { position: (3, 0) })
        ));
        assert!(matches!(
            env.legal_actions((0, 5)),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn jagged_rows() {
        let env = Labyrinth::new(vec![vec![1, 1, 1], vec![1], vec![1, 1, 1]]).unwrap();
        assert_eq!(env.width(1), Some(1));
        assert_eq!(env.legal_actions((0, 2)).unwrap(), [Action::Left]);
        assert_eq!(
            env.legal_actions((1, 0)).unwrap(),
            [Action::Up, Action::Down]
        );
        assert!(env.legal_actions((1, 1)).is_err());
    }

    #[test]
    fn step_and_reward() {
        let env = maze();
        assert_eq!(env.step((0, 0), Action::Down).unwrap(), (1, 0));
        assert_eq!(env.reward((0, 0), Action::Down).unwrap(), -1.0);
        assert_eq!(env.reward((1, 0), Action::Down).unwrap(), -10.0);
        assert_eq!(env.reward((1, 4), Action::Down).unwrap(), 10.0);
        assert!(matches!(
            env.step((0, 0), Action::Right),
            Err(Error::IllegalAction {
                action: Action::Right,
                ..
            })
        ));
        assert!(matches!(
            env.step((0, 0), Action::Up),
            Err(Error::IllegalAction { .. })
        ));
    }

    #[test]
    fn undefined_reward() {
        let env = Labyrinth::new(vec![vec![1, 7]]).unwrap();
        assert!(matches!(
            env.reward((0, 0), Action::Right),
            Err(Error::UndefinedReward {
                position: (0, 1),
                code: 7
            })
        ));
    }

    #[test]
    fn terminal() {
        let env = maze();
        assert!(env.is_terminal((2, 4)));
        assert!(!env.is_terminal((0, 0)));
        assert!(!env.is_terminal((9, 9)));
    }

    #[test]
    fn parse_text() {
        let env: Labyrinth = "1,0,1,1,1\n1,1,1,0,1\n2, 0, 2, 1, -1\n".parse().unwrap();
        assert_eq!(env, maze());

        let jagged: Labyrinth = "1,1,1\n1\n1,-1".parse().unwrap();
        assert_eq!(jagged.rows(), [vec![1, 1, 1], vec![1], vec![1, -1]]);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            "1,1\n1,x".parse::<Labyrinth>(),
            Err(Error::InvalidCell { line: 2, column: 2, .. })
        ));
        assert!(matches!("".parse::<Labyrinth>(), Err(Error::EmptyGrid)));
    }
}
