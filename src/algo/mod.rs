pub mod q_table;

pub use q_table::{EpisodeSummary, Mode, Outcome, QTableAgent, START};
