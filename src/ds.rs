mod q_table;

pub use q_table::{NestedValues, QTable};
