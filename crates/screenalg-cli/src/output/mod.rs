pub mod json;
pub mod table;

use screenalg_core::enumerate::{BoundedResultSet, ResultSet};

/// Everything one `run` invocation produced.
pub enum Report {
    /// One bound per run.
    Single(Vec<ResultSet>),
    /// `--bound all`: lower, mean and upper side by side.
    Bounded(Vec<BoundedResultSet>),
}
