pub mod collector;
pub mod conflict;
pub mod engine;
pub mod outcome;

pub use collector::ResultCollector;
pub use conflict::ConflictFilter;
pub use engine::{Candidate, Enumerator, Pick, RunParams};
pub use outcome::{BoundedResultSet, BoundedRow, Combination, ResultSet};
