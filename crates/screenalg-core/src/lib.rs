pub mod bounds;
pub mod combine;
pub mod enumerate;
pub mod error;
pub mod model;
pub mod topology;
pub mod trace;

use bounds::{Mood, ScenarioConstants};
use enumerate::{BoundedResultSet, Enumerator, ResultSet, RunParams};
use error::ScreenError;
use model::TestFeed;
use topology::schema::LibraryDef;

/// Parse and validate a test feed from a JSON string.
pub fn parse_feed_str(json: &str) -> Result<TestFeed, ScreenError> {
    let feed: TestFeed = serde_json::from_str(json)?;
    feed.validate()?;
    Ok(feed)
}

/// Main API entry point: enumerate one topology of a library over a feed.
pub fn run_topology(
    library: &LibraryDef,
    topology: &str,
    feed: &TestFeed,
    params: &RunParams,
) -> Result<ResultSet, ScreenError> {
    Enumerator::new(library, topology, feed)?.run(params)
}

/// Enumerate one topology at the lower, mean and upper bound in a single pass.
pub fn run_topology_bounds(
    library: &LibraryDef,
    topology: &str,
    feed: &TestFeed,
    mood: Mood,
    scenario: &ScenarioConstants,
) -> Result<BoundedResultSet, ScreenError> {
    Enumerator::new(library, topology, feed)?.run_bounds(mood, scenario)
}

/// Run one topology once per mood, optimistic first.
pub fn run_moods(
    library: &LibraryDef,
    topology: &str,
    feed: &TestFeed,
    params: &RunParams,
) -> Result<Vec<ResultSet>, ScreenError> {
    let enumerator = Enumerator::new(library, topology, feed)?;
    Mood::ALL
        .iter()
        .map(|&mood| enumerator.run(&RunParams { mood, ..*params }))
        .collect()
}

/// Run every topology of a library, in library order.
///
/// Any error aborts the whole run; no partial result is returned.
pub fn run_library(
    library: &LibraryDef,
    feed: &TestFeed,
    params: &RunParams,
) -> Result<Vec<ResultSet>, ScreenError> {
    library
        .topologies
        .iter()
        .map(|t| run_topology(library, &t.name, feed, params))
        .collect()
}
