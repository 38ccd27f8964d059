use screenalg_core::bounds::{Bound, Mood, NodePrevalence, ScenarioConstants};
use screenalg_core::enumerate::{Enumerator, RunParams};
use screenalg_core::error::ScreenError;
use screenalg_core::model::TestFeed;
use std::path::{Path, PathBuf};

use crate::output::{self, Report};

pub struct RunArgs {
    pub feed: PathBuf,
    pub library: String,
    pub topologies: Vec<String>,
    pub bound: String,
    pub mood: String,
    pub pessimistic_nodes: Option<String>,
    pub optimistic_nodes: Option<String>,
    pub output: String,
    pub verbose: bool,
}

pub fn run(args: RunArgs) -> Result<(), ScreenError> {
    let library = super::load_library(&args.library)?;
    let feed = load_feed(&args.feed)?;

    let bound = parse_bound(&args.bound)?;
    let moods = parse_moods(&args.mood)?;

    let mut scenario = ScenarioConstants::default();
    if let Some(ref s) = args.pessimistic_nodes {
        scenario.pessimistic = parse_nodes(s)?;
    }
    if let Some(ref s) = args.optimistic_nodes {
        scenario.optimistic = parse_nodes(s)?;
    }
    scenario.validate()?;

    // Default to every topology of the library, in library order.
    let names: Vec<String> = if args.topologies.is_empty() {
        library.topologies.iter().map(|t| t.name.clone()).collect()
    } else {
        args.topologies
    };

    log::info!(
        "running {} topologies of '{}' over {}",
        names.len(),
        library.name,
        args.feed.display()
    );

    let report = match bound {
        Some(bound) => {
            let mut sets = Vec::new();
            for name in &names {
                let enumerator = Enumerator::new(&library, name, &feed)?;
                for &mood in &moods {
                    sets.push(enumerator.run(&RunParams {
                        bound,
                        mood,
                        scenario,
                        trace: args.verbose,
                    })?);
                }
            }
            Report::Single(sets)
        }
        None => {
            let mut sets = Vec::new();
            for name in &names {
                let enumerator = Enumerator::new(&library, name, &feed)?;
                for &mood in &moods {
                    sets.push(enumerator.run_bounds(mood, &scenario)?);
                }
            }
            Report::Bounded(sets)
        }
    };

    match args.output.as_str() {
        "json" => output::json::print(&report)?,
        _ => output::table::print(&report, args.verbose),
    }

    Ok(())
}

fn load_feed(path: &Path) -> Result<TestFeed, ScreenError> {
    let content = std::fs::read_to_string(path)?;
    screenalg_core::parse_feed_str(&content)
}

/// `None` means every bound.
fn parse_bound(s: &str) -> Result<Option<Bound>, ScreenError> {
    match s {
        "lower" => Ok(Some(Bound::Lower)),
        "mean" => Ok(Some(Bound::Mean)),
        "upper" => Ok(Some(Bound::Upper)),
        "all" => Ok(None),
        _ => Err(ScreenError::Configuration(format!(
            "unknown bound '{s}'. Expected lower, mean, upper or all"
        ))),
    }
}

fn parse_moods(s: &str) -> Result<Vec<Mood>, ScreenError> {
    match s {
        "optimistic" => Ok(vec![Mood::Optimistic]),
        "pessimistic" => Ok(vec![Mood::Pessimistic]),
        "both" => Ok(Mood::ALL.to_vec()),
        _ => Err(ScreenError::Configuration(format!(
            "unknown mood '{s}'. Expected optimistic, pessimistic or both"
        ))),
    }
}

fn parse_nodes(s: &str) -> Result<NodePrevalence, ScreenError> {
    let invalid = || {
        ScreenError::Configuration(format!(
            "invalid node prevalence '{s}'. Expected DISEASE,NON_DISEASE, e.g. 0.74,0.1"
        ))
    };
    let (disease, non_disease) = s.split_once(',').ok_or_else(invalid)?;
    let given_disease: f64 = disease.trim().parse().map_err(|_| invalid())?;
    let given_non_disease: f64 = non_disease.trim().parse().map_err(|_| invalid())?;
    Ok(NodePrevalence::new(given_disease, given_non_disease))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bound() {
        assert_eq!(parse_bound("upper").unwrap(), Some(Bound::Upper));
        assert_eq!(parse_bound("all").unwrap(), None);
        assert!(parse_bound("median").is_err());
    }

    #[test]
    fn test_parse_moods() {
        assert_eq!(
            parse_moods("both").unwrap(),
            vec![Mood::Optimistic, Mood::Pessimistic]
        );
        assert!(parse_moods("neutral").is_err());
    }

    #[test]
    fn test_parse_nodes() {
        let p = parse_nodes("0.6, 0.2").unwrap();
        assert_eq!(p, NodePrevalence::new(0.6, 0.2));
        assert!(parse_nodes("0.6").is_err());
        assert!(parse_nodes("a,b").is_err());
    }
}
