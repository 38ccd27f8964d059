use crate::output::Report;
use screenalg_core::error::ScreenError;

pub fn print(report: &Report) -> Result<(), ScreenError> {
    let json = match report {
        Report::Single(sets) => serde_json::to_string_pretty(sets)?,
        Report::Bounded(sets) => serde_json::to_string_pretty(sets)?,
    };
    println!("{json}");
    Ok(())
}
