use crate::output::Report;
use screenalg_core::enumerate::{BoundedResultSet, ResultSet};
use screenalg_core::model::Estimate;

pub fn print(report: &Report, verbose: bool) {
    match report {
        Report::Single(sets) => {
            for (i, rs) in sets.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_set(rs, verbose);
            }
        }
        Report::Bounded(sets) => {
            for (i, rs) in sets.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_bounded(rs);
            }
        }
    }
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(str::len).max().unwrap_or(10).max("Algorithm".len())
}

fn print_set(rs: &ResultSet, verbose: bool) {
    println!(
        "=== {} [{}] ({} bound, {}) ===\n",
        rs.topology, rs.tag, rs.bound, rs.mood
    );

    if rs.is_empty() {
        println!("  No admissible algorithms.\n");
    } else {
        let width = label_width(rs.rows.iter().map(|r| r.label.as_str()));
        println!(
            "  {:<width$}  {:>11}  {:>11}",
            "Algorithm", "Sensitivity", "Specificity"
        );
        println!("  {}", "-".repeat(width + 26));

        for row in &rs.rows {
            println!(
                "  {:<width$}  {:>11.4}  {:>11.4}",
                row.label, row.sensitivity, row.specificity
            );
            if verbose {
                for step in &row.trace {
                    println!("      {}", step.message);
                }
            }
        }
        println!();
    }

    print_summary(rs.rows.len(), rs.excluded, rs.duplicates_removed);

    // Best algorithm by sensitivity, ties broken by specificity
    if let Some(best) = rs.ranked().first() {
        println!(
            "  Most sensitive: {} ({:.4}, {:.4})",
            best.label, best.sensitivity, best.specificity
        );
    }
}

fn fmt_estimate(e: &Estimate) -> String {
    format!("{:.4} [{:.4}, {:.4}]", e.mean, e.lower, e.upper)
}

fn print_bounded(rs: &BoundedResultSet) {
    println!("=== {} [{}] (all bounds, {}) ===\n", rs.topology, rs.tag, rs.mood);

    if rs.rows.is_empty() {
        println!("  No admissible algorithms.\n");
    } else {
        let width = label_width(rs.rows.iter().map(|r| r.label.as_str()));
        println!(
            "  {:<width$}  {:<24}  {:<24}",
            "Algorithm", "Sensitivity mean [lo, hi]", "Specificity mean [lo, hi]"
        );
        println!("  {}", "-".repeat(width + 52));
        for row in &rs.rows {
            println!(
                "  {:<width$}  {:<24}  {:<24}",
                row.label,
                fmt_estimate(&row.sensitivity),
                fmt_estimate(&row.specificity)
            );
        }
        println!();
    }

    print_summary(rs.rows.len(), rs.excluded, rs.duplicates_removed);
}

fn print_summary(rows: usize, excluded: usize, duplicates: usize) {
    print!("  {rows} algorithms");
    if excluded > 0 {
        print!(", {excluded} excluded by conflict rules");
    }
    if duplicates > 0 {
        print!(", {duplicates} duplicate labels removed");
    }
    println!();
}
