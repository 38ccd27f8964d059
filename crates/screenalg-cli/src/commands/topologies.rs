use screenalg_core::error::ScreenError;
use screenalg_core::topology::builtin;
use screenalg_core::topology::schema::{LibraryDef, SlotSource, TopologyDef};
use screenalg_core::topology::Topology;
use std::path::Path;

pub fn list() -> Result<(), ScreenError> {
    println!("Available topology libraries:\n");
    for name in builtin::PRESETS {
        let lib = builtin::load_preset(name)?;
        println!("  {:<12} {} (v{})", name, lib.name, lib.version);
        if let Some(ref desc) = lib.description {
            println!("               {}", desc);
        }
        println!();
        for t in &lib.topologies {
            println!(
                "    {:<18} {:<9} {}",
                t.name,
                t.tag,
                t.expression.as_deref().unwrap_or("")
            );
        }
        println!();
    }
    Ok(())
}

fn describe_source(source: &SlotSource) -> String {
    match source {
        SlotSource::Group(role) => format!("every test in group '{role}'"),
        SlotSource::Scenario => "node prevalence of the chosen mood".to_string(),
        SlotSource::Levels(role) => format!("every level in '{role}'"),
        SlotSource::AlternateOf(primary) => format!("a second test from the group of '{primary}'"),
    }
}

pub fn explain(name: &str, library: Option<&str>) -> Result<(), ScreenError> {
    let libraries = match library {
        Some(source) => vec![super::load_library(source)?],
        None => builtin::load_all()?,
    };

    let (lib, def) = find_topology(&libraries, name)
        .ok_or_else(|| ScreenError::UnknownTopology(name.to_string()))?;
    let topology = Topology::compile(def)?;

    println!("{} [{}] from {} (version {})\n", def.name, def.tag, lib.name, lib.version);
    if let Some(ref desc) = def.description {
        println!("{}\n", desc);
    }
    if let Some(ref expr) = def.expression {
        println!("  Expression: {}", expr);
    }
    println!("  Formula:    {}\n", topology.render());

    println!("Slots, enumerated outer to inner:\n");
    let width = def.slots.iter().map(|s| s.name.len()).max().unwrap_or(4);
    for slot in &def.slots {
        let optional = if slot.is_optional() { " (optional)" } else { "" };
        println!(
            "  {:<width$}  {}{}",
            slot.name,
            describe_source(&slot.source),
            optional
        );
    }
    println!();

    println!("Operators: CAS/COS = serial AND/OR, CAP/COP = parallel AND/OR,");
    println!("ATT(x, u) = x applied to a fraction u of patients.");
    println!("A branch whose optional slot is empty is skipped.\n");

    if def.conflicts.is_empty() {
        println!("No conflict rules apply.\n");
    } else {
        println!("Conflict rules:\n");
        for rule_name in &def.conflicts {
            match lib.conflict_rule(rule_name) {
                Some(rule) => {
                    println!(
                        "  {}: {} excludes {}",
                        rule.name, rule.trigger, rule.excludes
                    );
                    if let Some(ref desc) = rule.description {
                        println!("    {}", desc);
                    }
                }
                None => println!("  {} (not defined in library)", rule_name),
            }
        }
        println!();
    }

    Ok(())
}

fn find_topology<'a>(
    libraries: &'a [LibraryDef],
    name: &str,
) -> Option<(&'a LibraryDef, &'a TopologyDef)> {
    libraries
        .iter()
        .find_map(|lib| lib.topology(name).map(|def| (lib, def)))
}

pub fn schema() -> Result<(), ScreenError> {
    print!(
        r#"JSON Topology Library Schema
============================

A library file defines one or more screening algorithms (topologies). When
you run `screenalg run`, every topology enumerates all combinations of the
feed's tests over its slots and evaluates the formula for each.

Top-level fields:
  name            (string, required)  Human-readable name of the library
  description     (string, optional)  What this library is for
  version         (string, required)  Version identifier (e.g., "2019.1")
  conflict_rules  (array, optional)   Category pairs that may not appear in
                                      the same algorithm (see below)
  topologies      (array, required)   List of topologies (see below)

Each conflict rule:
  name            (string, required)  Unique rule name
  description     (string, optional)
  trigger         (string, required)  Test category, e.g. "rapid_diagnostic"
  excludes        (string, required)  Category that may not accompany it

  Categories: clinical, serological, serological_dilution, rapid_diagnostic,
              parasitological, molecular, other

Each topology:
  name            (string, required)  Unique topology name
  tag             (string, required)  Unique label suffix, without '+'
  description     (string, optional)
  expression      (string, optional)  Clinical notation, for display only
  slots           (array, required)   Enumerated outer to inner, in order
  formula         (object, required)  Formula tree over slot names
  conflicts       (array, optional)   Names of conflict rules to apply

Each slot:
  name            (string, required)  Unique within the topology
  source          (required)          One of:
                    {{"group": ROLE}}          every test in feed group ROLE
                    "scenario"               the mood's node prevalence pair
                    {{"levels": ROLE}}         every constant in feed levels ROLE
                    {{"alternate_of": SLOT}}   second test from SLOT's group;
                                             unordered, never the same test
  optional        (bool, optional)    An empty group skips the branch

Formula nodes:
  {{"slot": NAME}}
  {{"and_serial": [F, F]}}    {{"or_serial": [F, F]}}
  {{"and_parallel": [F, F]}}  {{"or_parallel": [F, F]}}
  {{"attenuate": {{"uptake": 0.7, "of": F}}}}

Example:
{{
  "name": "My algorithms",
  "version": "1.0",
  "topologies": [
    {{
      "name": "screen-then-confirm",
      "tag": "SC",
      "expression": "screen and confirm",
      "slots": [
        {{ "name": "screen", "source": {{ "group": "screening" }} }},
        {{ "name": "confirm", "source": {{ "group": "confirmatory" }}, "optional": true }}
      ],
      "formula": {{ "and_serial": [ {{ "slot": "screen" }}, {{ "slot": "confirm" }} ] }}
    }}
  ]
}}

Every declared slot must appear in the formula. Use
`screenalg topologies explain <NAME>` to inspect a builtin topology.
"#
    );
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), ScreenError> {
    let lib = super::load_library_file(file)?;

    println!("Library '{}' (v{}) is valid.", lib.name, lib.version);
    println!("  Topologies: {}", lib.topologies.len());
    for t in &lib.topologies {
        let topology = Topology::compile(t)?;
        println!("    {:<18} {}", t.name, topology.render());
    }
    println!("  Conflict rules: {}", lib.conflict_rules.len());

    // Potential issues (warnings, not errors)
    let mut warnings = Vec::new();
    for rule in &lib.conflict_rules {
        if !lib.topologies.iter().any(|t| t.conflicts.contains(&rule.name)) {
            warnings.push(format!("conflict rule '{}' is not used by any topology", rule.name));
        }
    }
    for t in &lib.topologies {
        if t.expression.is_none() {
            warnings.push(format!("topology '{}' has no display expression", t.name));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
