use crate::error::ScreenError;
use crate::topology::parse_library;
use crate::topology::schema::LibraryDef;

const PATHS_JSON: &str = include_str!("../../../../topologies/paths.json");
const DEPLOYMENT_JSON: &str = include_str!("../../../../topologies/deployment.json");

/// Available predefined topology libraries.
pub const PRESETS: &[&str] = &["paths", "deployment"];

/// Load a predefined topology library by name.
pub fn load_preset(name: &str) -> Result<LibraryDef, ScreenError> {
    match name {
        "paths" => parse_library(PATHS_JSON, "preset 'paths'"),
        "deployment" => parse_library(DEPLOYMENT_JSON, "preset 'deployment'"),
        _ => Err(ScreenError::LibraryInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

/// Load every predefined library, in `PRESETS` order.
pub fn load_all() -> Result<Vec<LibraryDef>, ScreenError> {
    PRESETS.iter().map(|name| load_preset(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::schema::SlotSource;
    use crate::topology::Topology;

    #[test]
    fn test_load_paths_preset() {
        let lib = load_preset("paths").unwrap();
        let names: Vec<&str> = lib.topologies.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "no-extra-paths",
                "extra-path-1",
                "extra-path-2",
                "extra-path-3",
                "extra-path-2and3",
                "extra-path-1and2",
                "extra-path-1and3",
                "all-paths",
            ]
        );
        assert_eq!(lib.conflict_rules.len(), 1);
    }

    #[test]
    fn test_load_deployment_preset() {
        let lib = load_preset("deployment").unwrap();
        assert_eq!(lib.topologies.len(), 6);
        let original = lib.topology("original").unwrap();
        assert!(original
            .slots
            .iter()
            .any(|s| s.source == SlotSource::AlternateOf("parasite".into())));
    }

    #[test]
    fn test_path_formulas_render_as_documented() {
        let lib = load_preset("paths").unwrap();
        let render = |name: &str| Topology::compile(lib.topology(name).unwrap()).unwrap().render();
        assert_eq!(render("no-extra-paths"), "CAS(A, COS(CAS(B, C), D))");
        assert_eq!(render("extra-path-1"), "COS(CAS(B, C), CAS(A, D))");
        assert_eq!(render("extra-path-2"), "CAS(A, COS(COS(CAS(B, C), D), E))");
        assert_eq!(render("extra-path-3"), "CAS(A, COS(COS(CAS(B, C), D), CAS(F, G)))");
        assert_eq!(
            render("extra-path-2and3"),
            "CAS(A, COS(COS(COS(CAS(B, C), D), E), CAS(F, G)))"
        );
        assert_eq!(render("extra-path-1and2"), "COS(CAS(B, C), CAS(A, COS(D, E)))");
        assert_eq!(
            render("extra-path-1and3"),
            "COS(CAS(B, C), CAS(A, COS(D, CAS(F, G))))"
        );
        assert_eq!(
            render("all-paths"),
            "COS(CAS(B, C), CAS(A, COS(COS(CAS(F, G), E), D)))"
        );
    }

    #[test]
    fn test_lab_variants_attenuate() {
        let lib = load_preset("deployment").unwrap();
        let rendered = Topology::compile(lib.topology("rural-lab").unwrap())
            .unwrap()
            .render();
        assert!(rendered.contains("COS(confirm, ATT(lab, 0.7))"));
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("xyz").is_err());
    }

    #[test]
    fn test_load_all() {
        assert_eq!(load_all().unwrap().len(), PRESETS.len());
    }
}
