pub mod run;
pub mod topologies;

use screenalg_core::error::ScreenError;
use screenalg_core::topology::builtin;
use screenalg_core::topology::parse_library;
use screenalg_core::topology::schema::LibraryDef;
use std::path::Path;

/// Resolve `--library`: a preset name, otherwise a path to a JSON library file.
pub fn load_library(source: &str) -> Result<LibraryDef, ScreenError> {
    if builtin::PRESETS.contains(&source) {
        return builtin::load_preset(source);
    }
    load_library_file(Path::new(source))
}

pub fn load_library_file(path: &Path) -> Result<LibraryDef, ScreenError> {
    let source_name = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ScreenError::LibraryLoad {
        source_name: source_name.clone(),
        reason: e.to_string(),
    })?;
    parse_library(&content, &source_name)
}
