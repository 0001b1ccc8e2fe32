//! Ambient, non-semantic configuration loaded from an optional
//! `algoc.toml` next to the input file (or passed via `--config`).
//!
//! Nothing here can change lexing, parsing, or type-checking results —
//! it only varies how results are rendered or named. See `SPEC_FULL.md`
//! §4.8, matching the teacher's split between `WjConfig` (project
//! config) and the compiler core it has no influence over.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// The base-type name vocabulary the emitter writes into the target
/// surface language. Defaults to the C-style names fixed by `spec.md`
/// §6.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BaseTypeNames {
    pub entier: String,
    pub reel: String,
    pub booleen: String,
    pub caractere: String,
}

impl Default for BaseTypeNames {
    fn default() -> Self {
        BaseTypeNames {
            entier: "int".to_string(),
            reel: "float".to_string(),
            booleen: "bool".to_string(),
            caractere: "char".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CompilerConfig {
    /// `None` means "decide from whether stderr is a terminal".
    pub color: Option<bool>,
    /// Whether the double-minus literal quirk (`spec.md` §9(a)) is
    /// reported as a warning. Defaults to `true`.
    pub warn_double_minus: bool,
    pub base_type_names: BaseTypeNames,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            color: None,
            warn_double_minus: true,
            base_type_names: BaseTypeNames::default(),
        }
    }
}

impl CompilerConfig {
    pub fn load_from_file(path: &Path) -> Result<CompilerConfig, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("impossible de lire {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("impossible d'analyser {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_base_type_mapping() {
        let cfg = CompilerConfig::default();
        assert!(cfg.warn_double_minus);
        assert_eq!(cfg.base_type_names.entier, "int");
        assert_eq!(cfg.base_type_names.reel, "float");
        assert_eq!(cfg.base_type_names.caractere, "char");
        assert_eq!(cfg.base_type_names.booleen, "bool");
    }

    #[test]
    fn parses_partial_toml_with_defaults_filled_in() {
        let cfg: CompilerConfig = toml::from_str("warn_double_minus = false\n").unwrap();
        assert!(!cfg.warn_double_minus);
        assert_eq!(cfg.base_type_names.entier, "int");
    }
}
