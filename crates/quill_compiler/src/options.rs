//! Compiler options, as read from a JSON options file.

use indexmap::IndexMap;
use quill_symbols::{TypeId, TypeTable};
use quill_syntax::{Features, ParseOptions};
use serde::{Deserialize, Serialize};

/// Options shared by every file of a compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    /// Enabled language features, by option name (`queryConclusions`,
    /// `doStatements`).
    pub features: Vec<String>,
    /// Stop reporting after this many diagnostics.
    pub max_diagnostics: Option<usize>,
    /// Host-provided global fields: name to type name (`int`, `seq<string>`).
    pub globals: IndexMap<String, String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            features: vec!["queryConclusions".to_string(), "doStatements".to_string()],
            max_diagnostics: None,
            globals: IndexMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("invalid compiler options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("global '{name}' has unknown type '{type_name}'")]
    UnknownType { name: String, type_name: String },
}

impl CompilerOptions {
    pub fn from_json(text: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn parse_options(&self) -> Result<ParseOptions, OptionsError> {
        let mut features = Features::NONE;
        for name in &self.features {
            features |= Features::from_option_name(name).ok_or_else(|| OptionsError::UnknownFeature(name.clone()))?;
        }
        Ok(ParseOptions::with_features(features))
    }

    /// Resolve the type of every configured global against `types`.
    pub fn resolve_globals(&self, types: &TypeTable) -> Result<Vec<(String, TypeId)>, OptionsError> {
        self.globals
            .iter()
            .map(|(name, type_name)| {
                types
                    .lookup_named(type_name)
                    .map(|ty| (name.clone(), ty))
                    .ok_or_else(|| OptionsError::UnknownType {
                        name: name.clone(),
                        type_name: type_name.clone(),
                    })
            })
            .collect()
    }
}
