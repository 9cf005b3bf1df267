//! Macro-library configuration.
//!
//! The library file is JSON: `{"macros": [ … ]}` where each entry is
//! either an already-built action tree (`{"name", "actions"}`, the wire
//! shape) or a textual script (`{"name", "script"}`) compiled at load
//! time.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::action::Macro;
use crate::engine::Registry;
use crate::error::ConfigError;

/// On-disk macro library.
#[derive(Debug, Clone, Deserialize)]
pub struct MacroConfig {
    pub macros: Vec<MacroEntry>,
}

/// One macro definition — wire-shape actions or a script to compile.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MacroEntry {
    Actions(Macro),
    Script { name: String, script: String },
}

impl MacroConfig {
    /// Parse a library from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a library file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Compile any script entries into macros, using the registry for
    /// combinator arities.
    pub fn into_macros(self, registry: &Registry) -> Result<Vec<Macro>, ConfigError> {
        let mut macros = Vec::with_capacity(self.macros.len());
        for entry in self.macros {
            macros.push(match entry {
                MacroEntry::Actions(mac) => mac,
                MacroEntry::Script { name, script } => {
                    let actions = crate::script::compile(&script, registry)
                        .map_err(|source| ConfigError::Script {
                            name: name.clone(),
                            source,
                        })?;
                    Macro { name, actions }
                }
            });
        }
        info!(count = macros.len(), "Loaded macro library");
        Ok(macros)
    }
}
