//! Scenario persistence.
//!
//! The engine's board state travels as a single flat JSON document:
//! combatants, round, turn pointer, grid configuration, and spell markers.
//! This module owns the document shape, the disk I/O around it (named
//! saves, the single autosave slot, the scenario library), and the
//! minimal validation applied before a document is handed to the engine.
//! The engine itself never touches a file.

use crate::model::{Combatant, CombatantId, GridConfig, SpellMarker};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed as JSON but is not a scenario: it lacks a
    /// `characters` array or a numeric-or-null `round`.
    #[error("Invalid scenario document")]
    InvalidScenario,
}

/// The flat document shape produced on save and consumed on load.
///
/// `characters` and `round` are required (`round` may be null and reads
/// as 0); the rest default when absent so older saves still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDocument {
    pub characters: Vec<Combatant>,
    pub round: Option<u32>,
    #[serde(default)]
    pub current_turn_id: Option<CombatantId>,
    #[serde(default)]
    pub grid_config: Option<GridConfig>,
    #[serde(default)]
    pub spell_markers: Vec<SpellMarker>,
}

impl ScenarioDocument {
    /// A blank board: round 0, no combatants, default grid.
    pub fn blank() -> Self {
        Self {
            characters: Vec::new(),
            round: Some(0),
            current_turn_id: None,
            grid_config: Some(GridConfig::default()),
            spell_markers: Vec::new(),
        }
    }

    /// Parse and validate a document from JSON text.
    ///
    /// Validation is minimal on purpose: a `characters` array and a
    /// numeric-or-null `round` must be present, anything else is
    /// defaulted. A structurally invalid document is rejected without any
    /// engine state having been touched.
    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if !value.get("characters").map_or(false, |c| c.is_array()) {
            return Err(PersistError::InvalidScenario);
        }
        match value.get("round") {
            Some(r) if r.is_u64() || r.is_null() => {}
            _ => return Err(PersistError::InvalidScenario),
        }
        serde_json::from_value(value).map_err(|_| PersistError::InvalidScenario)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = self.to_json()?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load and validate from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }
}

// ============================================================================
// Autosave
// ============================================================================

/// Path of the single autosave slot inside a data directory.
pub fn autosave_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join("autosave.json")
}

/// Persist the autosave slot. Called by the collaborator after every state
/// change.
pub async fn save_autosave(
    dir: impl AsRef<Path>,
    document: &ScenarioDocument,
) -> Result<(), PersistError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
    }
    document.save_json(autosave_path(dir)).await
}

/// Load the autosave slot at startup. No stored data means a blank board,
/// not an error; a corrupt slot is surfaced so the caller can notify the
/// user and keep the current state.
pub async fn load_autosave(dir: impl AsRef<Path>) -> Result<ScenarioDocument, PersistError> {
    let path = autosave_path(dir);
    if !path.exists() {
        return Ok(ScenarioDocument::blank());
    }
    ScenarioDocument::load_json(path).await
}

// ============================================================================
// Scenario library
// ============================================================================

/// A scenario tagged with a user-given name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedScenario {
    pub name: String,
    #[serde(flatten)]
    pub scenario: ScenarioDocument,
}

/// Named scenarios kept for later reload, independent of the autosave
/// slot. Persisted as one JSON array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioLibrary {
    scenarios: Vec<NamedScenario>,
}

impl ScenarioLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, scenario: ScenarioDocument) {
        self.scenarios.push(NamedScenario {
            name: name.into(),
            scenario,
        });
    }

    /// Remove by position. Out-of-range is a no-op.
    pub fn remove(&mut self, index: usize) {
        if index < self.scenarios.len() {
            self.scenarios.remove(index);
        }
    }

    pub fn get(&self, index: usize) -> Option<&NamedScenario> {
        self.scenarios.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedScenario> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub async fn save_file(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load the library; a missing file is an empty library.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// File name for a user-named scenario export.
pub fn scenario_export_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    let sanitized = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    dir.as_ref().join(format!("{sanitized}.json"))
}
