use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::model::{
    ArithmeticRecord, CompositionConfiguration, CompositionRecord, PlayerStatistics,
    RoundConfiguration,
};

/// Everything one player can carry to another device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub player_name: String,
    #[serde(default)]
    pub settings: RoundConfiguration,
    #[serde(default)]
    pub composition_settings: CompositionConfiguration,
    #[serde(default)]
    pub game_history: Vec<ArithmeticRecord>,
    #[serde(default)]
    pub composition_history: Vec<CompositionRecord>,
    /// Informational only; recomputed after import.
    #[serde(default, skip_deserializing)]
    pub statistics: PlayerStatistics,
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub player_name: String,
    pub games_imported: usize,
    pub composition_games_imported: usize,
}

impl ExportDocument {
    /// Parses and checks an export before anything is written.
    pub fn parse(json: &str) -> Result<Self, StorageError> {
        let mut document: ExportDocument = serde_json::from_str(json)?;
        document.player_name = document.player_name.trim().to_string();
        document.validate()?;
        Ok(document)
    }

    fn validate(&self) -> Result<(), StorageError> {
        if self.player_name.is_empty() {
            return Err(StorageError::InvalidImport(
                "player name is empty".to_string(),
            ));
        }
        self.settings.validate()?;
        self.composition_settings.validate()?;

        let foreign = self
            .game_history
            .iter()
            .map(|r| r.player_name.as_str())
            .chain(self.composition_history.iter().map(|r| r.player_name.as_str()))
            .find(|name| *name != self.player_name);
        if let Some(name) = foreign {
            return Err(StorageError::InvalidImport(format!(
                "history contains games of '{}', expected only '{}'",
                name, self.player_name
            )));
        }
        Ok(())
    }
}
