//! Best score persisted as a small JSON document.

use std::{fs, io::ErrorKind, path::PathBuf};

use diamond_heist_system_payout::{BestScoreStore, PayoutError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct BestScoreDocument {
    best_score: u32,
}

/// Best-score store backed by a JSON file. A missing file holds no score.
#[derive(Clone, Debug)]
pub(crate) struct JsonBestScoreFile {
    path: PathBuf,
}

impl JsonBestScoreFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BestScoreStore for JsonBestScoreFile {
    fn load(&self) -> Result<u32, PayoutError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(0),
            Err(error) => {
                return Err(PayoutError::Store(format!(
                    "failed to read {}: {error}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_str::<BestScoreDocument>(&contents)
            .map(|document| document.best_score)
            .map_err(|error| {
                PayoutError::Store(format!("failed to parse {}: {error}", self.path.display()))
            })
    }

    fn save(&mut self, score: u32) -> Result<(), PayoutError> {
        let json = serde_json::to_string_pretty(&BestScoreDocument { best_score: score })
            .map_err(|error| PayoutError::Store(error.to_string()))?;
        fs::write(&self.path, json).map_err(|error| {
            PayoutError::Store(format!("failed to write {}: {error}", self.path.display()))
        })
    }
}
