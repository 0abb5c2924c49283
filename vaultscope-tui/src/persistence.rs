//! Persistence for lightweight UI state.
//!
//! Only the selection path survives restarts; the resource cache never
//! does. Indices are validated against the freshly loaded lists when the
//! cascade restores them, so a stale file can never select out of bounds.

use crate::orchestrator::RestorePath;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub account: Option<usize>,
    pub subscription: Option<usize>,
    pub vault: Option<usize>,
    pub secret: Option<usize>,
}

impl From<RestorePath> for PersistedState {
    fn from(path: RestorePath) -> Self {
        Self {
            account: path.account,
            subscription: path.subscription,
            vault: path.vault,
            secret: path.secret,
        }
    }
}

impl From<PersistedState> for RestorePath {
    fn from(state: PersistedState) -> Self {
        Self {
            account: state.account,
            subscription: state.subscription,
            vault: state.vault,
            secret: state.secret,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub fn load(path: &Path) -> Result<Option<PersistedState>, PersistenceError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let state = serde_json::from_str::<PersistedState>(&contents)?;
    Ok(Some(state))
}

pub fn save(path: &Path, state: &PersistedState) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(state)?;
    std::fs::write(path, contents)?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = PersistedState {
            account: Some(0),
            subscription: Some(2),
            vault: Some(1),
            secret: None,
        };

        save(&path, &state).unwrap();
        let loaded = load(&path).unwrap().unwrap();

        assert_eq!(loaded.account, Some(0));
        assert_eq!(loaded.subscription, Some(2));
        assert_eq!(loaded.vault, Some(1));
        assert_eq!(loaded.secret, None);
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(load(&path).unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("state.json");
        save(&path, &PersistedState::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load(&path), Err(PersistenceError::Serde(_))));
    }
}
