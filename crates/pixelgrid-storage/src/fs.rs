//! File-backed state store.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use pixelgrid_core::{
    Checkpoint, IndexError, IndexerState, Personalization, SquareExtra,
    UnderlayPersonalization, NUM_SQUARES,
};

use crate::paths::BuildPaths;

/// Loads and persists the checkpoint plus the three state columns.
pub struct StateStore {
    paths: BuildPaths,
}

impl StateStore {
    pub fn new(paths: BuildPaths) -> Self {
        Self { paths }
    }

    /// Load persisted state. If any of the four files is missing the
    /// state starts fresh at the contract deployment block — a partial
    /// save never masquerades as a complete one.
    pub fn load(&self, deployment_block: u64) -> Result<IndexerState, IndexError> {
        let all_present = self.paths.loaded_to().exists()
            && self.paths.personalizations().exists()
            && self.paths.underlays().exists()
            && self.paths.square_extra().exists();
        if !all_present {
            tracing::info!(
                root = %self.paths.root().display(),
                deployment_block,
                "no complete saved state, starting fresh"
            );
            return Ok(IndexerState::new(deployment_block));
        }

        let checkpoint: Checkpoint = read_json(&self.paths.loaded_to())?;
        let personalizations: Vec<Option<Personalization>> =
            read_json(&self.paths.personalizations())?;
        let underlays: Vec<Option<UnderlayPersonalization>> = read_json(&self.paths.underlays())?;
        let extra: Vec<Option<SquareExtra>> = read_json(&self.paths.square_extra())?;

        for (name, len) in [
            ("squarePersonalizations.json", personalizations.len()),
            ("underlayPersonalizations.json", underlays.len()),
            ("squareExtra.json", extra.len()),
        ] {
            if len != NUM_SQUARES {
                return Err(IndexError::Storage(format!(
                    "{name} holds {len} entries, expected {NUM_SQUARES}"
                )));
            }
        }

        tracing::info!(loaded_to = checkpoint.loaded_to, "resuming from checkpoint");
        Ok(IndexerState {
            loaded_to: checkpoint.loaded_to,
            personalizations,
            underlays,
            extra,
        })
    }

    /// Persist the state. The three column files are written first; the
    /// checkpoint goes last, so a crash anywhere in between leaves the
    /// old checkpoint in place and the next run redoes the window.
    pub fn save(&self, state: &IndexerState) -> Result<(), IndexError> {
        fs::create_dir_all(self.paths.root())
            .map_err(|e| IndexError::Storage(format!("{}: {e}", self.paths.root().display())))?;

        write_json(&self.paths.personalizations(), &state.personalizations)?;
        write_json(&self.paths.underlays(), &state.underlays)?;
        write_json(&self.paths.square_extra(), &state.extra)?;
        write_json(
            &self.paths.loaded_to(),
            &Checkpoint {
                loaded_to: state.loaded_to,
            },
        )?;

        tracing::info!(loaded_to = state.loaded_to, "state persisted");
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, IndexError> {
    let bytes =
        fs::read(path).map_err(|e| IndexError::Storage(format!("{}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| IndexError::Storage(format!("{}: {e}", path.display())))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IndexError> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| IndexError::Storage(format!("{}: {e}", path.display())))?;
    fs::write(path, bytes).map_err(|e| IndexError::Storage(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> StateStore {
        StateStore::new(BuildPaths::for_network(dir, "sunet"))
    }

    #[test]
    fn missing_files_yield_fresh_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = store_in(dir.path()).load(6_645_906).unwrap();
        assert_eq!(state.loaded_to, 6_645_906);
        assert!(state.extra.iter().all(Option::is_none));
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let mut state = IndexerState::new(100);
        state.loaded_to = 2_000;
        state.personalizations[41] = Some(Personalization::new("T", "http://t"));
        state.underlays[41] =
            Some(UnderlayPersonalization("U".into(), "http://u".into(), "ab".repeat(300)));
        state.extra[41] = Some(SquareExtra(1000, 1500, true, 2));

        store.save(&state).unwrap();
        let loaded = store.load(100).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn partial_save_falls_back_to_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let mut state = IndexerState::new(100);
        state.loaded_to = 500;
        store.save(&state).unwrap();

        // Simulate a crash that lost one column file.
        fs::remove_file(store.paths.square_extra()).unwrap();
        let loaded = store.load(100).unwrap();
        assert_eq!(loaded.loaded_to, 100);
    }

    #[test]
    fn wrong_length_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let state = IndexerState::new(100);
        store.save(&state).unwrap();
        fs::write(store.paths.personalizations(), b"[null,null]").unwrap();

        let err = store.load(100).unwrap_err();
        assert!(err.to_string().contains("expected 10000"));
    }

    #[test]
    fn checkpoint_file_holds_a_bare_number() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let mut state = IndexerState::new(0);
        state.loaded_to = 777;
        store.save(&state).unwrap();

        let raw = fs::read_to_string(store.paths.loaded_to()).unwrap();
        assert_eq!(raw, "777");
    }
}
