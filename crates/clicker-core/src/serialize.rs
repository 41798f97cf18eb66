//! Snapshot encoding for the storage collaborator.
//!
//! A snapshot is the JSON encoding of [`GameState`] with currency amounts
//! rounded to four decimal places. There is no version header: the shape of
//! `GameState` is the format.

use crate::state::GameState;
use crate::storage::{Storage, StorageError};
use indexmap::IndexMap;

/// Amounts are stored as multiples of `1 / SAVE_PRECISION`.
pub const SAVE_PRECISION: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("corrupt save data under key '{key}': {source}")]
    CorruptSaveData {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode save data: {0}")]
    Encode(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Round to the save precision.
///
/// Values too large to scale are already integral and pass through as-is.
pub fn round_amount(value: f64) -> f64 {
    let scaled = value * SAVE_PRECISION;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / SAVE_PRECISION
}

/// Round every amount for storage. JSON has no infinity, so infinite amounts
/// are clamped to the largest finite value; NaN cannot be stored at all.
fn rounded(values: &IndexMap<String, f64>) -> Result<IndexMap<String, f64>, PersistenceError> {
    values
        .iter()
        .map(|(id, &v)| {
            if v.is_nan() {
                return Err(PersistenceError::Encode(serde::ser::Error::custom(format!(
                    "amount of '{id}' is NaN"
                ))));
            }
            Ok((id.clone(), round_amount(v.clamp(f64::MIN, f64::MAX))))
        })
        .collect()
}

/// Encode a state as a snapshot string.
pub fn encode_snapshot(state: &GameState) -> Result<String, PersistenceError> {
    let snapshot = GameState {
        currencies: rounded(&state.currencies)?,
        total_currencies: rounded(&state.total_currencies)?,
        producers: state.producers.clone(),
        upgrades: state.upgrades.clone(),
        achievements: state.achievements.clone(),
    };
    serde_json::to_string(&snapshot).map_err(PersistenceError::Encode)
}

/// Decode a snapshot string. `key` is only used for error context.
pub fn decode_snapshot(key: &str, data: &str) -> Result<GameState, PersistenceError> {
    serde_json::from_str(data).map_err(|source| PersistenceError::CorruptSaveData {
        key: key.to_string(),
        source,
    })
}

/// Encode and write a state under `key`.
pub fn save_state(storage: &mut dyn Storage, key: &str, state: &GameState) -> Result<(), PersistenceError> {
    let data = encode_snapshot(state)?;
    storage.set(key, &data)?;
    Ok(())
}

/// Read and decode the state under `key`.
///
/// A missing or empty entry is a first run and yields `Ok(None)`. Anything
/// present that does not decode is [`PersistenceError::CorruptSaveData`].
pub fn load_state(storage: &dyn Storage, key: &str) -> Result<Option<GameState>, PersistenceError> {
    match storage.get(key)? {
        None => Ok(None),
        Some(data) if data.is_empty() => Ok(None),
        Some(data) => decode_snapshot(key, &data).map(Some),
    }
}
