//! Deterministic state hashing
//!
//! Hashes the serialized game state with presentation and history fields
//! removed. Two states that will play out identically hash the same, which
//! makes it easy to spot where two replays of a scenario diverge.

use crate::game::GameState;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::warn;

/// Fields that never affect gameplay
///
/// - reports: player-facing narration
/// - journal: history of transitions, not state
/// - verbosity, output_mode: display settings
const EXCLUDED_FIELDS: &[&str] = &["reports", "journal", "verbosity", "output_mode"];

/// Compute a deterministic hash of game state
pub fn compute_state_hash(game: &GameState) -> u64 {
    let json_value = match serde_json::to_value(game) {
        Ok(v) => v,
        Err(e) => {
            warn!("failed to serialize game state for hashing: {e}");
            return 0;
        }
    };

    let cleaned = strip_metadata(json_value);

    let canonical = match serde_json::to_string(&cleaned) {
        Ok(s) => s,
        Err(e) => {
            warn!("failed to canonicalize cleaned state: {e}");
            return 0;
        }
    };

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

fn strip_metadata(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(k, _)| !EXCLUDED_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k, strip_metadata(v)))
                .collect(),
        ),
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(strip_metadata).collect())
        }
        other => other,
    }
}

/// Format a hash for display (first 8 hex digits)
pub fn format_hash(hash: u64) -> String {
    format!("{:08x}", (hash >> 32) as u32)
}
