//! Post-hoc operation patching for debugging
//!
//! Lets a caller rewrite specific oracle operations before alignment runs,
//! to try out a fix without touching the oracle. The set is an explicit
//! value owned by the caller, applied to the raw operation list before ids
//! are assigned, and cleared on demand.

use crate::op::EditOp;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("patch matcher must be a JSON object")]
    MatcherNotObject,
    #[error("patch replacement must be a JSON object")]
    ReplacementNotObject,
}

/// A queue of `(partial match, replacement)` pairs.
#[derive(Debug, Default)]
pub struct PatchSet {
    entries: Vec<(Map<String, Value>, Map<String, Value>)>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a patch. An operation matches when its fields, restricted to
    /// the matcher's own keys, deep-equal the matcher.
    pub fn add(&mut self, matcher: Value, replacement: Value) -> Result<(), PatchError> {
        let Value::Object(matcher) = matcher else {
            return Err(PatchError::MatcherNotObject);
        };
        let Value::Object(replacement) = replacement else {
            return Err(PatchError::ReplacementNotObject);
        };
        self.entries.push((matcher, replacement));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all queued patches.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Apply each queued patch to the first matching operation.
    ///
    /// An unmatched patch is reported and skipped. A patch whose merged
    /// result no longer forms a valid operation poisons the set: every
    /// pending patch is dropped so it cannot fire again on the next run.
    pub fn apply(&mut self, ops: &mut [EditOp]) {
        // Taken out so a poisoned patch leaves the set empty on early return.
        let entries = std::mem::take(&mut self.entries);
        if entries.is_empty() {
            return;
        }

        for (matcher, replacement) in &entries {
            let Some(op) = ops.iter_mut().find(|op| matches(op, matcher)) else {
                warn!(matcher = %(serde_json::Value::Object(matcher.clone())), "patch matched no operation");
                continue;
            };

            let mut merged = match serde_json::to_value(&*op) {
                Ok(Value::Object(fields)) => fields,
                _ => unreachable!("operations serialize to objects"),
            };
            for (key, value) in replacement {
                merged.insert(key.clone(), value.clone());
            }

            match serde_json::from_value::<EditOp>(Value::Object(merged)) {
                Ok(patched) => {
                    info!(replacement = %(serde_json::Value::Object(replacement.clone())), "patched operation");
                    *op = patched;
                }
                Err(err) => {
                    warn!(%err, "patch produced an invalid operation; dropping all patches");
                    return;
                }
            }
        }

        self.entries = entries;
    }
}

fn matches(op: &EditOp, matcher: &Map<String, Value>) -> bool {
    let Ok(Value::Object(fields)) = serde_json::to_value(op) else {
        return false;
    };
    matcher
        .iter()
        .all(|(key, value)| fields.get(key) == Some(value))
}
