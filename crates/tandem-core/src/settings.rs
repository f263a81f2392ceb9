//! Diff request settings catalog
//!
//! A fixed, enumerated set of keys the oracle understands. Each key is
//! either a bounded select or a boolean switch with one default; some keys
//! are only effective while a parent switch is on. Values are persisted by
//! the caller and read at pipeline start; every key is sent with the diff
//! request regardless of gating, which mirrors what the oracle expects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("unknown setting key: {0}")]
    UnknownKey(String),
    #[error("invalid value {value:?} for setting {key}")]
    InvalidValue { key: String, value: String },
}

/// Admissible values of a select setting.
#[derive(Debug, Clone, Copy)]
pub enum SelectValues {
    Named(&'static [&'static str]),
    /// Inclusive integer range rendered as decimal strings.
    Ints { start: u32, end: u32 },
    /// 0.0 through 1.0 in tenths.
    Tenths,
}

impl SelectValues {
    pub fn values(&self) -> Vec<String> {
        match self {
            SelectValues::Named(values) => values.iter().map(|v| v.to_string()).collect(),
            SelectValues::Ints { start, end } => (*start..=*end).map(|v| v.to_string()).collect(),
            SelectValues::Tenths => (0..=10)
                .map(|v| {
                    if v == 0 {
                        "0".to_string()
                    } else if v == 10 {
                        "1".to_string()
                    } else {
                        format!("0.{v}")
                    }
                })
                .collect(),
        }
    }

    fn admits(&self, value: &str) -> bool {
        self.values().iter().any(|v| v == value)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SettingKind {
    Select {
        values: SelectValues,
        default: &'static str,
    },
    Switch {
        default: bool,
    },
}

/// One entry of the catalog.
#[derive(Debug, Clone, Copy)]
pub struct SettingSpec {
    pub key: &'static str,
    pub kind: SettingKind,
    /// Only effective while this switch key is true.
    pub parent: Option<&'static str>,
}

pub const SETTING_GENERAL_GIT_DIFF_ALGO: &str = "setting_general__git_diff_algo";
pub const SETTING_GENERAL_TAB_SIZE: &str = "setting_general__tab_size";
pub const SETTING_UPDATES_IDENTIFY: &str = "setting_updates__identify";
pub const SETTING_UPDATES_CTX_LENGTH: &str = "setting_updates__ctx_length";
pub const SETTING_UPDATES_LINE_SIM_WEIGHT: &str = "setting_updates__line_sim_weight";
pub const SETTING_UPDATES_LINE_SIM_THRESHOLD: &str = "setting_updates__line_sim_threshold";
pub const SETTING_SPLITS_IDENTIFY: &str = "setting_splits__identify";
pub const SETTING_SPLITS_MAX_SPLIT_LINES: &str = "setting_splits__max_split_lines";
pub const SETTING_MERGES_IDENTIFY: &str = "setting_merges__identify";
pub const SETTING_MERGES_MAX_MERGE_LINES: &str = "setting_merges__max_merge_lines";
pub const SETTING_MOVES_IDENTIFY: &str = "setting_moves__identify";
pub const SETTING_MOVES_MIN_BLOCK_LENGTH: &str = "setting_moves__min_block_length";
pub const SETTING_MOVES_IDENTIFY_UPDATES: &str = "setting_moves__identify_updates";
pub const SETTING_MOVES_RECORD_STOP_WORDS: &str = "setting_moves__record_stop_words";
pub const SETTING_COPIES_IDENTIFY: &str = "setting_copies__identify";
pub const SETTING_COPIES_MIN_BLOCK_LENGTH: &str = "setting_copies__min_block_length";
pub const SETTING_COPIES_IDENTIFY_UPDATES: &str = "setting_copies__identify_updates";
pub const SETTING_COPIES_RECORD_STOP_WORDS: &str = "setting_copies__record_stop_words";

/// The full catalog, in the order the oracle's form expects.
pub const SETTINGS: &[SettingSpec] = &[
    SettingSpec {
        key: SETTING_GENERAL_GIT_DIFF_ALGO,
        kind: SettingKind::Select {
            values: SelectValues::Named(&["Minimal", "Myers", "Histogram", "Patience"]),
            default: "Histogram",
        },
        parent: None,
    },
    SettingSpec {
        key: SETTING_GENERAL_TAB_SIZE,
        kind: SettingKind::Select {
            values: SelectValues::Ints { start: 1, end: 20 },
            default: "4",
        },
        parent: None,
    },
    SettingSpec {
        key: SETTING_UPDATES_IDENTIFY,
        kind: SettingKind::Switch { default: true },
        parent: None,
    },
    SettingSpec {
        key: SETTING_UPDATES_CTX_LENGTH,
        kind: SettingKind::Select {
            values: SelectValues::Ints { start: 2, end: 10 },
            default: "4",
        },
        parent: Some(SETTING_UPDATES_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_UPDATES_LINE_SIM_WEIGHT,
        kind: SettingKind::Select {
            values: SelectValues::Tenths,
            default: "0.6",
        },
        parent: Some(SETTING_UPDATES_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_UPDATES_LINE_SIM_THRESHOLD,
        kind: SettingKind::Select {
            values: SelectValues::Tenths,
            default: "0.5",
        },
        parent: Some(SETTING_UPDATES_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_SPLITS_IDENTIFY,
        kind: SettingKind::Switch { default: true },
        parent: None,
    },
    SettingSpec {
        key: SETTING_SPLITS_MAX_SPLIT_LINES,
        kind: SettingKind::Select {
            values: SelectValues::Ints { start: 2, end: 20 },
            default: "8",
        },
        parent: Some(SETTING_SPLITS_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_MERGES_IDENTIFY,
        kind: SettingKind::Switch { default: true },
        parent: None,
    },
    SettingSpec {
        key: SETTING_MERGES_MAX_MERGE_LINES,
        kind: SettingKind::Select {
            values: SelectValues::Ints { start: 2, end: 20 },
            default: "8",
        },
        parent: Some(SETTING_MERGES_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_MOVES_IDENTIFY,
        kind: SettingKind::Switch { default: true },
        parent: None,
    },
    SettingSpec {
        key: SETTING_MOVES_MIN_BLOCK_LENGTH,
        kind: SettingKind::Select {
            values: SelectValues::Ints { start: 2, end: 10 },
            default: "2",
        },
        parent: Some(SETTING_MOVES_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_MOVES_IDENTIFY_UPDATES,
        kind: SettingKind::Switch { default: true },
        parent: Some(SETTING_MOVES_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_MOVES_RECORD_STOP_WORDS,
        kind: SettingKind::Switch { default: false },
        parent: Some(SETTING_MOVES_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_COPIES_IDENTIFY,
        kind: SettingKind::Switch { default: true },
        parent: None,
    },
    SettingSpec {
        key: SETTING_COPIES_MIN_BLOCK_LENGTH,
        kind: SettingKind::Select {
            values: SelectValues::Ints { start: 2, end: 10 },
            default: "2",
        },
        parent: Some(SETTING_COPIES_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_COPIES_IDENTIFY_UPDATES,
        kind: SettingKind::Switch { default: true },
        parent: Some(SETTING_COPIES_IDENTIFY),
    },
    SettingSpec {
        key: SETTING_COPIES_RECORD_STOP_WORDS,
        kind: SettingKind::Switch { default: false },
        parent: Some(SETTING_COPIES_IDENTIFY),
    },
];

fn lookup(key: &str) -> Option<&'static SettingSpec> {
    SETTINGS.iter().find(|spec| spec.key == key)
}

/// A concrete value for one setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Flag(bool),
    Text(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Flag(flag) => write!(f, "{flag}"),
            SettingValue::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Current values for every catalog key.
///
/// Deserializing tolerates unknown keys and out-of-range values (both are
/// reported and replaced by defaults), so a stale persisted file can never
/// block the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, SettingValue>",
    into = "BTreeMap<String, SettingValue>"
)]
pub struct DiffSettings {
    values: BTreeMap<&'static str, SettingValue>,
}

impl Default for DiffSettings {
    fn default() -> Self {
        let values = SETTINGS
            .iter()
            .map(|spec| {
                let value = match spec.kind {
                    SettingKind::Select { default, .. } => SettingValue::Text(default.to_string()),
                    SettingKind::Switch { default } => SettingValue::Flag(default),
                };
                (spec.key, value)
            })
            .collect();
        Self { values }
    }
}

impl DiffSettings {
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    /// Set one key, validating against the catalog.
    pub fn set(&mut self, key: &str, value: SettingValue) -> Result<(), SettingsError> {
        let spec = lookup(key).ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        match (&spec.kind, &value) {
            (SettingKind::Switch { .. }, SettingValue::Flag(_)) => {}
            (SettingKind::Select { values, .. }, SettingValue::Text(text))
                if values.admits(text) => {}
            _ => {
                return Err(SettingsError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
        self.values.insert(spec.key, value);
        Ok(())
    }

    /// Whether a key currently takes effect, honoring parent switches.
    pub fn is_effective(&self, key: &str) -> bool {
        let Some(spec) = lookup(key) else {
            return false;
        };
        match spec.parent {
            Some(parent) => matches!(self.values.get(parent), Some(SettingValue::Flag(true))),
            None => true,
        }
    }

    /// All keys and stringified values, in catalog order, ready for the
    /// diff request form.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        SETTINGS
            .iter()
            .map(|spec| {
                let value = self
                    .values
                    .get(spec.key)
                    .expect("every catalog key has a value");
                (spec.key, value.to_string())
            })
            .collect()
    }
}

impl From<BTreeMap<String, SettingValue>> for DiffSettings {
    fn from(raw: BTreeMap<String, SettingValue>) -> Self {
        let mut settings = DiffSettings::default();
        for (key, value) in raw {
            if let Err(err) = settings.set(&key, value) {
                warn!(%err, "ignoring persisted setting");
            }
        }
        settings
    }
}

impl From<DiffSettings> for BTreeMap<String, SettingValue> {
    fn from(settings: DiffSettings) -> Self {
        settings
            .values
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}
