//! Edit operations produced by the external diff oracle

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of one edit operation.
///
/// Ids are assigned at ingestion in insertion order starting at 1, so 0
/// never names a real operation and can stand in for "no id".
pub type OpId = u32;

/// The kind of difference one operation describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Delete,
    Insert,
    Move,
    Copy,
    Update,
    #[serde(rename = "m_update")]
    MoveUpdate,
    #[serde(rename = "c_update")]
    CopyUpdate,
    Split,
    Merge,
    /// A kind this viewer does not know about. Kept so one odd operation
    /// cannot fail the whole batch; the annotation pass reports and skips it.
    #[serde(other)]
    Unknown,
}

impl OpKind {
    /// True for the kinds that carry per-side updated character ranges.
    pub fn is_update(self) -> bool {
        matches!(self, OpKind::Update | OpKind::MoveUpdate | OpKind::CopyUpdate)
    }
}

/// How a moved block travelled, as described by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveType {
    #[serde(rename = "h")]
    Horizontal,
    #[serde(rename = "u")]
    Up,
    #[serde(rename = "d")]
    Down,
}

/// Inclusive character range marked as updated within one line.
///
/// An empty range means the change sits entirely on the other side; the
/// inline highlighter skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct CharRange {
    bounds: Option<(u32, u32)>,
}

impl CharRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            bounds: Some((start, end)),
        }
    }

    pub fn empty() -> Self {
        Self { bounds: None }
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Start/end as character offsets, or None for an empty range.
    pub fn bounds(&self) -> Option<(usize, usize)> {
        self.bounds.map(|(s, e)| (s as usize, e as usize))
    }
}

impl From<Vec<u32>> for CharRange {
    fn from(raw: Vec<u32>) -> Self {
        match raw.as_slice() {
            [start, end, ..] => CharRange::new(*start, *end),
            _ => CharRange::empty(),
        }
    }
}

impl From<CharRange> for Vec<u32> {
    fn from(range: CharRange) -> Self {
        match range.bounds {
            Some((start, end)) => vec![start, end],
            None => Vec::new(),
        }
    }
}

/// One unit of difference between the two texts, as the oracle reports it.
///
/// `src_line`/`dest_line` are 1-based; which of them is meaningful depends
/// on `kind`. Either anchor may be absent for `delete`/`insert`, in which
/// case the alignment pass places the padding from the opposite side's
/// current position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditOp {
    #[serde(rename = "mode")]
    pub kind: OpKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_line: Option<u32>,
    /// Count of contiguous lines the operation spans; absent means 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_length: Option<u32>,
    /// Updated character ranges, one list per side (src, dest).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub str_diff: Option<[Vec<CharRange>; 2]>,
    /// Intra-block `[src, dest]` line pairs for block operations that also
    /// contain line updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates: Option<Vec<[u32; 2]>>,
    /// Indentation delta reported for the block; not used for alignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent_offset: Option<i32>,
    /// Human-readable description of the edit.
    #[serde(default)]
    pub edit_action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_type: Option<MoveType>,
}

impl EditOp {
    /// Block length with the oracle's default of one line applied.
    pub fn block_len(&self) -> usize {
        self.block_length.unwrap_or(1).max(1) as usize
    }

    /// Updated character ranges for one side, if this is an update-style
    /// operation that carries them.
    pub fn update_ranges(&self, side: crate::row::Side) -> Option<&[CharRange]> {
        let pair = self.str_diff.as_ref()?;
        match side {
            crate::row::Side::Src => Some(&pair[0]),
            crate::row::Side::Dest => Some(&pair[1]),
        }
    }
}

/// The full set of operations for one comparison, keyed by id.
///
/// Ids are monotonic, so iteration order is insertion order.
pub type OpMap = BTreeMap<OpId, EditOp>;

/// Assign insertion-order ids (starting at 1) to a raw operation list.
///
/// The id is stored as the map key and never recomputed from position.
pub fn ingest(ops: Vec<EditOp>) -> OpMap {
    (1u32..).zip(ops).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_assigns_ids_from_one() {
        let ops = vec![
            op_json(r#"{"mode": "delete", "src_line": 2, "edit_action": "a"}"#),
            op_json(r#"{"mode": "insert", "dest_line": 5, "edit_action": "b"}"#),
        ];
        let map = ingest(ops);
        assert_eq!(map.len(), 2);
        assert_eq!(map[&1].kind, OpKind::Delete);
        assert_eq!(map[&2].kind, OpKind::Insert);
        assert!(!map.contains_key(&0), "id 0 is reserved");
    }

    #[test]
    fn test_unknown_kind_deserializes() {
        let op = op_json(r#"{"mode": "transmogrify", "src_line": 1, "edit_action": ""}"#);
        assert_eq!(op.kind, OpKind::Unknown);
    }

    #[test]
    fn test_block_update_kinds_deserialize() {
        let op = op_json(r#"{"mode": "m_update", "src_line": 1, "dest_line": 3, "edit_action": ""}"#);
        assert_eq!(op.kind, OpKind::MoveUpdate);
        assert!(op.kind.is_update());
        let op = op_json(r#"{"mode": "c_update", "src_line": 1, "dest_line": 3, "edit_action": ""}"#);
        assert_eq!(op.kind, OpKind::CopyUpdate);
    }

    #[test]
    fn test_char_ranges_and_block_length_default() {
        let op = op_json(
            r#"{"mode": "update", "src_line": 4, "dest_line": 4,
                "str_diff": [[[0, 3], []], [[2, 5]]], "edit_action": ""}"#,
        );
        assert_eq!(op.block_len(), 1);
        let src = op.update_ranges(crate::row::Side::Src).unwrap();
        assert_eq!(src.len(), 2);
        assert_eq!(src[0].bounds(), Some((0, 3)));
        assert!(src[1].is_empty());
        let dest = op.update_ranges(crate::row::Side::Dest).unwrap();
        assert_eq!(dest[0].bounds(), Some((2, 5)));
    }

    #[test]
    fn test_move_metadata_roundtrip() {
        let op = op_json(
            r#"{"mode": "move", "src_line": 1, "dest_line": 9, "block_length": 3,
                "move_type": "d", "indent_offset": 4, "edit_action": "moved down"}"#,
        );
        assert_eq!(op.move_type, Some(MoveType::Down));
        assert_eq!(op.block_len(), 3);
        let json = serde_json::to_value(&op).unwrap();
        let back: EditOp = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }

    fn op_json(json: &str) -> EditOp {
        serde_json::from_str(json).expect("operation JSON should parse")
    }
}
