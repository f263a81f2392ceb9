//! Connector geometry between the two panes

use crate::op::{EditOp, OpId, OpKind, OpMap};
use crate::row::{index_of_line, Row};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// How connector endpoints are derived from the row sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Rows are padded so related content shares an index; endpoints come
    /// from the rows that carry the operation.
    #[default]
    Aligned,
    /// No padding; endpoints come straight from the operation's line
    /// numbers.
    Compact,
}

/// Row-index endpoints of the line drawn between the panes for one
/// operation. Ranges are half-open; `start == end` is a collapsed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub kind: OpKind,
    pub src_start: usize,
    pub src_end: usize,
    pub dest_start: usize,
    pub dest_end: usize,
}

/// One connector per operation id.
pub type ConnectorMap = FxHashMap<OpId, Connector>;

/// Compute connector endpoints for every operation against the current row
/// sequences. Recomputed whole whenever the mode or the content changes.
pub fn build_connectors(
    src: &[Row],
    dest: &[Row],
    ops: &OpMap,
    mode: LinkMode,
) -> ConnectorMap {
    let mut connectors = ConnectorMap::default();

    for (&id, op) in ops {
        let connector = match mode {
            LinkMode::Aligned => aligned_connector(src, dest, id, op.kind),
            LinkMode::Compact => compact_connector(src, dest, op),
        };
        connectors.insert(id, connector);
    }

    connectors
}

/// Endpoints from the rows carrying the id, skipping padding. An insert's
/// source side and a delete's destination side are padding by
/// construction, so padding counts there.
fn aligned_connector(src: &[Row], dest: &[Row], id: OpId, kind: OpKind) -> Connector {
    let src_valid = |row: &Row| (kind == OpKind::Insert || row.number.is_some()) && row.carries(id);
    let dest_valid = |row: &Row| (kind == OpKind::Delete || row.number.is_some()) && row.carries(id);

    let (src_start, src_end) = span(src, src_valid);
    let (dest_start, dest_end) = span(dest, dest_valid);

    Connector {
        kind,
        src_start,
        src_end,
        dest_start,
        dest_end,
    }
}

fn span(rows: &[Row], valid: impl Fn(&Row) -> bool) -> (usize, usize) {
    match rows.iter().position(|row| valid(row)) {
        Some(first) => {
            let last = rows.iter().rposition(|row| valid(row)).unwrap_or(first);
            (first, last + 1)
        }
        None => (0, 0),
    }
}

/// Endpoints straight from line numbers, then collapsed per kind: a delete
/// has a single destination point, an insert a single source point, a
/// split one source row, a merge one destination row.
fn compact_connector(src: &[Row], dest: &[Row], op: &EditOp) -> Connector {
    let len = op.block_len() as u32;

    let (mut src_start, mut src_end) = number_span(src, op.src_line, len);
    let (mut dest_start, mut dest_end) = number_span(dest, op.dest_line, len);

    match op.kind {
        OpKind::Delete => dest_end = dest_start,
        OpKind::Insert => src_end = src_start,
        OpKind::Split => src_end = src_start + 1,
        OpKind::Merge => dest_end = dest_start + 1,
        _ => {}
    }

    Connector {
        kind: op.kind,
        src_start,
        src_end,
        dest_start,
        dest_end,
    }
}

fn number_span(rows: &[Row], line: Option<u32>, len: u32) -> (usize, usize) {
    let Some(start) = line.and_then(|n| index_of_line(rows, n)) else {
        return (0, 0);
    };
    let end = line
        .and_then(|n| index_of_line(rows, n + len - 1))
        .map(|i| i + 1)
        .unwrap_or(start);
    (start, end)
}
