//! Per-line render rows for the two panes

use crate::op::{OpId, OpKind, OpMap};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which pane a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Src,
    Dest,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Src => Side::Dest,
            Side::Dest => Side::Src,
        }
    }
}

/// One renderable line slot on one side, real or blank padding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub side: Side,
    /// Rich-text line content; empty for padding rows.
    pub content: String,
    /// Original 1-based line number; None marks a padding row.
    pub number: Option<u32>,
    /// Operations whose source text occupies this row, in insertion order.
    pub ids: Vec<OpId>,
    /// Operations whose contiguous rendered span covers this row.
    ///
    /// Superset of `ids` once spans are propagated; used only for unbroken
    /// background shading across interior padding.
    pub block_ids: Vec<OpId>,
}

impl Row {
    pub fn new(side: Side, number: u32, content: impl Into<String>) -> Self {
        Self {
            side,
            content: content.into(),
            number: Some(number),
            ids: Vec::new(),
            block_ids: Vec::new(),
        }
    }

    /// An unmarked blank row.
    pub fn blank(side: Side) -> Self {
        Self {
            side,
            content: String::new(),
            number: None,
            ids: Vec::new(),
            block_ids: Vec::new(),
        }
    }

    /// A blank padding row seeded with the operation that required it.
    pub fn padding(side: Side, id: OpId) -> Self {
        Self {
            side,
            content: String::new(),
            number: None,
            ids: vec![id],
            block_ids: Vec::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.number.is_none()
    }

    pub fn carries(&self, id: OpId) -> bool {
        self.ids.contains(&id)
    }
}

/// Split raw rich-text content into rows for one side.
///
/// Accepts both `\n` and `\r\n` terminators; row `i` gets line number
/// `i + 1`. Empty content yields a single empty row, matching a file with
/// no terminator at all.
pub fn split_content(content: &str, side: Side) -> Vec<Row> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .zip(1u32..)
        .map(|(line, number)| Row::new(side, number, line))
        .collect()
}

/// Index of the row holding original line `number`, if any.
pub fn index_of_line(rows: &[Row], number: u32) -> Option<usize> {
    rows.iter().position(|row| row.number == Some(number))
}

/// Stamp each operation's id onto the rows its text occupies on each side.
///
/// The affected index range per side follows the operation kind: `delete`
/// touches only the source, `insert` only the destination, block kinds both,
/// and `split`/`merge` a single row on their narrow side. A range whose
/// anchor line cannot be found is skipped; an unknown kind is reported and
/// skipped without failing the batch.
pub fn annotate(src: &mut [Row], dest: &mut [Row], ops: &OpMap) {
    for (&id, op) in ops {
        let len = op.block_len();

        let (src_range, dest_range) = match op.kind {
            OpKind::Delete => (line_range(src, op.src_line, len), None),
            OpKind::Insert => (None, line_range(dest, op.dest_line, len)),
            OpKind::Move
            | OpKind::Copy
            | OpKind::Update
            | OpKind::MoveUpdate
            | OpKind::CopyUpdate => (
                line_range(src, op.src_line, len),
                line_range(dest, op.dest_line, len),
            ),
            OpKind::Split => (
                line_range(src, op.src_line, 1),
                line_range(dest, op.dest_line, len),
            ),
            OpKind::Merge => (
                line_range(src, op.src_line, len),
                line_range(dest, op.dest_line, 1),
            ),
            OpKind::Unknown => {
                warn!(id, action = %op.edit_action, "skipping operation of unknown kind");
                continue;
            }
        };

        if let Some((start, end)) = src_range {
            stamp(src, start, end, id);
        }
        if let Some((start, end)) = dest_range {
            stamp(dest, start, end, id);
        }
    }
}

fn line_range(rows: &[Row], line: Option<u32>, len: usize) -> Option<(usize, usize)> {
    let start = index_of_line(rows, line?)?;
    Some((start, start + len - 1))
}

fn stamp(rows: &mut [Row], start: usize, end: usize, id: OpId) {
    for row in rows.iter_mut().take(end + 1).skip(start) {
        row.ids.push(id);
    }
}
