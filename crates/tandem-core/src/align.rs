//! Blank-row insertion that lines the two panes up
//!
//! Alignment never deletes or reorders a real row; it only inserts blank
//! padding until every operation's marked rows occupy matching index
//! ranges on both sides. Anchored kinds are placed in one eager pass;
//! cross-referencing kinds are resolved one insertion at a time until no
//! candidate remains.

use crate::op::{EditOp, OpId, OpKind, OpMap};
use crate::row::{index_of_line, Row, Side};
use std::cmp::Ordering;
use tracing::warn;

/// Pad both row sequences with blank rows until the operations line up.
pub fn align_rows(src: &mut Vec<Row>, dest: &mut Vec<Row>, ops: &OpMap) {
    // Sentinel blanks keep the insertion point in range when an anchor
    // sits on the last row.
    src.push(Row::blank(Side::Src));
    dest.push(Row::blank(Side::Dest));

    insert_anchored(src, dest, ops);
    insert_crossing(src, dest, ops);

    src.pop();
    dest.pop();
}

/// Place padding for the kinds whose insertion point is unambiguous:
/// `delete`/`insert` with both anchors supplied, and `split`/`merge`.
///
/// Processed in `(src_line, dest_line)` order so earlier insertions never
/// shift a later anchor above them.
fn insert_anchored(src: &mut Vec<Row>, dest: &mut Vec<Row>, ops: &OpMap) {
    let mut ordered: Vec<(OpId, &EditOp)> = ops.iter().map(|(&id, op)| (id, op)).collect();
    ordered.sort_by_key(|(_, op)| (op.src_line.unwrap_or(0), op.dest_line.unwrap_or(0)));

    for (id, op) in ordered {
        let len = op.block_len();
        match op.kind {
            // A deletion pads the destination; without a destination anchor
            // the placement is deferred to the crossing pass.
            OpKind::Delete => {
                if let Some(anchor) = op.dest_line {
                    let at = index_of_line(dest, anchor).unwrap_or(dest.len() - 1);
                    insert_padding(dest, at, len, Side::Dest, id);
                }
            }
            OpKind::Insert => {
                if let Some(anchor) = op.src_line {
                    let at = index_of_line(src, anchor).unwrap_or(src.len() - 1);
                    insert_padding(src, at, len, Side::Src, id);
                }
            }
            // A split owns one source row; the rest of the block pads
            // directly below it.
            OpKind::Split => {
                if let Some(at) = op.src_line.and_then(|n| index_of_line(src, n)) {
                    insert_padding(src, at + 1, len - 1, Side::Src, id);
                }
            }
            OpKind::Merge => {
                if let Some(at) = op.dest_line.and_then(|n| index_of_line(dest, n)) {
                    insert_padding(dest, at + 1, len - 1, Side::Dest, id);
                }
            }
            _ => {}
        }
    }
}

/// One pending insertion of padding rows, not yet applied.
struct Candidate {
    /// Which sequence receives the padding.
    side: Side,
    /// Insertion index into that sequence.
    index: usize,
    id: OpId,
    count: usize,
    src_line: u32,
    dest_line: u32,
}

impl Candidate {
    fn new(side: Side, index: usize, id: OpId, op: &EditOp) -> Self {
        Self {
            side,
            index,
            id,
            count: op.block_len(),
            src_line: op.src_line.unwrap_or(0),
            dest_line: op.dest_line.unwrap_or(0),
        }
    }
}

/// Deterministic priority: lowest index first; destination-side padding
/// before source-side (a removal shows before an addition); same-side ties
/// ordered by the other side's anchor line.
fn priority(a: &Candidate, b: &Candidate) -> Ordering {
    a.index
        .cmp(&b.index)
        .then_with(|| match (a.side, b.side) {
            (Side::Dest, Side::Src) => Ordering::Less,
            (Side::Src, Side::Dest) => Ordering::Greater,
            _ => Ordering::Equal,
        })
        .then_with(|| match a.side {
            Side::Dest => a.src_line.cmp(&b.src_line),
            Side::Src => a.dest_line.cmp(&b.dest_line),
        })
}

/// Resolve `move`/`copy` and anchorless `delete`/`insert` padding.
///
/// These insert at a position computed from the other side's current row
/// index, and each applied insertion shifts the indices every remaining
/// candidate would be computed against. So: collect all candidates, apply
/// only the highest-priority one, rescan. Every applied insertion
/// permanently satisfies one side of one operation, which bounds the loop
/// at two rounds per operation; the cap is a guard against bad input.
fn insert_crossing(src: &mut Vec<Row>, dest: &mut Vec<Row>, ops: &OpMap) {
    let max_rounds = ops.len() * 2 + 1;

    for _ in 0..max_rounds {
        let mut candidates: Vec<Candidate> = Vec::new();

        for (&id, op) in ops {
            let i1 = op.src_line.and_then(|n| index_of_line(src, n));
            let i2 = op.dest_line.and_then(|n| index_of_line(dest, n));

            // Already aligned.
            if op.kind == OpKind::Move && i1 == i2 {
                continue;
            }

            match op.kind {
                // Anchorless delete: pad the destination at the source
                // row's current index.
                OpKind::Delete if op.dest_line.is_none() => {
                    if let Some(i1) = i1 {
                        if !carried_at(dest, i1, id) {
                            candidates.push(Candidate::new(Side::Dest, i1, id, op));
                        }
                    }
                }
                OpKind::Insert if op.src_line.is_none() => {
                    if let Some(i2) = i2 {
                        if !carried_at(src, i2, id) {
                            candidates.push(Candidate::new(Side::Src, i2, id, op));
                        }
                    }
                }
                // A copy pads only the source: its destination rows are
                // real content, the source never had a second copy.
                OpKind::Copy => {
                    if let Some(i2) = i2 {
                        if !padded_at(src, i2, id) {
                            candidates.push(Candidate::new(Side::Src, i2, id, op));
                        }
                    }
                }
                // A move pads both sides, each gated on its own state.
                OpKind::Move => {
                    if let Some(i1) = i1 {
                        if !padded_at(dest, i1, id) {
                            candidates.push(Candidate::new(Side::Dest, i1, id, op));
                        }
                    }
                    if let Some(i2) = i2 {
                        if !padded_at(src, i2, id) {
                            candidates.push(Candidate::new(Side::Src, i2, id, op));
                        }
                    }
                }
                _ => {}
            }
        }

        let Some(best) = candidates.into_iter().min_by(priority) else {
            return;
        };

        let target = match best.side {
            Side::Src => &mut *src,
            Side::Dest => &mut *dest,
        };
        let at = best.index.min(target.len());
        insert_padding(target, at, best.count, best.side, best.id);
    }

    warn!("alignment did not settle within the iteration cap; padding left partial");
}

/// Row at `index` exists and is marked by `id`.
fn carried_at(rows: &[Row], index: usize, id: OpId) -> bool {
    rows.get(index).is_some_and(|row| row.carries(id))
}

/// Row at `index` is padding already inserted for `id`.
fn padded_at(rows: &[Row], index: usize, id: OpId) -> bool {
    rows.get(index)
        .is_some_and(|row| row.is_blank() && row.carries(id))
}

fn insert_padding(rows: &mut Vec<Row>, at: usize, count: usize, side: Side, id: OpId) {
    let at = at.min(rows.len());
    rows.splice(at..at, (0..count).map(|_| Row::padding(side, id)));
}

/// Extend each operation's membership over the blank rows inside its
/// contiguous span, so background shading shows no gap.
///
/// The span per side runs from the first to the last real row marked by
/// the operation; every row in between joins `block_ids`, padding
/// included. Re-running is a no-op on already-propagated rows.
pub fn propagate_blocks(src: &mut [Row], dest: &mut [Row], ops: &OpMap) {
    for &id in ops.keys() {
        propagate_side(src, id);
        propagate_side(dest, id);
    }
}

fn propagate_side(rows: &mut [Row], id: OpId) {
    let marked_real = |row: &Row| row.number.is_some() && row.carries(id);

    let Some(first) = rows.iter().position(marked_real) else {
        return;
    };
    let Some(last) = rows.iter().rposition(marked_real) else {
        return;
    };

    for row in &mut rows[first..=last] {
        if !row.block_ids.contains(&id) {
            row.block_ids.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::ingest;
    use crate::row::{annotate, split_content};

    fn build(
        src_text: &str,
        dest_text: &str,
        ops_json: &[&str],
    ) -> (Vec<Row>, Vec<Row>, OpMap) {
        let mut src = split_content(src_text, Side::Src);
        let mut dest = split_content(dest_text, Side::Dest);
        let ops = ingest(
            ops_json
                .iter()
                .map(|json| serde_json::from_str(json).unwrap())
                .collect(),
        );
        annotate(&mut src, &mut dest, &ops);
        align_rows(&mut src, &mut dest, &ops);
        (src, dest, ops)
    }

    fn numbers(rows: &[Row]) -> Vec<Option<u32>> {
        rows.iter().map(|row| row.number).collect()
    }

    fn real_count(rows: &[Row]) -> usize {
        rows.iter().filter(|row| row.number.is_some()).count()
    }

    #[test]
    fn test_delete_pads_destination() {
        let (src, dest, _) = build(
            "a\nb\nc",
            "a\nc",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );

        assert_eq!(numbers(&src), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(numbers(&dest), vec![Some(1), None, Some(2)]);
        assert!(dest[1].carries(1), "padding is seeded with the op id");
    }

    #[test]
    fn test_insert_pads_source() {
        let (src, dest, _) = build(
            "a\nc",
            "a\nb\nc",
            &[r#"{"mode": "insert", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );

        assert_eq!(numbers(&src), vec![Some(1), None, Some(2)]);
        assert_eq!(numbers(&dest), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_delete_at_end_of_destination() {
        // The destination anchor points one past its last line; padding
        // still lands at the end rather than out of range.
        let (_, dest, _) = build(
            "a\nb\nc",
            "a",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "block_length": 2, "edit_action": ""}"#],
        );

        assert_eq!(numbers(&dest), vec![Some(1), None, None]);
    }

    #[test]
    fn test_split_pads_below_the_source_row() {
        let (src, dest, _) = build(
            "x\nyz\nw",
            "x\ny\nz\nw",
            &[r#"{"mode": "split", "src_line": 2, "dest_line": 2, "block_length": 2, "edit_action": ""}"#],
        );

        assert_eq!(numbers(&src), vec![Some(1), Some(2), None, Some(3)]);
        assert_eq!(numbers(&dest), vec![Some(1), Some(2), Some(3), Some(4)]);
        assert!(src[2].carries(1));
    }

    #[test]
    fn test_merge_pads_below_the_destination_row() {
        let (src, dest, _) = build(
            "x\ny\nz\nw",
            "x\nyz\nw",
            &[r#"{"mode": "merge", "src_line": 2, "dest_line": 2, "block_length": 2, "edit_action": ""}"#],
        );

        assert_eq!(numbers(&src), vec![Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(numbers(&dest), vec![Some(1), Some(2), None, Some(3)]);
    }

    #[test]
    fn test_move_pads_both_sides() {
        let (src, dest, _) = build(
            "a\nb\nc",
            "b\nc\na",
            &[r#"{"mode": "move", "src_line": 1, "dest_line": 3, "edit_action": ""}"#],
        );

        // Old position gets destination padding, new position gets source
        // padding; both blanks carry the op.
        assert_eq!(numbers(&src), vec![Some(1), Some(2), Some(3), None]);
        assert_eq!(numbers(&dest), vec![None, Some(1), Some(2), Some(3)]);
        assert!(dest[0].carries(1));
        assert!(src[3].carries(1));
    }

    #[test]
    fn test_crossing_moves_settle() {
        // Source order reversed on the destination: A goes 1 -> 2 while
        // B goes 2 -> 1. The lower insertion index wins first, after which
        // B's rows already coincide and only A needs padding.
        let (src, dest, ops) = build(
            "a\nb",
            "b\na",
            &[
                r#"{"mode": "move", "src_line": 1, "dest_line": 2, "edit_action": ""}"#,
                r#"{"mode": "move", "src_line": 2, "dest_line": 1, "edit_action": ""}"#,
            ],
        );

        assert_eq!(numbers(&src), vec![Some(1), Some(2), None]);
        assert_eq!(numbers(&dest), vec![None, Some(1), Some(2)]);
        assert!(dest[0].carries(1) && src[2].carries(1));

        // B settled without padding: its rows share an index.
        let op = &ops[&2];
        let i1 = index_of_line(&src, op.src_line.unwrap()).unwrap();
        let i2 = index_of_line(&dest, op.dest_line.unwrap()).unwrap();
        assert_eq!(i1, i2);
    }

    #[test]
    fn test_copy_pads_source_only() {
        let (src, dest, _) = build(
            "a\nb",
            "a\nb\na",
            &[r#"{"mode": "copy", "src_line": 1, "dest_line": 3, "edit_action": ""}"#],
        );

        assert_eq!(real_count(&dest), 3);
        assert_eq!(numbers(&src), vec![Some(1), Some(2), None]);
        assert!(src[2].carries(1));
    }

    #[test]
    fn test_anchorless_delete_defers_to_crossing_pass() {
        // No destination anchor at all: the destination is padded at the
        // source row's index instead.
        let (src, dest, _) = build(
            "a\nb\nc",
            "a\nc",
            &[r#"{"mode": "delete", "src_line": 2, "edit_action": ""}"#],
        );

        assert_eq!(numbers(&src), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(numbers(&dest), vec![Some(1), None, Some(2)]);
    }

    #[test]
    fn test_alignment_only_adds_blank_rows() {
        let (src, dest, _) = build(
            "a\nb\nc\nd\ne",
            "c\nd\na\nb\nx",
            &[
                r#"{"mode": "move", "src_line": 1, "dest_line": 3, "block_length": 2, "edit_action": ""}"#,
                r#"{"mode": "delete", "src_line": 5, "edit_action": ""}"#,
                r#"{"mode": "insert", "dest_line": 5, "edit_action": ""}"#,
            ],
        );

        assert_eq!(real_count(&src), 5);
        assert_eq!(real_count(&dest), 5);

        // Real rows keep their original order.
        let real_src: Vec<u32> = src.iter().filter_map(|r| r.number).collect();
        assert_eq!(real_src, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_sentinels_are_removed() {
        let (src, dest, _) = build("a", "a", &[]);
        assert_eq!(src.len(), 1);
        assert_eq!(dest.len(), 1);
    }

    #[test]
    fn test_block_propagation_covers_interior_padding() {
        // An unrelated deletion pads the destination in the middle of the
        // updated block; the sandwiched blank joins the block for shading.
        let (mut src, mut dest, ops) = build(
            "a\nb\nx",
            "a\nb",
            &[
                r#"{"mode": "update", "src_line": 1, "dest_line": 1, "block_length": 2, "edit_action": ""}"#,
                r#"{"mode": "delete", "src_line": 3, "dest_line": 2, "edit_action": ""}"#,
            ],
        );
        assert_eq!(numbers(&dest), vec![Some(1), None, Some(2)]);

        propagate_blocks(&mut src, &mut dest, &ops);

        // Block 1 spans dest rows 0..=2, including the padding that only
        // op 2 put there.
        assert!(dest.iter().all(|row| row.block_ids.contains(&1)));
        assert!(dest[1].carries(2) && !dest[1].carries(1));
    }

    #[test]
    fn test_block_propagation_is_idempotent() {
        let (mut src, mut dest, ops) = build(
            "a\nb\nc",
            "a\nc",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );

        propagate_blocks(&mut src, &mut dest, &ops);
        let snapshot: Vec<Vec<OpId>> = src.iter().map(|r| r.block_ids.clone()).collect();
        propagate_blocks(&mut src, &mut dest, &ops);
        let again: Vec<Vec<OpId>> = src.iter().map(|r| r.block_ids.clone()).collect();

        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_blank_only_side_contributes_no_block_span() {
        let (mut src, mut dest, ops) = build(
            "a\nb\nc",
            "a\nc",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );
        propagate_blocks(&mut src, &mut dest, &ops);

        // The destination only has padding for this op, so no dest row is
        // shaded for it.
        assert!(dest.iter().all(|row| !row.block_ids.contains(&1)));
        assert!(src[1].block_ids.contains(&1));
    }
}
