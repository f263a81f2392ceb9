//! Full pipeline from raw contents to renderable rows and connectors

use crate::align::{align_rows, propagate_blocks};
use crate::connector::{build_connectors, ConnectorMap, LinkMode};
use crate::op::OpMap;
use crate::row::{annotate, split_content, Row, Side};

/// Everything the renderer needs for one comparison.
///
/// Derived wholesale from the inputs; rebuilt from scratch on every reload
/// or mode toggle, never updated incrementally.
#[derive(Debug, Clone)]
pub struct DiffView {
    pub src_rows: Vec<Row>,
    pub dest_rows: Vec<Row>,
    pub connectors: ConnectorMap,
    pub mode: LinkMode,
}

impl DiffView {
    /// Run the whole pipeline: split, annotate, then (in aligned mode) pad
    /// and propagate block membership, and finally lay the connectors.
    pub fn build(src_content: &str, dest_content: &str, ops: &OpMap, mode: LinkMode) -> Self {
        let mut src_rows = split_content(src_content, Side::Src);
        let mut dest_rows = split_content(dest_content, Side::Dest);

        annotate(&mut src_rows, &mut dest_rows, ops);

        if mode == LinkMode::Aligned {
            align_rows(&mut src_rows, &mut dest_rows, ops);
            propagate_blocks(&mut src_rows, &mut dest_rows, ops);
        }

        let connectors = build_connectors(&src_rows, &dest_rows, ops, mode);

        Self {
            src_rows,
            dest_rows,
            connectors,
            mode,
        }
    }

    /// Rows to draw, which is the longer of the two sequences.
    pub fn row_count(&self) -> usize {
        self.src_rows.len().max(self.dest_rows.len())
    }
}
