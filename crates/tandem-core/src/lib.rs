//! tandem-core: the line-alignment engine behind the tandem diff viewer
//!
//! Given two raw texts and the edit operations an external diff engine
//! produced for them, this crate builds the two-pane view: per-line rows
//! annotated with the operations that touch them, blank padding inserted
//! so related lines share a row index, block membership propagated over
//! interior padding, connector endpoints between the panes, and sub-line
//! highlighting of updated character ranges.
//!
//! It computes no diffs and renders no pixels; the oracle's output comes
//! in, renderable records go out.

pub mod align;
pub mod connector;
pub mod inline;
pub mod op;
pub mod patch;
pub mod row;
pub mod settings;
pub mod view;

pub use align::{align_rows, propagate_blocks};
pub use connector::{build_connectors, Connector, ConnectorMap, LinkMode};
pub use inline::{apply_update_ranges, mark_ranges, tokenize, Segment, Token, TokenKind};
pub use op::{ingest, CharRange, EditOp, MoveType, OpId, OpKind, OpMap};
pub use patch::{PatchError, PatchSet};
pub use row::{annotate, index_of_line, split_content, Row, Side};
pub use settings::{DiffSettings, SettingValue, SettingsError, SETTINGS};
pub use view::DiffView;
