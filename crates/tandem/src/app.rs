//! Application state and pipeline driver

use tandem_core::{DiffView, LinkMode, OpId, OpMap};

use crate::config::Config;

/// The main application state.
///
/// Owns the two raw contents, the operation map, and every structure
/// derived from them. Derived state is rebuilt whole by [`App::rebuild`]
/// and discarded by [`App::clear`]; nothing is updated incrementally.
pub struct App {
    pub src_name: String,
    pub dest_name: String,
    src_content: String,
    dest_content: String,
    pub ops: OpMap,
    /// Current derived view; None after a clear.
    pub view: Option<DiffView>,
    /// Padded rows (true) or raw line numbers (false).
    pub align: bool,
    /// A rebuild must not start while one is in flight.
    loading: bool,
    pub scroll_offset: usize,
    /// Operation whose connector is drawn highlighted.
    pub active_id: Option<OpId>,
    pub should_quit: bool,
    pub gutter_width: u16,
}

impl App {
    pub fn new(
        config: &Config,
        src_name: String,
        src_content: String,
        dest_name: String,
        dest_content: String,
        ops: OpMap,
    ) -> Self {
        let mut app = Self {
            src_name,
            dest_name,
            src_content,
            dest_content,
            ops,
            view: None,
            align: config.ui.align,
            loading: false,
            scroll_offset: 0,
            active_id: None,
            should_quit: false,
            gutter_width: config.ui.gutter_width,
        };
        app.rebuild();
        app
    }

    pub fn mode(&self) -> LinkMode {
        if self.align {
            LinkMode::Aligned
        } else {
            LinkMode::Compact
        }
    }

    /// Recompute every derived structure from the current inputs.
    pub fn rebuild(&mut self) {
        if self.loading {
            return;
        }
        self.loading = true;

        let view = DiffView::build(
            &self.src_content,
            &self.dest_content,
            &self.ops,
            self.mode(),
        );
        self.scroll_offset = self.scroll_offset.min(view.row_count().saturating_sub(1));
        self.view = Some(view);

        self.loading = false;
    }

    /// Switch between padded and compact display and repaint.
    pub fn toggle_align(&mut self) {
        self.align = !self.align;
        self.rebuild();
    }

    /// Drop the operations and everything derived from them.
    pub fn clear(&mut self) {
        if self.loading {
            return;
        }
        self.ops.clear();
        self.view = None;
        self.active_id = None;
        self.scroll_offset = 0;
    }

    pub fn row_count(&self) -> usize {
        self.view.as_ref().map(DiffView::row_count).unwrap_or(0)
    }

    pub fn has_difference(&self) -> bool {
        !self.ops.is_empty()
    }

    /// Move the connector highlight to the next operation, wrapping.
    pub fn next_op(&mut self) {
        let ids: Vec<OpId> = self.ops.keys().copied().collect();
        if ids.is_empty() {
            return;
        }
        self.active_id = match self.active_id {
            Some(current) => ids
                .iter()
                .copied()
                .find(|&id| id > current)
                .or(Some(ids[0])),
            None => Some(ids[0]),
        };
    }

    /// Move the connector highlight to the previous operation, wrapping.
    pub fn prev_op(&mut self) {
        let ids: Vec<OpId> = self.ops.keys().copied().collect();
        if ids.is_empty() {
            return;
        }
        self.active_id = match self.active_id {
            Some(current) => ids
                .iter()
                .rev()
                .copied()
                .find(|&id| id < current)
                .or_else(|| ids.last().copied()),
            None => ids.last().copied(),
        };
    }

    pub fn scroll_down(&mut self, count: usize, visible_height: usize) {
        let max = self.row_count().saturating_sub(visible_height.max(1));
        self.scroll_offset = (self.scroll_offset + count).min(max);
    }

    pub fn scroll_up(&mut self, count: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::ingest;

    fn make_app(src: &str, dest: &str, ops_json: &[&str]) -> App {
        let ops = ingest(
            ops_json
                .iter()
                .map(|json| serde_json::from_str(json).unwrap())
                .collect(),
        );
        App::new(
            &Config::default(),
            "old.txt".into(),
            src.into(),
            "new.txt".into(),
            dest.into(),
            ops,
        )
    }

    #[test]
    fn test_new_builds_an_aligned_view() {
        let app = make_app(
            "a\nb\nc",
            "a\nc",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );

        let view = app.view.as_ref().unwrap();
        assert_eq!(view.mode, LinkMode::Aligned);
        assert!(view.dest_rows[1].is_blank());
    }

    #[test]
    fn test_toggle_align_repaints_without_padding() {
        let mut app = make_app(
            "a\nb\nc",
            "a\nc",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );

        app.toggle_align();

        let view = app.view.as_ref().unwrap();
        assert_eq!(view.mode, LinkMode::Compact);
        assert!(view.dest_rows.iter().all(|row| !row.is_blank()));

        app.toggle_align();
        assert_eq!(app.view.as_ref().unwrap().mode, LinkMode::Aligned);
    }

    #[test]
    fn test_clear_discards_derived_state() {
        let mut app = make_app(
            "a\nb",
            "a",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );
        app.next_op();
        assert!(app.active_id.is_some());

        app.clear();

        assert!(app.view.is_none());
        assert!(app.ops.is_empty());
        assert!(app.active_id.is_none());
        assert_eq!(app.row_count(), 0);
    }

    #[test]
    fn test_op_cycling_wraps() {
        let mut app = make_app(
            "a\nb\nc",
            "c\na\nb",
            &[
                r#"{"mode": "move", "src_line": 1, "dest_line": 2, "block_length": 2, "edit_action": ""}"#,
                r#"{"mode": "move", "src_line": 3, "dest_line": 1, "edit_action": ""}"#,
            ],
        );

        app.next_op();
        assert_eq!(app.active_id, Some(1));
        app.next_op();
        assert_eq!(app.active_id, Some(2));
        app.next_op();
        assert_eq!(app.active_id, Some(1), "wraps to the first operation");
        app.prev_op();
        assert_eq!(app.active_id, Some(2), "wraps backwards too");
    }

    #[test]
    fn test_scroll_clamps_to_content() {
        let mut app = make_app("a\nb\nc\nd\ne", "a\nb\nc\nd\ne", &[]);
        app.scroll_down(100, 2);
        assert_eq!(app.scroll_offset, 3);
        app.scroll_up(100);
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn test_identical_files_report_no_difference() {
        let app = make_app("same", "same", &[]);
        assert!(!app.has_difference());
        assert_eq!(app.row_count(), 1);
    }
}
