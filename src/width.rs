//! Column width tracking for auto-fit

use std::sync::atomic::{AtomicUsize, Ordering};

/// Widest rendered value per column
///
/// `observe` only needs `&self`: each column holds an atomic maximum, so
/// parallel workers can record widths for the same column without a lock and
/// without lost updates. The result does not depend on the order of calls.
#[derive(Debug)]
pub struct ColumnWidthTracker {
    widths: Vec<AtomicUsize>,
}

impl ColumnWidthTracker {
    /// Create a tracker for `columns` columns, all starting at zero
    pub fn new(columns: usize) -> Self {
        ColumnWidthTracker {
            widths: (0..columns).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    /// Record a rendered byte length for a column
    ///
    /// Columns outside the tracked range are ignored.
    #[inline]
    pub fn observe(&self, column: usize, rendered_len: usize) {
        if let Some(width) = self.widths.get(column) {
            width.fetch_max(rendered_len, Ordering::Relaxed);
        }
    }

    /// Record the byte length of `text`
    pub fn observe_text(&self, column: usize, text: &str) {
        self.observe(column, text.len());
    }

    /// Current maximum of a column
    pub fn width(&self, column: usize) -> usize {
        self.widths
            .get(column)
            .map_or(0, |w| w.load(Ordering::Relaxed))
    }

    /// Number of tracked columns
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    /// Check if no columns are tracked
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Final widths: maximum plus `padding`, capped at `max_width`
    pub fn finalize(&self, padding: usize, max_width: usize) -> Vec<usize> {
        self.widths
            .iter()
            .map(|w| (w.load(Ordering::Relaxed) + padding).min(max_width))
            .collect()
    }
}
