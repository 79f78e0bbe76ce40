//! Per-export style cache
//!
//! Building a cell format for every cell would add one `xf` record per cell.
//! The cache builds one per [`FormatKind`] the first time it is needed and
//! hands out the same [`StyleHandle`] afterwards. It belongs to a single
//! export call and a single workbook; it is not shared across documents.

use crate::config::ExportOptions;
use crate::document::{HorizontalAlign, StyleHandle, StyleSpec, StyleTable};
use crate::types::FormatKind;

/// Title font size in points
const TITLE_FONT_SIZE: f64 = 14.0;

/// One style handle per format kind, created lazily
///
/// Not thread-safe. Only the thread that writes cells into the sheet uses it.
///
/// # Examples
///
/// ```
/// use sheetbind::config::ExportOptions;
/// use sheetbind::document::StyleTable;
/// use sheetbind::style::StyleCache;
/// use sheetbind::types::FormatKind;
///
/// let options = ExportOptions::default();
/// let mut styles = StyleTable::new();
/// let mut cache = StyleCache::new(&options);
///
/// let first = cache.get_or_create(&mut styles, FormatKind::DateTimeValue);
/// let second = cache.get_or_create(&mut styles, FormatKind::DateTimeValue);
/// assert_eq!(first, second);
/// assert_eq!(styles.style_count(), 2);
/// ```
#[derive(Debug)]
pub struct StyleCache {
    handles: [Option<StyleHandle>; FormatKind::COUNT],
    date_format: String,
    integer_format: String,
    decimal_format: String,
}

impl StyleCache {
    /// Create an empty cache using the number formats from `options`
    pub fn new(options: &ExportOptions) -> Self {
        StyleCache {
            handles: [None; FormatKind::COUNT],
            date_format: options.default_date_format.clone(),
            integer_format: options.integer_format.clone(),
            decimal_format: options.decimal_format.clone(),
        }
    }

    /// Get the handle for `kind`, building the style on first use
    pub fn get_or_create(&mut self, styles: &mut StyleTable, kind: FormatKind) -> StyleHandle {
        if let Some(handle) = self.handles[kind.index()] {
            return handle;
        }
        let handle = styles.create_style(&self.spec_for(kind));
        self.handles[kind.index()] = Some(handle);
        handle
    }

    /// Build the handles for every kind up front
    pub fn prime(&mut self, styles: &mut StyleTable) {
        for kind in FormatKind::ALL {
            self.get_or_create(styles, kind);
        }
    }

    /// Handle for `kind`, if it was already built
    pub fn get(&self, kind: FormatKind) -> Option<StyleHandle> {
        self.handles[kind.index()]
    }

    /// Number of kinds with a style built so far
    pub fn len(&self) -> usize {
        self.handles.iter().filter(|h| h.is_some()).count()
    }

    /// Check if no style was built yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn spec_for(&self, kind: FormatKind) -> StyleSpec {
        match kind {
            FormatKind::PlainText => StyleSpec::default(),
            FormatKind::Header => StyleSpec {
                bold: true,
                align: Some(HorizontalAlign::Center),
                ..Default::default()
            },
            FormatKind::Title => StyleSpec {
                bold: true,
                font_size: Some(TITLE_FONT_SIZE),
                align: Some(HorizontalAlign::Center),
                ..Default::default()
            },
            FormatKind::IntegerNumber => StyleSpec {
                num_format: Some(self.integer_format.clone()),
                ..Default::default()
            },
            FormatKind::DecimalNumber => StyleSpec {
                num_format: Some(self.decimal_format.clone()),
                ..Default::default()
            },
            FormatKind::DateTimeValue => StyleSpec {
                num_format: Some(self.date_format.clone()),
                align: Some(HorizontalAlign::Left),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_built_once_per_kind() {
        let options = ExportOptions::default();
        let mut styles = StyleTable::new();
        let mut cache = StyleCache::new(&options);

        let handles: Vec<_> = (0..1_000)
            .map(|_| cache.get_or_create(&mut styles, FormatKind::IntegerNumber))
            .collect();

        assert!(handles.iter().all(|h| *h == handles[0]));
        // default format + one integer format
        assert_eq!(styles.style_count(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_prime_builds_every_kind() {
        let options = ExportOptions::default().with_date_format("dd/mm/yyyy");
        let mut styles = StyleTable::new();
        let mut cache = StyleCache::new(&options);
        cache.prime(&mut styles);
        cache.prime(&mut styles);

        assert_eq!(cache.len(), FormatKind::COUNT);
        assert_eq!(styles.style_count(), FormatKind::COUNT + 1);

        let date = cache.get(FormatKind::DateTimeValue).unwrap();
        assert!(styles.is_date_style(date));
        let header = cache.get(FormatKind::Header).unwrap();
        let font_id = styles.cell_format(header).unwrap().font_id;
        assert!(styles.fonts()[font_id].bold);
    }

    #[test]
    fn test_caches_are_independent() {
        let options = ExportOptions::default();
        let mut first_doc = StyleTable::new();
        let mut second_doc = StyleTable::new();
        let mut first = StyleCache::new(&options);
        let mut second = StyleCache::new(&options);

        first.get_or_create(&mut first_doc, FormatKind::Header);
        second.get_or_create(&mut second_doc, FormatKind::Header);

        assert_eq!(first_doc.style_count(), 2);
        assert_eq!(second_doc.style_count(), 2);
    }
}
