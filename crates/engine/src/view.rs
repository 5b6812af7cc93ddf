//! View state snapshots.
//!
//! Every user interaction produces a new [`ViewState`]; nothing edits one in
//! place. The session swaps the snapshot in, re-runs the query and drops the
//! selection.

use serde::{Deserialize, Serialize};
use unigrid_core::clipboard::{normalize_pasted, Clipboard};

use crate::columns::{PENDING_COLUMN, PENDING_DEFAULT_FILTER, REACTIVATION_COLUMN};
use crate::query::{ColumnFilters, SortDirection, SortSpec};

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub column_filters: ColumnFilters,
    pub global_filter: String,
    pub sort: SortSpec,
    /// 1-based; clamped against the filtered row count when the page is built
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            column_filters: ColumnFilters::default(),
            global_filter: String::new(),
            sort: SortSpec::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    /// Fresh state after a load: one empty filter per header, then the
    /// load-time defaults for the pending and reactivation columns.
    pub fn for_headers(headers: &[String], page_size: usize) -> Self {
        let mut column_filters = ColumnFilters::for_headers(headers);
        let mut sort = SortSpec::default();

        if headers.iter().any(|h| h == PENDING_COLUMN) {
            column_filters.set(PENDING_COLUMN, PENDING_DEFAULT_FILTER);
        }
        if headers.iter().any(|h| h == REACTIVATION_COLUMN) {
            sort = SortSpec::by(REACTIVATION_COLUMN, SortDirection::Asc);
        }

        Self {
            column_filters,
            sort,
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    fn first_page(mut self) -> Self {
        self.page = 1;
        self
    }

    pub fn with_column_filter(&self, column: &str, value: &str) -> Self {
        let mut next = self.clone();
        next.column_filters.set(column, value.trim());
        next.first_page()
    }

    /// Typing in the search box. A non-empty search replaces the column filters.
    pub fn with_typed_global_filter(&self, text: &str) -> Self {
        let mut next = self.clone();
        next.global_filter = text.trim().to_string();
        if !next.global_filter.is_empty() {
            next.column_filters.clear();
        }
        next.first_page()
    }

    /// Paste into the search box: column filters are cleared, phone-looking
    /// text loses its formatting. An unreadable clipboard leaves the search empty.
    pub fn with_pasted_global_filter(&self, clipboard: &mut dyn Clipboard) -> Self {
        let mut next = self.clone();
        next.column_filters.clear();
        next.global_filter = match clipboard.read_text() {
            Ok(text) => normalize_pasted(&text),
            Err(e) => {
                log::warn!("could not read clipboard: {}", e);
                String::new()
            }
        };
        next.first_page()
    }

    /// Same column flips direction; a new column starts ascending.
    pub fn with_sort_toggled(&self, column: &str) -> Self {
        let mut next = self.clone();
        next.sort = match &self.sort.column {
            Some(current) if current == column => {
                SortSpec::by(column, self.sort.direction.flipped())
            }
            _ => SortSpec::by(column, SortDirection::Asc),
        };
        next.first_page()
    }

    /// Drop every filter and the sort. The page size is kept.
    pub fn cleared(&self) -> Self {
        let mut column_filters = self.column_filters.clone();
        column_filters.clear();
        Self {
            column_filters,
            page_size: self.page_size,
            ..Self::default()
        }
    }

    pub fn with_page(&self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Next page, bounded by `total_pages`.
    pub fn next_page(&self, total_pages: usize) -> Self {
        self.with_page((self.page + 1).min(total_pages.max(1)))
    }

    pub fn previous_page(&self) -> Self {
        self.with_page(self.page.saturating_sub(1))
    }

    pub fn with_page_size(&self, page_size: usize) -> Self {
        let mut next = self.clone();
        next.page_size = page_size.max(1);
        next.first_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unigrid_core::clipboard::MemoryClipboard;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn load_defaults() {
        let columns = headers(&["Source", "Pendientes_", "Reactivation"]);
        let state = ViewState::for_headers(&columns, 50);
        assert_eq!(state.column_filters.get("Pendientes_"), "processing");
        assert_eq!(state.column_filters.get("Source"), "");
        assert_eq!(state.column_filters.len(), 3);
        assert_eq!(state.sort, SortSpec::by("Reactivation", SortDirection::Asc));
        assert_eq!(state.page_size, 50);
    }

    #[test]
    fn defaults_need_exact_names() {
        let state = ViewState::for_headers(&headers(&["pendientes_", "reactivation"]), 100);
        assert!(!state.column_filters.is_active());
        assert!(!state.sort.is_active());
    }

    #[test]
    fn typing_search_clears_column_filters() {
        let state = ViewState::for_headers(&headers(&["A", "B"]), 100)
            .with_column_filter("A", " x ")
            .with_page(4);
        assert_eq!(state.column_filters.get("A"), "x");

        let searched = state.with_typed_global_filter("  hola ");
        assert_eq!(searched.global_filter, "hola");
        assert!(!searched.column_filters.is_active());
        assert_eq!(searched.column_filters.len(), 2);
        assert_eq!(searched.page, 1);
        // The previous snapshot is untouched
        assert_eq!(state.column_filters.get("A"), "x");
    }

    #[test]
    fn empty_search_keeps_column_filters() {
        let state = ViewState::for_headers(&headers(&["A"]), 100).with_column_filter("A", "x");
        assert_eq!(state.with_typed_global_filter("  ").column_filters.get("A"), "x");
    }

    #[test]
    fn paste_strips_phone_formatting() {
        let mut clipboard = MemoryClipboard::with_text("+593 (99) 123-4567");
        let state = ViewState::for_headers(&headers(&["A"]), 100).with_column_filter("A", "x");
        let pasted = state.with_pasted_global_filter(&mut clipboard);
        assert_eq!(pasted.global_filter, "593991234567");
        assert!(!pasted.column_filters.is_active());

        let mut clipboard = MemoryClipboard::with_text("  Ana Pérez ");
        assert_eq!(state.with_pasted_global_filter(&mut clipboard).global_filter, "Ana Pérez");
    }

    #[test]
    fn sort_toggle() {
        let state = ViewState::default().with_sort_toggled("Name");
        assert_eq!(state.sort, SortSpec::by("Name", SortDirection::Asc));
        let state = state.with_sort_toggled("Name");
        assert_eq!(state.sort.direction, SortDirection::Desc);
        let state = state.with_sort_toggled("City");
        assert_eq!(state.sort, SortSpec::by("City", SortDirection::Asc));
    }

    #[test]
    fn clear_all_keeps_slots_and_page_size() {
        let state = ViewState::for_headers(&headers(&["Pendientes_", "Reactivation"]), 25)
            .with_typed_global_filter("x")
            .with_page(3);
        let cleared = state.cleared();
        assert_eq!(cleared.global_filter, "");
        assert!(!cleared.sort.is_active());
        assert!(!cleared.column_filters.is_active());
        assert_eq!(cleared.column_filters.len(), 2);
        assert_eq!(cleared.page, 1);
        assert_eq!(cleared.page_size, 25);
    }

    #[test]
    fn page_navigation_is_bounded() {
        let state = ViewState::default();
        assert_eq!(state.previous_page().page, 1);
        assert_eq!(state.next_page(2).page, 2);
        assert_eq!(state.next_page(2).next_page(2).page, 2);
        assert_eq!(state.with_page(3).with_page_size(10).page, 1);
    }
}
