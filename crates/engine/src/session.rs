//! One operator session: the loaded dataset plus the current view over it.
//!
//! Pipeline per load:
//!   start contact lookup -> read source -> merge -> correlate -> exclude
//!   reference rows -> derive headers -> fresh view (with defaults) -> query
//!
//! Afterwards every interaction replaces the [`ViewState`] snapshot through
//! [`Session::apply`], which re-runs the query and drops the selection.
//! Typed search text goes through a [`Debouncer`] first, so a burst of
//! keystrokes costs one query.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use unigrid_core::clipboard::{copy_text, Clipboard};
use unigrid_core::range::CellRef;
use unigrid_core::selection::{CellGrid, Modifiers, PointerButton, SelectionModel};

use crate::columns::derive_headers;
use crate::correlate::{correlate, CorrelationMap};
use crate::error::LoadError;
use crate::input::{Debouncer, DEFAULT_DEBOUNCE};
use crate::load::{LoadReport, RowSource, SourceLoad};
use crate::merge::{exclude_reference_rows, merge_batches};
use crate::paginate::PageInfo;
use crate::provider::{ContactProvider, PendingContacts};
use crate::query::{query, RowView};
use crate::row::Row;
use crate::view::{ViewState, DEFAULT_PAGE_SIZE};

/// Counts shown under the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub rows_on_page: usize,
    pub filtered_rows: usize,
    pub total_rows: usize,
    pub page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

/// A page of the current view.
#[derive(Debug)]
pub struct Page<'a> {
    pub rows: Vec<&'a Row>,
    pub info: PageInfo,
    pub report: PageReport,
}

#[derive(Debug)]
pub struct Session {
    rows: Vec<Row>,
    headers: Vec<String>,
    correlation: CorrelationMap,
    view: ViewState,
    row_view: RowView,
    selection: SelectionModel,
    report: Option<LoadReport>,
    search_input: Debouncer<String>,
    page_size: usize,
    input_window: Duration,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Session {
    /// `page_size` is the size fresh loads start with.
    pub fn new(page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            headers: Vec::new(),
            correlation: CorrelationMap::default(),
            view: ViewState {
                page_size: page_size.max(1),
                ..ViewState::default()
            },
            row_view: RowView::default(),
            selection: SelectionModel::new(),
            report: None,
            search_input: Debouncer::new(DEFAULT_DEBOUNCE),
            page_size: page_size.max(1),
            input_window: DEFAULT_DEBOUNCE,
        }
    }

    /// Quiet period before typed search text is applied.
    pub fn with_input_window(mut self, window: Duration) -> Self {
        self.search_input = Debouncer::new(window);
        self.input_window = window;
        self
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Drop the dataset and every piece of derived state.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size).with_input_window(self.input_window);
    }

    /// Full load. The contact lookup runs while the source is read.
    pub fn load(
        &mut self,
        source: &dyn RowSource,
        contacts: Arc<dyn ContactProvider>,
    ) -> Result<&LoadReport, LoadError> {
        self.reset();
        let pending = PendingContacts::spawn(contacts);
        let loaded = source.read().map_err(LoadError::Source)?;
        self.run_pipeline(loaded, pending)
    }

    /// Run the pipeline over already-read batches.
    pub fn load_batches(
        &mut self,
        loaded: SourceLoad,
        pending: PendingContacts,
    ) -> Result<&LoadReport, LoadError> {
        self.reset();
        self.run_pipeline(loaded, pending)
    }

    /// Expects a freshly reset session.
    fn run_pipeline(
        &mut self,
        loaded: SourceLoad,
        pending: PendingContacts,
    ) -> Result<&LoadReport, LoadError> {
        let SourceLoad { batches, skipped } = loaded;
        for file in &skipped {
            log::warn!("skipped {}: {}", file.name, file.reason);
        }
        let files_processed = batches.len();

        let mut rows = merge_batches(batches);
        let rows_merged = rows.len();
        if rows.is_empty() {
            log::warn!("no rows read from {} file(s)", files_processed);
            return Err(LoadError::NoData);
        }

        // Reference rows take part in correlation, so they are dropped after it
        let external = pending.wait();
        let (correlation, correlation_report) = correlate(&mut rows, external);
        let rows_excluded = exclude_reference_rows(&mut rows);

        let headers = derive_headers(&rows);
        for row in rows.iter_mut() {
            row.fill_absent(&headers);
        }

        let report = LoadReport {
            files_processed,
            files_skipped: skipped,
            rows_merged,
            rows_excluded,
            rows: rows.len(),
            headers: headers.len(),
            correlation: correlation_report,
        };
        log::info!("{}", report.status_text());

        self.view = ViewState::for_headers(&headers, self.page_size);
        self.rows = rows;
        self.headers = headers;
        self.correlation = correlation;
        self.requery();

        let report: &LoadReport = self.report.insert(report);
        Ok(report)
    }

    // -------------------------------------------------------------------------
    // View
    // -------------------------------------------------------------------------

    fn requery(&mut self) {
        self.row_view = query(
            &self.rows,
            &self.headers,
            &self.view.column_filters,
            &self.view.global_filter,
            &self.view.sort,
        );
        self.selection.clear();
    }

    /// Swap in a new view snapshot.
    pub fn apply(&mut self, view: ViewState) {
        self.view = view;
        self.requery();
    }

    /// Derive the next snapshot from the current one and apply it.
    pub fn update(&mut self, f: impl FnOnce(&ViewState) -> ViewState) {
        let next = f(&self.view);
        self.apply(next);
    }

    // -------------------------------------------------------------------------
    // Typed search
    // -------------------------------------------------------------------------

    /// A keystroke in the search box. Nothing is queried until the input
    /// window passes without another one.
    pub fn type_search(&mut self, text: &str, now: Instant) {
        self.search_input.push(text.to_string(), now);
    }

    /// Apply the waiting search text if its window has elapsed. Returns
    /// whether the view changed.
    pub fn poll_input(&mut self, now: Instant) -> bool {
        match self.search_input.poll(now) {
            Some(text) => {
                self.update(|v| v.with_typed_global_filter(&text));
                true
            }
            None => false,
        }
    }

    /// Apply the waiting search text now (Enter).
    pub fn flush_input(&mut self) -> bool {
        match self.search_input.flush() {
            Some(text) => {
                self.update(|v| v.with_typed_global_filter(&text));
                true
            }
            None => false,
        }
    }

    pub fn next_page(&mut self) {
        let total = self.page_info().total_pages;
        self.update(|v| v.next_page(total));
    }

    pub fn previous_page(&mut self) {
        self.update(ViewState::previous_page);
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo::compute(self.row_view.len(), self.view.page_size, self.view.page)
    }

    /// The current page, with the page number clamped to what exists.
    pub fn page(&self) -> Page<'_> {
        let info = self.page_info();
        let rows = self.row_view.row_order()[info.start..info.end]
            .iter()
            .map(|&i| &self.rows[i])
            .collect();
        Page {
            rows,
            info,
            report: PageReport {
                rows_on_page: info.len(),
                filtered_rows: self.row_view.len(),
                total_rows: self.rows.len(),
                page: info.page,
                total_pages: info.total_pages,
                has_previous: info.has_previous(),
                has_next: info.has_next(),
            },
        }
    }

    /// Every row that passed the filters, in view order (what export writes).
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.row_view.rows(&self.rows)
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    fn grid(&self) -> ViewGrid<'_> {
        ViewGrid::new(&self.rows, &self.row_view, &self.headers)
    }

    /// Press on a cell of the filtered set. Toggle presses copy right away.
    pub fn pointer_down(
        &mut self,
        cell: CellRef,
        button: PointerButton,
        modifiers: Modifiers,
        clipboard: &mut dyn Clipboard,
    ) {
        let grid = ViewGrid::new(&self.rows, &self.row_view, &self.headers);
        if let Some(text) = self.selection.pointer_down(cell, button, modifiers, &grid) {
            copy_text(clipboard, &text);
        }
    }

    pub fn pointer_move(&mut self, cell: CellRef) {
        let grid = ViewGrid::new(&self.rows, &self.row_view, &self.headers);
        self.selection.pointer_move(cell, &grid);
    }

    /// Release ends a drag and copies the rectangle.
    pub fn pointer_up(&mut self, clipboard: &mut dyn Clipboard) {
        if let Some(text) = self.selection.pointer_up() {
            copy_text(clipboard, &text);
        }
    }

    /// Text of one cell of the filtered set.
    pub fn cell_text(&self, cell: CellRef) -> Option<String> {
        self.grid().cell_text(cell)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn row_view(&self) -> &RowView {
        &self.row_view
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn correlation(&self) -> &CorrelationMap {
        &self.correlation
    }

    pub fn report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.report.is_some()
    }
}

/// The filtered set as a grid: row = view index, col = header index.
struct ViewGrid<'a> {
    rows: &'a [Row],
    row_view: &'a RowView,
    headers: &'a [String],
}

impl<'a> ViewGrid<'a> {
    // Takes the fields rather than the session so the selection can be
    // borrowed mutably alongside it.
    fn new(rows: &'a [Row], row_view: &'a RowView, headers: &'a [String]) -> Self {
        Self { rows, row_view, headers }
    }
}

impl CellGrid for ViewGrid<'_> {
    fn cell_text(&self, cell: CellRef) -> Option<String> {
        let data_row = self.row_view.view_to_data(cell.row)?;
        let column = self.headers.get(cell.col)?;
        Some(self.rows.get(data_row)?.get(column).as_text().into_owned())
    }
}
