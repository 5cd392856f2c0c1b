//! Row store — the seam between the core and the spreadsheet.
//!
//! Logical tables map to workbook tabs; data rows start at sheet row 2
//! (row 1 is the header). Callers address rows by their 0-based index in
//! the last full-table read and columns by [`ColSpan`]; the A1 arithmetic
//! lives here and nowhere else.
//!
//! The trait exists so the ledger and aggregator never learn the physical
//! addressing scheme — a transactional store could be swapped in behind it
//! without touching either.

use async_trait::async_trait;
use club_ledger::rows::{ColSpan, Table};

use crate::errors::Result;
use crate::sheets::SheetsClient;

/// First sheet row holding data (1-based, row 1 is the header).
const DATA_START_ROW: usize = 2;

/// A1 column letter for a 0-based index. The widest table is 14 columns,
/// so a single letter always suffices.
fn col_letter(idx: usize) -> char {
    debug_assert!(idx < 26, "column index {idx} out of single-letter range");
    (b'A' + idx as u8) as char
}

/// Full data range of a table, e.g. `Events!A2:L`.
fn data_range(table: Table) -> String {
    format!(
        "{}!A{DATA_START_ROW}:{}",
        table.name(),
        col_letter(table.column_count() - 1)
    )
}

/// Append range of a table, e.g. `Events!A:L`.
fn append_range(table: Table) -> String {
    format!("{}!A:{}", table.name(), col_letter(table.column_count() - 1))
}

/// Range of one row-slice, e.g. `PaymentTracking!E7:N7`.
fn row_range(table: Table, row_index: usize, span: ColSpan) -> String {
    let sheet_row = row_index + DATA_START_ROW;
    format!(
        "{}!{}{sheet_row}:{}{sheet_row}",
        table.name(),
        col_letter(span.start),
        col_letter(span.end)
    )
}

/// Row-oriented storage for the five logical tables.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// All data rows of the table, in sheet order.
    async fn get_all(&self, table: Table) -> Result<Vec<Vec<String>>>;

    /// Append rows after the existing data.
    async fn append(&self, table: Table, rows: Vec<Vec<String>>) -> Result<()>;

    /// Overwrite the cells of `span` in the row at `row_index` (0-based,
    /// as returned by `get_all`).
    async fn update_range(
        &self,
        table: Table,
        row_index: usize,
        span: ColSpan,
        values: Vec<String>,
    ) -> Result<()>;
}

/// The production store: a Google Sheets workbook.
pub struct SheetsStore {
    client: SheetsClient,
}

impl SheetsStore {
    pub fn new(client: SheetsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RowStore for SheetsStore {
    async fn get_all(&self, table: Table) -> Result<Vec<Vec<String>>> {
        self.client.get_values(&data_range(table)).await
    }

    async fn append(&self, table: Table, rows: Vec<Vec<String>>) -> Result<()> {
        self.client.append_values(&append_range(table), &rows).await
    }

    async fn update_range(
        &self,
        table: Table,
        row_index: usize,
        span: ColSpan,
        values: Vec<String>,
    ) -> Result<()> {
        self.client
            .update_values(&row_range(table, row_index, span), &[values])
            .await
    }
}

// ─────────────────────────────────────────────────────────
// In-memory store for tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
pub use fake::MemoryStore;
