use std::sync::LazyLock;

use chrono::NaiveDate;
use ibov_core::error::{AppError, ExtractFailure};
use ibov_core::models::{ConstituentDataset, ConstituentRecord, RenderedPage};
use ibov_core::traits::TableExtractor;
use scraper::{ElementRef, Html, Selector};

/// Structural classes of the composition table on the B3 index page.
pub const DEFAULT_TABLE_SELECTOR: &str = "table.table.table-responsive-sm.table-responsive-md";

/// Number of cells in a data row. Header and footer rows use `th` or
/// spanning cells and never have exactly this many `td`s.
const DATA_ROW_CELLS: usize = 5;

static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("static selector is valid"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("static selector is valid"));
static DEFAULT_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(DEFAULT_TABLE_SELECTOR).expect("static selector is valid")
});

/// Extracts constituent records from the rendered composition table.
///
/// Only the first table matching the structural classes is read. A row is a
/// data row iff it has exactly five `td` cells; their trimmed text maps
/// positionally onto the record fields. Values are not coerced.
#[derive(Clone)]
pub struct HtmlTableExtractor {
    table: Selector,
}

impl HtmlTableExtractor {
    pub fn new() -> Self {
        Self {
            table: DEFAULT_TABLE.clone(),
        }
    }

    /// Use a different CSS selector to locate the table.
    pub fn with_selector(selector: &str) -> Result<Self, AppError> {
        let table = Selector::parse(selector)
            .map_err(|e| AppError::ConfigError(format!("Invalid table selector '{selector}': {e}")))?;
        Ok(Self { table })
    }

    /// Parse raw HTML into a dataset stamped with `capture_date`.
    pub fn extract_html(
        &self,
        html: &str,
        capture_date: NaiveDate,
    ) -> Result<ConstituentDataset, ExtractFailure> {
        let document = Html::parse_document(html);

        let table = document
            .select(&self.table)
            .next()
            .ok_or_else(ExtractFailure::table_missing)?;

        let rows: Vec<ElementRef<'_>> = table.select(&ROW).collect();
        if rows.len() < 2 {
            tracing::debug!(rows = rows.len(), "Table has no body rows");
            return Ok(ConstituentDataset::empty(capture_date));
        }

        let records: Vec<ConstituentRecord> = rows.iter().filter_map(parse_row).collect();

        tracing::debug!(
            rows = rows.len(),
            records = records.len(),
            "Parsed composition table"
        );

        Ok(ConstituentDataset::new(capture_date, records))
    }
}

impl Default for HtmlTableExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TableExtractor for HtmlTableExtractor {
    fn extract(
        &self,
        page: &RenderedPage,
        capture_date: NaiveDate,
    ) -> Result<ConstituentDataset, ExtractFailure> {
        self.extract_html(&page.html, capture_date)
    }
}

fn parse_row(row: &ElementRef<'_>) -> Option<ConstituentRecord> {
    let cells: Vec<String> = row.select(&CELL).map(cell_text).collect();
    let cells: [String; DATA_ROW_CELLS] = cells.try_into().ok()?;
    Some(ConstituentRecord::from_cells(cells))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
