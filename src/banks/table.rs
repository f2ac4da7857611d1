//! HTML table parsing
//!
//! Finds the market capitalization table in a fetched page and turns its
//! data rows into [`BankRecord`]s.

use super::BankRecord;
use crate::error::EtlError;

use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;

const NAME_HEADING: &str = "bank name";
const MARKET_CAP_HEADING: &str = "market cap";

/// Span limits browsers apply
const MAX_COLSPAN: usize = 1000;
const MAX_ROWSPAN: usize = 65534;

/// Footnote markers such as `[1]`, `[a]` or `[note 2]`
const FOOTNOTE_PATTERN: &str = r"\[[^\]]*\]";

/// Result of parsing the market capitalization table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanksTable {
    /// Header cells of the row the columns were found in
    pub headers: Vec<String>,
    pub rows: Vec<BankRecord>,
}

/// Parse the first table that carries both a bank name and a market cap
/// heading.
///
/// # Errors
/// Returns a `ParseError` if no such table exists, if it has no data rows,
/// or if any row is short a cell or carries a malformed market cap.
pub fn parse_banks_table(html: &str) -> Result<BanksTable, EtlError> {
    let footnotes = Regex::new(FOOTNOTE_PATTERN)
        .map_err(|e| EtlError::Parse(format!("Invalid footnote pattern: {}", e)))?;
    let table_selector = selector("table")?;
    let row_selector = selector("tr")?;

    let document = Html::parse_document(html);

    for table in document.select(&table_selector) {
        let rows: Vec<ElementRef> = table.select(&row_selector).collect();
        let grid = expand_rows(&rows, &footnotes);

        let Some(header) = find_header(&grid) else {
            continue;
        };
        log::debug!("Found market cap table, header in row {}", header.row + 1);

        let mut records = Vec::new();
        for (index, row) in grid.iter().enumerate().skip(header.row + 1) {
            if !row.has_data {
                continue;
            }
            if row.banner && row.cells.len() >= header.cells.len() {
                log::debug!("Skipping full-width row {}: {}", index + 1, row.cells[0]);
                continue;
            }
            records.push(parse_row(index + 1, &row.cells, &header)?);
        }

        if records.is_empty() {
            return Err(EtlError::Parse(
                "Market cap table has no data rows".to_string(),
            ));
        }

        return Ok(BanksTable {
            headers: header.cells,
            rows: records,
        });
    }

    Err(EtlError::Parse(
        "No table with 'Bank name' and 'Market cap' headings found".to_string(),
    ))
}

/// One table row laid out on the column grid
struct GridRow {
    /// Text per column, spanned cells repeated
    cells: Vec<String>,
    /// The row has at least one `td` of its own
    has_data: bool,
    /// The row's only cell spans several columns (captions, source notes)
    banner: bool,
}

/// A cell still covering rows below the one it was declared in
struct PendingCell {
    text: String,
    rows_left: usize,
}

/// Lay out rows on a grid, repeating `colspan` cells across their width and
/// carrying `rowspan` cells down into the rows they cover.
fn expand_rows(rows: &[ElementRef], footnotes: &Regex) -> Vec<GridRow> {
    let mut pending: Vec<Option<PendingCell>> = Vec::new();
    let mut grid = Vec::with_capacity(rows.len());

    for row in rows {
        let own: Vec<ElementRef> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "th" | "td"))
            .collect();

        let mut cells = Vec::new();
        for cell in &own {
            while let Some(text) = take_pending(&mut pending, cells.len()) {
                cells.push(text);
            }

            let text = clean_text(*cell, footnotes);
            let colspan = span(*cell, "colspan", MAX_COLSPAN);
            let rowspan = span(*cell, "rowspan", MAX_ROWSPAN);
            for _ in 0..colspan {
                if rowspan > 1 {
                    let col = cells.len();
                    if pending.len() <= col {
                        pending.resize_with(col + 1, || None);
                    }
                    pending[col] = Some(PendingCell {
                        text: text.clone(),
                        rows_left: rowspan - 1,
                    });
                }
                cells.push(text.clone());
            }
        }
        while let Some(text) = take_pending(&mut pending, cells.len()) {
            cells.push(text);
        }

        grid.push(GridRow {
            cells,
            has_data: own.iter().any(|cell| cell.value().name() == "td"),
            banner: own.len() == 1 && span(own[0], "colspan", MAX_COLSPAN) > 1,
        });
    }

    grid
}

fn take_pending(pending: &mut [Option<PendingCell>], col: usize) -> Option<String> {
    let slot = pending.get_mut(col)?;
    let cell = slot.as_mut()?;
    let text = cell.text.clone();
    cell.rows_left -= 1;
    if cell.rows_left == 0 {
        *slot = None;
    }
    Some(text)
}

/// Span attribute value, 1 when absent or not a positive number
fn span(cell: ElementRef, attr: &str, max: usize) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map_or(1, |n| n.min(max))
}

struct Header {
    row: usize,
    cells: Vec<String>,
    name_col: usize,
    cap_col: usize,
}

/// The last header-only row carrying both headings wins, so multi-row
/// headers resolve to their innermost level.
fn find_header(grid: &[GridRow]) -> Option<Header> {
    let mut found = None;
    for (index, row) in grid.iter().enumerate() {
        if row.has_data {
            if found.is_some() {
                break;
            }
            continue;
        }

        let position = |heading: &str| {
            row.cells
                .iter()
                .position(|c| c.to_lowercase().contains(heading))
        };

        if let (Some(name_col), Some(cap_col)) = (position(NAME_HEADING), position(MARKET_CAP_HEADING))
        {
            found = Some(Header {
                row: index,
                cells: row.cells.clone(),
                name_col,
                cap_col,
            });
        }
    }
    found
}

fn parse_row(line: usize, cells: &[String], header: &Header) -> Result<BankRecord, EtlError> {
    let cell = |col: usize| {
        cells.get(col).ok_or_else(|| {
            EtlError::Parse(format!(
                "Row {} has {} cell(s), expected at least {}",
                line,
                cells.len(),
                col + 1
            ))
        })
    };

    let name = cell(header.name_col)?;
    if name.is_empty() {
        return Err(EtlError::Parse(format!("Row {} has an empty bank name", line)));
    }

    let raw = cell(header.cap_col)?;
    let market_cap = parse_market_cap(raw).map_err(|e| {
        EtlError::Parse(format!("Row {} ({}): {}", line, name, e))
    })?;

    Ok(BankRecord::new(name.clone(), market_cap))
}

/// Parse a market cap cell, ignoring thousands separators and whitespace.
/// Footnote markers are expected to be stripped already.
pub fn parse_market_cap(raw: &str) -> Result<Decimal, String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err("missing market cap value".to_string());
    }

    Decimal::from_str(&cleaned).map_err(|_| format!("malformed market cap value '{}'", raw))
}

/// Cell text with footnotes removed and whitespace collapsed
fn clean_text(cell: ElementRef, footnotes: &Regex) -> String {
    let text: String = cell.text().collect();
    let text = footnotes.replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn selector(css: &str) -> Result<Selector, EtlError> {
    Selector::parse(css)
        .map_err(|e| EtlError::Parse(format!("Invalid selector '{}': {:?}", css, e)))
}
