//! @acp:module "Table Extractor"
//! @acp:summary "Locate, parse and normalize embedded Input/Output logic tables"
//! @acp:domain reqif
//! @acp:layer logic
//!
//! Only the first table of a fragment is used. Column roles are inferred
//! from header text; a table without at least one Input and one Output
//! column is discarded. Rows whose width differs from the header are
//! skipped and counted rather than failing the artifact.

pub mod format;
pub mod markup;

use serde::Serialize;

pub use format::{format_table, parse_formatted_table, FormattedTableError};
pub use markup::has_table_marker;

use markup::GridRow;

/// Group labels of the two-zone header convention
const ZONE_LABELS: &[&str] = &["input", "output", "no."];

/// @acp:summary "Role of a table column"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Input,
    Output,
    Ignored,
}

impl ColumnRole {
    /// Infer a role from header text (case-insensitive token match)
    pub fn infer(header: &str) -> Self {
        let lower = header.to_lowercase();
        if lower.contains("input") {
            ColumnRole::Input
        } else if lower.contains("output") {
            ColumnRole::Output
        } else {
            ColumnRole::Ignored
        }
    }
}

/// Why a header/row set cannot form a logic table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableShapeError {
    #[error("no Input column among headers")]
    NoInputColumn,
    #[error("no Output column among headers")]
    NoOutputColumn,
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// @acp:summary "Normalized logic table"
///
/// Every row has exactly `headers.len()` cells and at least one Input and
/// one Output column exist. Both are checked on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    column_roles: Vec<ColumnRole>,
    rows: Vec<Vec<String>>,
    row_count: usize,
}

impl Table {
    /// Build a table, inferring column roles from the headers
    pub fn from_parts(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, TableShapeError> {
        let column_roles: Vec<ColumnRole> = headers.iter().map(|h| ColumnRole::infer(h)).collect();
        if !column_roles.contains(&ColumnRole::Input) {
            return Err(TableShapeError::NoInputColumn);
        }
        if !column_roles.contains(&ColumnRole::Output) {
            return Err(TableShapeError::NoOutputColumn);
        }
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(TableShapeError::RowWidth {
                row: row + 1,
                found: cells.len(),
                expected: headers.len(),
            });
        }
        let row_count = rows.len();
        Ok(Self {
            headers,
            column_roles,
            rows,
            row_count,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_roles(&self) -> &[ColumnRole] {
        &self.column_roles
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Role of column `index`
    pub fn role(&self, index: usize) -> Option<ColumnRole> {
        self.column_roles.get(index).copied()
    }

    /// Header names of all columns with the given role
    pub fn columns_with(&self, role: ColumnRole) -> Vec<&str> {
        self.headers
            .iter()
            .zip(&self.column_roles)
            .filter(|(_, r)| **r == role)
            .map(|(h, _)| h.as_str())
            .collect()
    }
}

/// @acp:summary "Recovered table problems"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableParseWarning {
    /// Table markup without any rows
    NoRows,
    /// Headers lack an Input or Output column; table treated as absent
    MissingRoles { headers: Vec<String> },
    /// Rows with a cell count different from the header count
    RowsSkipped { count: usize, expected: usize },
    /// Additional tables after the first were ignored
    ExtraTablesIgnored { count: usize },
    /// Rows beyond the configured limit were dropped
    Truncated { kept: usize, dropped: usize },
}

impl std::fmt::Display for TableParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableParseWarning::NoRows => write!(f, "table markup contains no rows"),
            TableParseWarning::MissingRoles { headers } => write!(
                f,
                "table discarded, no Input/Output columns in [{}]",
                headers.join(", ")
            ),
            TableParseWarning::RowsSkipped { count, expected } => {
                write!(f, "skipped {} row(s) not matching {} header cells", count, expected)
            }
            TableParseWarning::ExtraTablesIgnored { count } => {
                write!(f, "ignored {} additional table(s); only the first is used", count)
            }
            TableParseWarning::Truncated { kept, dropped } => {
                write!(f, "kept {} row(s), dropped {} beyond the row limit", kept, dropped)
            }
        }
    }
}

/// Extraction limits
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub max_rows: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { max_rows: 100 }
    }
}

impl From<&crate::config::ExtractionConfig> for ExtractOptions {
    fn from(config: &crate::config::ExtractionConfig) -> Self {
        Self {
            max_rows: config.max_table_rows,
        }
    }
}

/// Outcome of looking for a table in one artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableExtraction {
    pub table: Option<Table>,
    pub skipped_rows: usize,
    pub warnings: Vec<TableParseWarning>,
}

/// Locate and parse the logic table of a markup fragment.
pub fn extract_table(markup: &str, options: &ExtractOptions) -> TableExtraction {
    let mut result = TableExtraction::default();

    let tables = markup::find_tables(markup);
    let Some(first) = tables.first() else {
        return result;
    };
    if tables.len() > 1 {
        result.warnings.push(TableParseWarning::ExtraTablesIgnored {
            count: tables.len() - 1,
        });
    }

    let grid = markup::build_grid(first);
    if grid.is_empty() {
        result.warnings.push(TableParseWarning::NoRows);
        return result;
    }

    let (headers, data_start) = split_header(&grid);
    let expected = headers.len();

    let mut rows = Vec::new();
    for row in &grid[data_start.min(grid.len())..] {
        if row.cells.len() == expected {
            rows.push(row.cells.clone());
        } else {
            result.skipped_rows += 1;
        }
    }
    forward_fill(&mut rows);
    if result.skipped_rows > 0 {
        result.warnings.push(TableParseWarning::RowsSkipped {
            count: result.skipped_rows,
            expected,
        });
    }

    if rows.len() > options.max_rows {
        let dropped = rows.len() - options.max_rows;
        rows.truncate(options.max_rows);
        result.warnings.push(TableParseWarning::Truncated {
            kept: options.max_rows,
            dropped,
        });
    }

    match Table::from_parts(headers.clone(), rows) {
        Ok(table) => result.table = Some(table),
        Err(TableShapeError::NoInputColumn | TableShapeError::NoOutputColumn) => {
            result.warnings.push(TableParseWarning::MissingRoles { headers });
        }
        // rows were filtered to header width above
        Err(TableShapeError::RowWidth { .. }) => {}
    }

    result
}

/// Empty data cells repeat the value of the row above.
///
/// Authoring tools often leave a cell blank when it carries the same value
/// as the previous test step. The first data row is left as written.
fn forward_fill(rows: &mut [Vec<String>]) {
    for r in 1..rows.len() {
        let (above, current) = rows.split_at_mut(r);
        let previous = &above[r - 1];
        for (c, cell) in current[0].iter_mut().enumerate() {
            if cell.is_empty() {
                if let Some(value) = previous.get(c) {
                    cell.clone_from(value);
                }
            }
        }
    }
}

/// Work out the header row(s) of a grid.
///
/// Returns the header names and the index of the first data row. The first
/// row is a zone row when it holds only zone labels (at least one of them
/// `Input` or `Output`) and is followed by a second header row, recognised
/// by `th` cells or by spanning labels above it. Zone and name rows merge:
/// a column under a label becomes `"<label> - <name>"`.
fn split_header(grid: &[GridRow]) -> (Vec<String>, usize) {
    let first = &grid[0];
    let normalized: Vec<String> = first.cells.iter().map(|c| c.trim().to_lowercase()).collect();

    let only_zones = normalized
        .iter()
        .all(|c| c.is_empty() || ZONE_LABELS.contains(&c.as_str()));
    let has_io = normalized.iter().any(|c| c == "input" || c == "output");
    let second_is_header = grid
        .get(1)
        .is_some_and(|second| second.header_cells || first.spanning);

    if !(only_zones && has_io && second_is_header) {
        return (first.cells.clone(), 1);
    }

    let second = &grid[1].cells;
    let merged = first
        .cells
        .iter()
        .enumerate()
        .map(|(i, zone)| {
            let name = second.get(i).map(String::as_str).unwrap_or("");
            if zone.trim().is_empty() {
                name.to_string()
            } else {
                format!("{} - {}", zone.trim(), name)
            }
        })
        .collect();

    (merged, 2)
}
