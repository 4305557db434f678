//! @acp:module "Table Markup Scanner"
//! @acp:summary "Locate pseudo-HTML tables and expand rows into a rectangular grid"
//! @acp:domain reqif
//! @acp:layer parser
//!
//! Requirement content is XHTML emitted by requirement tools, often with a
//! namespace prefix (`html:td`, `xhtml:tr`). Tags are matched with an
//! optional prefix and without regard to case. Nested tables are not
//! supported.

use std::sync::LazyLock;

use regex::Regex;

/// Upper bound for `colspan`/`rowspan` values
const MAX_SPAN: usize = 256;

static TABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[\w.-]+:)?table\b[^>]*>(.*?)</(?:[\w.-]+:)?table\s*>").unwrap()
});

static TABLE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:[\w.-]+:)?table\b").unwrap());

static ROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[\w.-]+:)?tr\b[^>]*>(.*?)</(?:[\w.-]+:)?tr\s*>").unwrap()
});

/// Groups: 1=cell kind (d/h), 2=attributes, 3=content (absent for self-closing cells)
static CELL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<(?:[\w.-]+:)?t([dh])\b([^>]*?)(?:/>|>(.*?)</(?:[\w.-]+:)?t[dh]\s*>)",
    )
    .unwrap()
});

static SPAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(colspan|rowspan)\s*=\s*["']?\s*(\d+)"#).unwrap()
});

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// True when the fragment contains a table-start marker
pub fn has_table_marker(markup: &str) -> bool {
    TABLE_START.is_match(markup)
}

/// Inner markup of every complete table in the fragment, in order
pub fn find_tables(markup: &str) -> Vec<&str> {
    TABLE_PATTERN
        .captures_iter(markup)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    text: String,
    header: bool,
    colspan: usize,
    rowspan: usize,
}

/// One expanded table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub cells: Vec<String>,
    /// Every source cell of the row was a `th`
    pub header_cells: bool,
    /// At least one source cell spanned several columns
    pub spanning: bool,
}

fn parse_cells(row_markup: &str) -> Vec<Cell> {
    CELL_PATTERN
        .captures_iter(row_markup)
        .map(|c| {
            let header = c[1].eq_ignore_ascii_case("h");
            let attrs = c.get(2).map(|m| m.as_str()).unwrap_or("");
            let content = c.get(3).map(|m| m.as_str()).unwrap_or("");
            let mut colspan = 1;
            let mut rowspan = 1;
            for span in SPAN_PATTERN.captures_iter(attrs) {
                let value = span[2].parse::<usize>().unwrap_or(1).clamp(1, MAX_SPAN);
                if span[1].eq_ignore_ascii_case("colspan") {
                    colspan = value;
                } else {
                    rowspan = value;
                }
            }
            Cell {
                text: cell_text(content),
                header,
                colspan,
                rowspan,
            }
        })
        .collect()
}

/// Plain text of a cell: tags removed, entities decoded, whitespace collapsed
pub fn cell_text(content: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(content, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

pub fn decode_entities(s: &str) -> String {
    ENTITY_PATTERN
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Expand the rows of one table into a grid.
///
/// Spanning cells repeat their text into every slot they cover. Slots never
/// written stay empty; rows keep their own width so that malformed rows can
/// be detected by the caller.
pub fn build_grid(table_markup: &str) -> Vec<GridRow> {
    let rows: Vec<Vec<Cell>> = ROW_PATTERN
        .captures_iter(table_markup)
        .map(|c| parse_cells(c.get(1).map(|m| m.as_str()).unwrap_or("")))
        .collect();

    let mut grid: Vec<Vec<Option<String>>> = vec![Vec::new(); rows.len()];

    for (r, cells) in rows.iter().enumerate() {
        let mut c = 0;
        for cell in cells {
            while grid[r].get(c).is_some_and(Option::is_some) {
                c += 1;
            }
            let last_row = (r + cell.rowspan).min(rows.len());
            for slot_row in grid.iter_mut().take(last_row).skip(r) {
                if slot_row.len() < c + cell.colspan {
                    slot_row.resize(c + cell.colspan, None);
                }
                for slot in slot_row.iter_mut().skip(c).take(cell.colspan) {
                    *slot = Some(cell.text.clone());
                }
            }
            c += cell.colspan;
        }
    }

    grid.into_iter()
        .zip(&rows)
        .map(|(slots, cells)| GridRow {
            cells: slots.into_iter().map(Option::unwrap_or_default).collect(),
            header_cells: !cells.is_empty() && cells.iter().all(|c| c.header),
            spanning: cells.iter().any(|c| c.colspan > 1),
        })
        .collect()
}
