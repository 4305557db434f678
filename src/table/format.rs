//! @acp:module "Table Formatter"
//! @acp:summary "Stable textual rendering of logic tables for prompt substitution"
//! @acp:domain reqif
//! @acp:layer output
//!
//! Layout:
//!
//! ```text
//! Headers: ['Input - A', 'Output - Y']
//! Row 1: ['0', '1']
//! Row 2: ['1', '0']
//! ```
//!
//! Cells are single-quoted; `'` and `\` inside a cell are backslash-escaped
//! and line breaks are written as `\n` / `\r`, so every table fits one line
//! per row and reads back with [`parse_formatted_table`].

use super::Table;

/// Render a table as prompt text
pub fn format_table(table: &Table) -> String {
    let mut out = String::from("Headers: ");
    push_list(&mut out, table.headers());
    out.push('\n');
    for (i, row) in table.rows().iter().enumerate() {
        out.push_str(&format!("Row {}: ", i + 1));
        push_list(&mut out, row);
        out.push('\n');
    }
    out
}

fn push_list(out: &mut String, items: &[String]) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('\'');
        for ch in item.chars() {
            match ch {
                '\'' | '\\' => {
                    out.push('\\');
                    out.push(ch);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                _ => out.push(ch),
            }
        }
        out.push('\'');
    }
    out.push(']');
}

/// Errors from reading formatted table text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormattedTableError {
    #[error("missing 'Headers:' line")]
    MissingHeaders,
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("row {row} is numbered out of sequence")]
    RowNumber { row: usize },
    #[error("formatted text does not describe a valid logic table: {0}")]
    Shape(#[from] super::TableShapeError),
}

/// Parse text produced by [`format_table`] back into a [`Table`].
pub fn parse_formatted_table(text: &str) -> Result<Table, FormattedTableError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (header_line, first) = lines.next().ok_or(FormattedTableError::MissingHeaders)?;
    let header_list = first
        .strip_prefix("Headers: ")
        .ok_or(FormattedTableError::MissingHeaders)?;
    let headers = parse_list(header_list).map_err(|message| FormattedTableError::Syntax {
        line: header_line + 1,
        message,
    })?;

    let mut rows = Vec::new();
    for (idx, line) in lines {
        let rest = line
            .strip_prefix("Row ")
            .ok_or_else(|| FormattedTableError::Syntax {
                line: idx + 1,
                message: "expected 'Row N: [...]'".to_string(),
            })?;
        let (number, list) = rest.split_once(": ").ok_or_else(|| FormattedTableError::Syntax {
            line: idx + 1,
            message: "expected ': ' after row number".to_string(),
        })?;
        let expected = rows.len() + 1;
        if number.trim().parse::<usize>().ok() != Some(expected) {
            return Err(FormattedTableError::RowNumber { row: expected });
        }
        let cells = parse_list(list).map_err(|message| FormattedTableError::Syntax {
            line: idx + 1,
            message,
        })?;
        rows.push(cells);
    }

    Ok(Table::from_parts(headers, rows)?)
}

fn parse_list(s: &str) -> Result<Vec<String>, String> {
    let mut chars = s.trim().chars().peekable();
    if chars.next() != Some('[') {
        return Err("expected '['".to_string());
    }

    let mut items = Vec::new();
    loop {
        match chars.next() {
            Some(']') if items.is_empty() => break,
            Some('\'') => {
                let mut item = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some('n') => item.push('\n'),
                            Some('r') => item.push('\r'),
                            Some(c) => item.push(c),
                            None => return Err("dangling escape".to_string()),
                        },
                        Some('\'') => break,
                        Some(c) => item.push(c),
                        None => return Err("unterminated cell".to_string()),
                    }
                }
                items.push(item);
                match chars.next() {
                    Some(',') => {
                        if chars.peek() == Some(&' ') {
                            chars.next();
                        }
                    }
                    Some(']') => break,
                    _ => return Err("expected ',' or ']'".to_string()),
                }
            }
            _ => return Err("expected quoted cell".to_string()),
        }
    }

    if chars.next().is_some() {
        return Err("trailing characters after ']'".to_string());
    }
    Ok(items)
}
