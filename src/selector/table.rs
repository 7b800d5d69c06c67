//! Column-reference selector adapter for spreadsheet workbooks.
//!
//! Workbooks are loaded with `calamine` into sheets of string rows. The
//! selector language has two forms:
//!
//! - `sheet:<name>` — a collection selector naming the sheet whose rows are
//!   the sub-documents; the first row is treated as a header and skipped
//! - `A`, `BC`, `3` — a scoped selector addressing one cell of a row, as a
//!   column letter or a zero-based column index
//!
//! An empty cell yields zero matches, so optional slots (description, type)
//! can simply be left blank in the sheet.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use regex::Regex;

use crate::selector::SelectorAdapter;

/// One sheet of a workbook, as trimmed cell strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// A loaded workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Load a workbook from raw bytes (format auto-detected).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let cursor = Cursor::new(bytes.to_vec());
        let mut reader = open_workbook_auto_from_rs(cursor)
            .map_err(|e| format!("failed to open workbook: {}", e))?;

        let mut sheets = Vec::new();
        for (name, range) in reader.worksheets() {
            let rows = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect())
                .collect();
            sheets.push(Sheet { name, rows });
        }

        Ok(Self { sheets })
    }

    fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Evaluation scope: the whole workbook (for collection selectors) or one
/// data row (for scoped selectors).
#[derive(Debug, Clone, PartialEq)]
pub enum TableScope {
    Book(Workbook),
    Row(Vec<String>),
}

/// A validated table selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSelector {
    Sheet(String),
    Column(usize),
}

/// Convert a column letter reference (`A`, `Z`, `AA`) to a zero-based index.
fn letters_to_index(letters: &str) -> usize {
    letters
        .chars()
        .fold(0usize, |acc, c| {
            acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1)
        })
        - 1
}

/// Selector adapter over workbook sheets and rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableAdapter;

impl SelectorAdapter for TableAdapter {
    type Scope = TableScope;
    type Selector = TableSelector;

    fn compile(selector: &str) -> Result<TableSelector, String> {
        let trimmed = selector.trim();

        if let Some(name) = trimmed.strip_prefix("sheet:") {
            if name.is_empty() {
                return Err(format!("missing sheet name in selector '{}'", selector));
            }
            return Ok(TableSelector::Sheet(name.to_string()));
        }

        let letters = Regex::new(r"^[A-Za-z]{1,3}$").expect("valid column pattern");
        if letters.is_match(trimmed) {
            return Ok(TableSelector::Column(letters_to_index(trimmed)));
        }

        if let Ok(index) = trimmed.parse::<usize>() {
            return Ok(TableSelector::Column(index));
        }

        Err(format!(
            "invalid table selector '{}': expected 'sheet:<name>', a column letter or a column index",
            selector
        ))
    }

    fn select_docs(&self, selector: &TableSelector, scope: &TableScope) -> Vec<TableScope> {
        match (selector, scope) {
            (TableSelector::Sheet(name), TableScope::Book(book)) => book
                .sheet(name)
                .map(|sheet| {
                    sheet
                        .rows
                        .iter()
                        .skip(1) // header row
                        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
                        .map(|row| TableScope::Row(row.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn select_values(&self, selector: &TableSelector, scope: &TableScope) -> Vec<String> {
        match (selector, scope) {
            (TableSelector::Column(index), TableScope::Row(row)) => row
                .get(*index)
                .filter(|cell| !cell.is_empty())
                .map(|cell| vec![cell.clone()])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
