use crate::error::{BulletinError, Result};

/// A raw spreadsheet value, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Empty cells and whitespace-only text both count as missing.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Trimmed text rendering; whole numbers print without decimals.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            Cell::Number(n) => Some(n.to_string()),
        }
    }

    /// Numeric value of the cell; numeric text counts.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
            Cell::Empty => None,
        }
    }
}

/// One sheet row, cells laid out in the order of `RawSheet::headers`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Zero-based row index in the source sheet.
    pub index: u32,
    pub cells: Vec<Cell>,
}

impl RawRow {
    pub fn new(index: u32, cells: Vec<Cell>) -> Self {
        Self { index, cells }
    }

    pub fn get(&self, col: usize) -> &Cell {
        self.cells.get(col).unwrap_or(&EMPTY)
    }

    pub fn get_mut(&mut self, col: usize) -> &mut Cell {
        if self.cells.len() <= col {
            self.cells.resize(col + 1, Cell::Empty);
        }
        &mut self.cells[col]
    }
}

/// The mapped region of a bulletin sheet: field names plus every sheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawSheet {
    pub fn column(&self, field: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == field)
    }

    pub fn require_column(&self, field: &str) -> Result<usize> {
        self.column(field).ok_or_else(|| {
            BulletinError::ColumnMappingError(format!("field '{field}' is not mapped"))
        })
    }

    /// Cell at absolute sheet row `index`, or `None` past the sheet's end.
    pub fn cell(&self, index: u32, col: usize) -> Option<&Cell> {
        self.rows
            .iter()
            .find(|r| r.index == index)
            .map(|r| r.get(col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_trailing_zeroes() {
        assert_eq!(Cell::Number(12.0).as_text().as_deref(), Some("12"));
        assert_eq!(Cell::Number(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(Cell::Text("  x ".into()).as_text().as_deref(), Some("x"));
        assert_eq!(Cell::Text("   ".into()).as_text(), None);
    }

    #[test]
    fn text_keeps_inner_quotes() {
        assert_eq!(
            Cell::Text(" \"Presídio Ary Franco\" ".into()).as_text().as_deref(),
            Some("\"Presídio Ary Franco\"")
        );
    }

    #[test]
    fn numeric_text_coerces() {
        assert_eq!(Cell::Text(" 42 ".into()).as_number(), Some(42.0));
        assert_eq!(Cell::Text("TOTAL".into()).as_number(), None);
        assert_eq!(Cell::Text("NaN".into()).as_number(), None);
        assert_eq!(Cell::Text("inf".into()).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
    }

    #[test]
    fn out_of_range_cells_read_as_empty() {
        let mut row = RawRow::new(3, vec![Cell::Number(1.0)]);
        assert_eq!(row.get(5), &Cell::Empty);
        *row.get_mut(2) = Cell::Text("x".into());
        assert_eq!(row.cells.len(), 3);
        assert!(row.get(1).is_empty());
    }
}
