// ---------------------------------------------------------------------------
// CsvTable – headers plus rows of raw string cells
// ---------------------------------------------------------------------------

/// In-memory CSV contents.
///
/// Rows are not required to have the same length as `headers`; short rows
/// are kept as they were read, so every consumer indexes through [`CsvTable::cell`]
/// or checks bounds itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    /// Column names in file order.
    pub headers: Vec<String>,
    /// One entry per data line, cells in column order.
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Drop headers and rows.
    pub fn clear(&mut self) {
        self.headers.clear();
        self.rows.clear();
    }

    /// True only when there are neither headers nor rows.
    ///
    /// A header-only table is *not* empty: it is a valid load result.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Index of the first header equal to `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Bounds-checked cell access.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    /// A copy with the same headers and only the rows for which `keep` is true.
    pub fn retain_rows<F>(&self, mut keep: F) -> CsvTable
    where
        F: FnMut(&[String]) -> bool,
    {
        CsvTable {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Id used for emitter cells that are not integers.
pub const INVALID_EMITTER_ID: i64 = -2;

/// Id used for rows that carry no emitter information at all.
pub const NO_EMITTER_ID: i64 = -1;

/// Parse a cell as a floating point number, ignoring surrounding whitespace.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parse an emitter cell; anything that is not an integer becomes
/// [`INVALID_EMITTER_ID`].
pub fn parse_emitter_id(cell: &str) -> i64 {
    cell.trim().parse::<i64>().unwrap_or(INVALID_EMITTER_ID)
}
