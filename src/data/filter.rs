use super::model::{parse_number, CsvTable};

// ---------------------------------------------------------------------------
// Filter expressions
// ---------------------------------------------------------------------------

/// Per-column filter text, by column index.  An empty (or all-whitespace)
/// string means "no filter on this column".
pub type FilterSpec = Vec<String>;

/// An empty filter for every column of `table`.
pub fn empty_filters(table: &CsvTable) -> FilterSpec {
    vec![String::new(); table.column_count()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Equal,
}

impl CompareOp {
    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Greater => lhs > rhs,
            CompareOp::GreaterEq => lhs >= rhs,
            CompareOp::Less => lhs < rhs,
            CompareOp::LessEq => lhs <= rhs,
            CompareOp::Equal => lhs == rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericTest {
    Compare(CompareOp, f64),
    /// Inclusive on both ends; an inverted range matches nothing.
    Range(f64, f64),
}

impl NumericTest {
    fn matches(self, value: f64) -> bool {
        match self {
            NumericTest::Compare(op, rhs) => op.holds(value, rhs),
            NumericTest::Range(min, max) => min <= value && value <= max,
        }
    }
}

/// One parsed column filter.
///
/// The numeric test only applies to cells that parse as numbers; every other
/// cell falls back to a case-insensitive substring search for the raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct CellFilter {
    numeric: Option<NumericTest>,
    needle: String,
}

impl CellFilter {
    /// Parse filter text.  Returns `None` for an empty filter.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            numeric: parse_numeric(text),
            needle: text.to_lowercase(),
        })
    }

    pub fn numeric(&self) -> Option<NumericTest> {
        self.numeric
    }

    pub fn matches(&self, cell: &str) -> bool {
        if let Some(test) = self.numeric {
            if let Some(value) = parse_number(cell) {
                return test.matches(value);
            }
        }
        cell.to_lowercase().contains(&self.needle)
    }
}

fn parse_numeric(text: &str) -> Option<NumericTest> {
    const OPERATORS: [(&str, CompareOp); 6] = [
        (">=", CompareOp::GreaterEq),
        ("<=", CompareOp::LessEq),
        ("==", CompareOp::Equal),
        (">", CompareOp::Greater),
        ("<", CompareOp::Less),
        ("=", CompareOp::Equal),
    ];

    if let Some((op, rest)) = OPERATORS
        .iter()
        .find_map(|(prefix, op)| text.strip_prefix(*prefix).map(|rest| (*op, rest)))
    {
        return parse_number(rest).map(|rhs| NumericTest::Compare(op, rhs));
    }

    if text.contains(':') {
        let parts: Vec<&str> = text.split(':').collect();
        if let [min, max] = parts.as_slice() {
            return match (parse_number(min), parse_number(max)) {
                (Some(min), Some(max)) => Some(NumericTest::Range(min, max)),
                _ => None,
            };
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

/// Return the rows of `table` that satisfy every non-empty filter.
///
/// * All filters empty → the input rows, unchanged.
/// * A row shorter than `filters` is dropped whenever any filter is active.
/// * Row order is preserved.
pub fn apply_filters(table: &CsvTable, filters: &[String]) -> CsvTable {
    let active: Vec<(usize, CellFilter)> = filters
        .iter()
        .enumerate()
        .filter_map(|(i, text)| CellFilter::parse(text).map(|f| (i, f)))
        .collect();

    if active.is_empty() {
        return table.clone();
    }

    table.retain_rows(|row| {
        row.len() >= filters.len()
            && active
                .iter()
                .all(|(col, filter)| filter.matches(&row[*col]))
    })
}
