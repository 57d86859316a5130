// medallion-core/src/domain/table.rs

/// Untyped tabular data as parsed from a raw export: named columns, string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding short rows with nulls and dropping extra cells.
    pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        cells.resize(self.columns.len(), None);
        self.rows.push(cells);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RawRow<'_>> {
        self.rows.get(index).map(|cells| RawRow { table: self, cells })
    }

    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(|cells| RawRow { table: self, cells })
    }

    /// Rewrites every cell of `column` in place. No-op when the column is absent.
    pub fn map_column<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(Option<&str>) -> Option<String>,
    {
        let Some(idx) = self.column_index(column) else {
            return;
        };
        for row in &mut self.rows {
            let value = f(row[idx].as_deref().map(str::trim).filter(|s| !s.is_empty()));
            row[idx] = value;
        }
    }
}

/// Borrowed view on one row of a [`RawTable`].
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    table: &'a RawTable,
    cells: &'a [Option<String>],
}

impl<'a> RawRow<'a> {
    /// The trimmed cell value, `None` when the cell is null, blank or the column unknown.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column_index(column)?;
        self.cells
            .get(idx)?
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// True when every cell is missing.
    pub fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.as_deref().map(str::trim).is_none_or(str::is_empty))
    }
}
