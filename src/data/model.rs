use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};

use crate::error::{HarnessError, Result};

/// Positional column names of the raw CMC file (it has no header row).
pub const CMC_COLUMNS: [&str; 10] = [
    "wife_age",
    "wife_edu",
    "husband_edu",
    "n_children",
    "wife_religion",
    "wife_working",
    "husband_occup",
    "sol_index",
    "media_exposure",
    "class",
];

// ---------------------------------------------------------------------------
// Column – a single named series (used for targets)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Array1<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Gather the given rows (in the given order) into a new column.
    pub fn select_rows(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }
}

// ---------------------------------------------------------------------------
// Table – rows × named columns of f64 values
// ---------------------------------------------------------------------------

/// A small labelled table. Every CMC attribute is numeric, so a dense
/// `Array2<f64>` plus an ordered list of column names is all we need.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl Table {
    /// Build a table, checking that names are unique and match the width.
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(HarnessError::LengthMismatch {
                expected: values.ncols(),
                actual: columns.len(),
            });
        }
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(HarnessError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self { columns, values })
    }

    /// Convenience constructor from row-major data.
    pub fn from_rows(columns: &[&str], rows: &[Vec<f64>]) -> Result<Self> {
        let width = columns.len();
        let mut flat = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(HarnessError::ColumnCount {
                    row: i,
                    expected: width,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let values = Array2::from_shape_vec((rows.len(), width), flat)?;
        Self::new(columns.iter().map(|c| c.to_string()).collect(), values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| HarnessError::ColumnNotFound(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self.column_index(name)?;
        Ok(self.values.column(idx))
    }

    /// Owned copy of a column.
    pub fn to_column(&self, name: &str) -> Result<Column> {
        Ok(Column::new(name, self.column(name)?.to_owned()))
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// Overwrite the values of an existing column.
    pub fn set_column(&mut self, name: &str, values: ArrayView1<'_, f64>) -> Result<()> {
        if values.len() != self.n_rows() {
            return Err(HarnessError::LengthMismatch {
                expected: self.n_rows(),
                actual: values.len(),
            });
        }
        let idx = self.column_index(name)?;
        self.values.column_mut(idx).assign(&values);
        Ok(())
    }

    /// Gather the given rows (in the given order) into a new table.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }

    /// Project onto the named columns, in the order given.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Table::new(
            names.iter().map(|n| n.as_ref().to_string()).collect(),
            self.values.select(Axis(1), &indices),
        )
    }

    /// Split one column out: returns the remaining table and the column.
    pub fn split_off(&self, name: &str) -> Result<(Table, Column)> {
        let target = self.to_column(name)?;
        let keep: Vec<&String> = self.columns.iter().filter(|c| *c != name).collect();
        let rest = self.select_columns(&keep)?;
        Ok((rest, target))
    }

    /// Append a column at the right-hand side.
    pub fn with_column(&self, column: &Column) -> Result<Table> {
        if self.has_column(&column.name) {
            return Err(HarnessError::DuplicateColumn(column.name.clone()));
        }
        if column.len() != self.n_rows() {
            return Err(HarnessError::LengthMismatch {
                expected: self.n_rows(),
                actual: column.len(),
            });
        }
        let values = concatenate(
            Axis(1),
            &[self.values.view(), column.values.view().insert_axis(Axis(1))],
        )?;
        let mut columns = self.columns.clone();
        columns.push(column.name.clone());
        Table::new(columns, values)
    }
}

// ---------------------------------------------------------------------------
// Partition / Split
// ---------------------------------------------------------------------------

/// Features plus the target column they are labelled with.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub features: Table,
    pub target: Column,
}

impl Partition {
    /// Features with the target re-attached as the last column.
    pub fn to_table(&self) -> Result<Table> {
        self.features.with_column(&self.target)
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Train/test partitions of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Partition,
    pub test: Partition,
}

impl Split {
    pub fn target_name(&self) -> &str {
        &self.train.target.name
    }
}
