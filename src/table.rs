//! A row- and column-labeled table of [`Scalar`] cells
//!
//! `Table` is the in-memory form of every matrix of an [`IcaData`](`crate::IcaData`)
//! model (gene weights, activities, expression data) and of annotation tables,
//! such as the gene table built from a GFF file.
//!
//! Imagine the following table
//!
//! | Index    | start | product                      |
//! |:-------- | -----:|:---------------------------- |
//! | **b0001** |  190 | thr operon leader peptide    |
//! | **b0002** |  337 | aspartate kinase             |
//! | **b0003** | 2801 | homoserine kinase            |
//!
//! ```
//! use modulon::{Scalar, Table};
//!
//! let table = Table::from_rows(
//!     vec!["b0001".into(), "b0002".into(), "b0003".into()],
//!     vec!["start".into(), "product".into()],
//!     vec![
//!         vec![190.into(), "thr operon leader peptide".into()],
//!         vec![337.into(), "aspartate kinase".into()],
//!         vec![2801.into(), "homoserine kinase".into()],
//!     ],
//! ).unwrap();
//!
//! assert_eq!(table.dim(), (3, 2));
//! assert_eq!(table.get("b0002", "start"), Some(&Scalar::Int(337)));
//!
//! for row in table.rows() {
//!     println!("{}: {:?}", row.key(), row.values());
//! }
//!
//! let starts: Vec<&Scalar> = table.column("start").unwrap().collect();
//! assert_eq!(starts.len(), 3);
//! ```
//!
//! Row order and labels are significant: two tables are only equal if both
//! hold the same labels in the same order and the same cells.
use std::cmp::Ordering;

use crate::field::Scalar;
use crate::{ModulonError, ModulonResult};

/// A row- and column-labeled two dimensional table
///
/// Cells are stored in row-major order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    index: Vec<String>,
    columns: Vec<String>,
    data: Vec<Scalar>,
}

impl Table {
    /// Creates a new `Table` from row keys, column keys and row-major cells
    ///
    /// # Errors
    ///
    /// [`ModulonError::InvalidInput`] if the number of cells does not equal
    /// `index.len() * columns.len()`
    ///
    /// # Examples
    ///
    /// ```
    /// use modulon::Table;
    ///
    /// let table = Table::new(
    ///     vec!["g1".into(), "g2".into()],
    ///     vec!["IM1".into()],
    ///     vec![0.5.into(), (-0.1).into()],
    /// );
    /// assert!(table.is_ok());
    ///
    /// let table = Table::new(vec!["g1".into()], vec!["IM1".into()], vec![]);
    /// assert!(table.is_err());
    /// ```
    pub fn new(index: Vec<String>, columns: Vec<String>, data: Vec<Scalar>) -> ModulonResult<Self> {
        if index.len() * columns.len() != data.len() {
            return Err(ModulonError::InvalidInput(format!(
                "table of {} rows and {} columns cannot hold {} cells",
                index.len(),
                columns.len(),
                data.len()
            )));
        }
        Ok(Self {
            index,
            columns,
            data,
        })
    }

    /// Creates a new `Table` from a list of rows
    ///
    /// # Errors
    ///
    /// [`ModulonError::InvalidInput`] if the number of rows differs from the number
    /// of row keys or a row has a different length than `columns`
    pub fn from_rows(
        index: Vec<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Scalar>>,
    ) -> ModulonResult<Self> {
        if rows.len() != index.len() {
            return Err(ModulonError::InvalidInput(format!(
                "{} row keys for {} rows",
                index.len(),
                rows.len()
            )));
        }
        let mut data = Vec::with_capacity(index.len() * columns.len());
        for (key, row) in index.iter().zip(rows) {
            if row.len() != columns.len() {
                return Err(ModulonError::InvalidInput(format!(
                    "row {key} has {} cells, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
            data.extend(row);
        }
        Self::new(index, columns, data)
    }

    /// Creates a `Table` without rows
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            index: Vec::new(),
            columns,
            data: Vec::new(),
        }
    }

    /// The row keys, in order
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// The column keys, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All cells in row-major order
    pub fn data(&self) -> &[Scalar] {
        &self.data
    }

    /// Returns a Tuple with number of rows and number of columns
    pub fn dim(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    /// Returns `true` if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Position of the row with key `key`
    ///
    /// If the key appears more than once, the first position is returned
    pub fn row_position(&self, key: &str) -> Option<usize> {
        self.index.iter().position(|k| k == key)
    }

    /// Position of the column with key `key`
    pub fn column_position(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|k| k == key)
    }

    /// Returns the cell at row `row` and column `col`
    pub fn get(&self, row: &str, col: &str) -> Option<&Scalar> {
        let row = self.row_position(row)?;
        let col = self.column_position(col)?;
        self.data.get(row * self.columns.len() + col)
    }

    /// Returns the row with key `key`
    pub fn row(&self, key: &str) -> Option<Row<'_>> {
        let idx = self.row_position(key)?;
        Some(self.row_at(idx))
    }

    fn row_at(&self, idx: usize) -> Row<'_> {
        let width = self.columns.len();
        Row {
            key: &self.index[idx],
            values: &self.data[idx * width..(idx + 1) * width],
        }
    }

    /// Iterates the rows of the table
    pub fn rows(&self) -> RowIterator<'_> {
        RowIterator {
            table: self,
            idx: 0,
        }
    }

    /// Iterates the cells of the column `key`, top to bottom
    pub fn column(&self, key: &str) -> Option<Column<'_>> {
        let idx = self.column_position(key)?;
        let mut iter = self.data.iter();
        if idx > 0 {
            iter.nth(idx - 1);
        }
        Some(Column {
            iter: iter.step_by(self.columns.len()),
            remaining: self.index.len(),
        })
    }

    /// Appends a row
    ///
    /// # Errors
    ///
    /// [`ModulonError::InvalidInput`] if `values` has a different length than
    /// the number of columns
    pub fn push_row<K: Into<String>>(&mut self, key: K, values: Vec<Scalar>) -> ModulonResult<()> {
        let key = key.into();
        if values.len() != self.columns.len() {
            return Err(ModulonError::InvalidInput(format!(
                "row {key} has {} cells, expected {}",
                values.len(),
                self.columns.len()
            )));
        }
        self.index.push(key);
        self.data.extend(values);
        Ok(())
    }

    /// Sorts the rows by the values of column `key`
    ///
    /// The sort is stable. Numbers sort before strings, `null`s go last.
    ///
    /// # Errors
    ///
    /// [`ModulonError::InvalidInput`] if the column does not exist
    pub fn sort_by_column(&mut self, key: &str) -> ModulonResult<()> {
        let col = self
            .column_position(key)
            .ok_or_else(|| ModulonError::InvalidInput(format!("no column {key}")))?;
        let width = self.columns.len();
        let mut order: Vec<usize> = (0..self.index.len()).collect();
        order.sort_by(|a, b| cmp_scalars(&self.data[a * width + col], &self.data[b * width + col]));
        self.reorder(&order);
        Ok(())
    }

    /// Returns a new table with only those rows for which `keep` returns `true`
    pub fn filter_rows<F: Fn(&Row<'_>) -> bool>(&self, keep: F) -> Table {
        let order: Vec<usize> = (0..self.index.len())
            .filter(|idx| keep(&self.row_at(*idx)))
            .collect();
        let mut table = self.clone();
        table.reorder(&order);
        table
    }

    fn reorder(&mut self, order: &[usize]) {
        let width = self.columns.len();
        let mut index = Vec::with_capacity(order.len());
        let mut data = Vec::with_capacity(order.len() * width);
        for idx in order {
            index.push(std::mem::take(&mut self.index[*idx]));
            data.extend(
                self.data[idx * width..(idx + 1) * width]
                    .iter_mut()
                    .map(std::mem::take),
            );
        }
        self.index = index;
        self.data = data;
    }
}

/// Ordering used to sort table rows
fn cmp_scalars(a: &Scalar, b: &Scalar) -> Ordering {
    fn rank(s: &Scalar) -> u8 {
        match s {
            Scalar::Bool(_) => 0,
            Scalar::Int(_) | Scalar::Float(_) => 1,
            Scalar::Str(_) => 2,
            Scalar::Null => 3,
        }
    }
    match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => x.cmp(y),
        (Scalar::Int(x), Scalar::Int(y)) => x.cmp(y),
        (Scalar::Str(x), Scalar::Str(y)) => x.cmp(y),
        (Scalar::Int(_) | Scalar::Float(_), Scalar::Int(_) | Scalar::Float(_)) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            }
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// A single row of a [`Table`]
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    key: &'a str,
    values: &'a [Scalar],
}

impl<'a> Row<'a> {
    /// The row key
    pub fn key(&self) -> &'a str {
        self.key
    }

    /// The cells of the row, in column order
    pub fn values(&self) -> &'a [Scalar] {
        self.values
    }

    /// Iterates the cells of the row
    pub fn iter(&self) -> std::slice::Iter<'a, Scalar> {
        self.values.iter()
    }
}

/// Iterates the rows of a [`Table`]
///
/// This struct is yielded by [`Table::rows`]
pub struct RowIterator<'a> {
    table: &'a Table,
    idx: usize,
}

impl<'a> Iterator for RowIterator<'a> {
    type Item = Row<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.table.index.len() {
            return None;
        }
        let row = self.table.row_at(self.idx);
        self.idx += 1;
        Some(row)
    }
}

/// An iterator of the values of a single column of a [`Table`]
///
/// This struct is yielded by [`Table::column`]
pub struct Column<'a> {
    iter: std::iter::StepBy<std::slice::Iter<'a, Scalar>>,
    remaining: usize,
}

impl<'a> Iterator for Column<'a> {
    type Item = &'a Scalar;
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.iter.next()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn genes() -> Table {
        Table::from_rows(
            vec!["g1".into(), "g2".into(), "g3".into()],
            vec!["start".into(), "product".into()],
            vec![
                vec![300.into(), "c".into()],
                vec![100.into(), "a".into()],
                vec![200.into(), Scalar::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn shape_mismatch() {
        let res = Table::from_rows(
            vec!["g1".into()],
            vec!["start".into(), "product".into()],
            vec![vec![1.into()]],
        );
        assert!(res.is_err());

        let res = Table::from_rows(vec!["g1".into(), "g2".into()], vec!["start".into()], vec![]);
        assert!(res.is_err());
    }

    #[test]
    fn get_cells() {
        let table = genes();
        assert_eq!(table.get("g1", "start"), Some(&Scalar::Int(300)));
        assert_eq!(table.get("g3", "product"), Some(&Scalar::Null));
        assert!(table.get("g4", "start").is_none());
        assert!(table.get("g1", "end").is_none());
    }

    #[test]
    fn iterate_rows() {
        let table = genes();
        let mut rows = table.rows();

        let row = rows.next().unwrap();
        assert_eq!(row.key(), "g1");
        assert_eq!(row.values(), &[Scalar::Int(300), Scalar::from("c")]);

        assert_eq!(rows.next().unwrap().key(), "g2");
        assert_eq!(rows.next().unwrap().key(), "g3");
        assert!(rows.next().is_none());
    }

    #[test]
    fn iterate_columns() {
        let table = genes();
        let col: Vec<&Scalar> = table.column("product").unwrap().collect();
        assert_eq!(col, vec![&Scalar::from("c"), &Scalar::from("a"), &Scalar::Null]);

        let col: Vec<&Scalar> = table.column("start").unwrap().collect();
        assert_eq!(col, vec![&Scalar::Int(300), &Scalar::Int(100), &Scalar::Int(200)]);

        assert!(table.column("foo").is_none());
    }

    #[test]
    fn column_of_empty_table() {
        let table = Table::with_columns(vec!["start".into()]);
        assert_eq!(table.column("start").unwrap().count(), 0);
    }

    #[test]
    fn sort_rows() {
        let mut table = genes();
        table.sort_by_column("start").unwrap();
        assert_eq!(table.index(), &["g2", "g3", "g1"]);
        assert_eq!(table.get("g3", "product"), Some(&Scalar::Null));
        assert_eq!(table.get("g1", "product"), Some(&Scalar::from("c")));
    }

    #[test]
    fn sort_puts_null_last() {
        let mut table = genes();
        table.sort_by_column("product").unwrap();
        assert_eq!(table.index(), &["g2", "g1", "g3"]);
    }

    #[test]
    fn sort_is_stable() {
        let mut table = Table::from_rows(
            vec!["x".into(), "y".into(), "z".into()],
            vec!["start".into()],
            vec![vec![5.into()], vec![1.into()], vec![5.into()]],
        )
        .unwrap();
        table.sort_by_column("start").unwrap();
        assert_eq!(table.index(), &["y", "x", "z"]);
        assert!(table.sort_by_column("end").is_err());
    }

    #[test]
    fn filter() {
        let table = genes();
        let filtered = table.filter_rows(|row| !row.values()[1].is_null());
        assert_eq!(filtered.index(), &["g1", "g2"]);
        assert_eq!(filtered.dim(), (2, 2));
        assert_eq!(filtered.get("g2", "product"), Some(&Scalar::from("a")));
    }

    #[test]
    fn push() {
        let mut table = Table::with_columns(vec!["start".into(), "product".into()]);
        assert!(table.is_empty());
        table.push_row("g1", vec![1.into(), "a".into()]).unwrap();
        assert!(table.push_row("g2", vec![1.into()]).is_err());
        assert_eq!(table.dim(), (1, 2));
        assert_eq!(table.row("g1").unwrap().values()[0], Scalar::Int(1));
    }
}
