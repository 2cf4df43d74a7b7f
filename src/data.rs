//! Data
//!
//! The [`Cohort`] table holding one row per subject, and the column-major
//! [`Matrix`] view the classifiers are fitted on.
use crate::errors::OwlError;
use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Contiguous Column Major Matrix data container.
///
/// This structure holds a dense matrix of values in a single contiguous memory block,
/// in column-major order (Fortran-style), which allows for efficient column slicing.
pub struct Matrix<'a, T> {
    /// The raw data stored in a single slice.
    pub data: &'a [T],
    /// Number of rows in the matrix.
    pub rows: usize,
    /// Number of columns in the matrix.
    pub cols: usize,
}

impl<'a, T> Matrix<'a, T> {
    /// Create a new Matrix.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        Matrix { data, rows, cols }
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `j` - the jth column of the data to get.
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[i + j * self.rows]
    }

    /// Get an entire column in the matrix.
    ///
    /// * `col` - The index of the column to get.
    pub fn get_col(&self, col: usize) -> &[T] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// Get access to a row of the data, as an iterator.
    pub fn get_row_iter(&self, row: usize) -> std::iter::StepBy<std::iter::Skip<std::slice::Iter<'a, T>>> {
        self.data.iter().skip(row).step_by(self.rows)
    }
}

impl<'a, T> Matrix<'a, T>
where
    T: Copy,
{
    /// Get a row of the data as a vector.
    pub fn get_row(&self, row: usize) -> Vec<T> {
        self.get_row_iter(row).copied().collect()
    }

    /// All rows of the data, each as a vector.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        (0..self.rows).map(|r| self.get_row(r)).collect()
    }
}

/// A columnar table of subjects.
///
/// Every subject has an immutable `u64` identifier. All other fields are
/// `f64` columns addressed by name; binary indicators are stored as `0.0`/`1.0`
/// and validated on access with [`Cohort::binary_column`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    ids: Vec<u64>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

impl Cohort {
    /// Create an empty-columned cohort with the given subject identifiers.
    pub fn new(ids: Vec<u64>) -> Self {
        Cohort {
            ids,
            names: Vec::new(),
            columns: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Builder form of [`Cohort::insert_column`].
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Result<Self, OwlError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Add a column, or overwrite it if one with the same name exists.
    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) -> Result<(), OwlError> {
        if values.len() != self.ids.len() {
            return Err(OwlError::InvalidInput(format!(
                "column `{}` has {} values, cohort has {} subjects",
                name,
                values.len(),
                self.ids.len()
            )));
        }
        match self.position(name) {
            Some(i) => self.columns[i] = values,
            None => {
                self.lookup.insert(name.to_string(), self.names.len());
                self.names.push(name.to_string());
                self.columns.push(values);
            }
        }
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        // The lookup is not serialized, fall back to a scan after deserialization.
        match self.lookup.get(name) {
            Some(i) => Some(*i),
            None => self.names.iter().position(|n| n == name),
        }
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Result<&[f64], OwlError> {
        self.position(name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| OwlError::missing_column(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Get a column that must be coded {0, 1}.
    pub fn binary_column(&self, name: &str) -> Result<Vec<u8>, OwlError> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if *v == 0.0 {
                    Ok(0)
                } else if *v == 1.0 {
                    Ok(1)
                } else {
                    Err(OwlError::InvalidInput(format!(
                        "column `{}` must be coded {{0, 1}}, found {} for subject {}",
                        name, v, self.ids[i]
                    )))
                }
            })
            .collect()
    }

    /// Column-major feature data, suitable for [`Matrix::new`].
    pub fn feature_matrix(&self, features: &[String]) -> Result<Vec<f64>, OwlError> {
        let mut data = Vec::with_capacity(features.len() * self.len());
        for f in features {
            let col = self.column(f)?;
            if let Some(v) = col.iter().find(|v| !v.is_finite()) {
                return Err(OwlError::InvalidInput(format!(
                    "feature `{}` contains a non-finite value {}",
                    f, v
                )));
            }
            data.extend_from_slice(col);
        }
        Ok(data)
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Number of subjects.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// A new cohort holding only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Cohort {
        let mut out = Cohort::new(rows.iter().map(|r| self.ids[*r]).collect());
        for (name, col) in self.names.iter().zip(&self.columns) {
            out.lookup.insert(name.clone(), out.names.len());
            out.names.push(name.clone());
            out.columns.push(rows.iter().map(|r| col[*r]).collect());
        }
        out
    }

    /// Partition the cohort into a training and an evaluation split.
    ///
    /// Rows are shuffled with a seeded generator, and each split keeps the
    /// original row order. Both splits must be non-empty.
    ///
    /// * `test_fraction` - Share of subjects placed in the evaluation split.
    /// * `seed` - Seed for the shuffle.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<(Cohort, Cohort), OwlError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(OwlError::InvalidConfiguration(
                "test_fraction".to_string(),
                "a value strictly between 0 and 1".to_string(),
                test_fraction.to_string(),
            ));
        }
        let n = self.len();
        let n_test = (n as f64 * test_fraction).round() as usize;
        if n_test == 0 || n_test >= n {
            return Err(OwlError::InsufficientData(format!(
                "cannot split {} subjects with test fraction {}",
                n, test_fraction
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut index: Vec<usize> = (0..n).collect();
        index.shuffle(&mut rng);
        let mut test_rows = index[..n_test].to_vec();
        let mut train_rows = index[n_test..].to_vec();
        test_rows.sort_unstable();
        train_rows.sort_unstable();
        Ok((self.select_rows(&train_rows), self.select_rows(&test_rows)))
    }

    /// Read a cohort from CSV with a header row.
    ///
    /// * `reader` - Source of CSV text.
    /// * `id_column` - Name of the unsigned integer identifier column.
    pub fn from_csv_reader<R: Read>(reader: R, id_column: &str) -> Result<Self, OwlError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| OwlError::UnableToRead(e.to_string()))?
            .clone();
        let id_index = headers
            .iter()
            .position(|h| h == id_column)
            .ok_or_else(|| OwlError::missing_column(id_column))?;

        let mut ids = Vec::new();
        let mut data_columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        for result in csv_reader.records() {
            let record = result.map_err(|e| OwlError::UnableToRead(e.to_string()))?;
            for (i, field) in record.iter().enumerate() {
                if i == id_index {
                    let id = field.trim().parse::<u64>().map_err(|_| {
                        OwlError::InvalidInput(format!("identifier `{}` is not an unsigned integer", field))
                    })?;
                    ids.push(id);
                } else {
                    let value = if field.trim().is_empty() {
                        f64::NAN
                    } else {
                        field.trim().parse::<f64>().map_err(|_| {
                            OwlError::InvalidInput(format!(
                                "value `{}` in column `{}` is not numeric",
                                field, &headers[i]
                            ))
                        })?
                    };
                    data_columns[i].push(value);
                }
            }
        }

        let mut cohort = Cohort::new(ids);
        for (i, (name, values)) in headers.iter().zip(data_columns).enumerate() {
            if i != id_index {
                cohort.insert_column(name, values)?;
            }
        }
        Ok(cohort)
    }

    /// Write the cohort as CSV, identifier column first.
    pub fn write_csv<W: Write>(&self, writer: W, id_column: &str) -> Result<(), OwlError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut header = vec![id_column.to_string()];
        header.extend(self.names.iter().cloned());
        csv_writer
            .write_record(&header)
            .map_err(|e| OwlError::UnableToWrite(e.to_string()))?;
        for (r, id) in self.ids.iter().enumerate() {
            let mut record = vec![id.to_string()];
            record.extend(self.columns.iter().map(|c| c[r].to_string()));
            csv_writer
                .write_record(&record)
                .map_err(|e| OwlError::UnableToWrite(e.to_string()))?;
        }
        csv_writer.flush().map_err(|e| OwlError::UnableToWrite(e.to_string()))
    }
}
