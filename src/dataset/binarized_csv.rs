use crate::error::RbmError;
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Default cut-off on the 0-255 intensity scale; values at or above it become `true`.
pub const DEFAULT_BINARIZE_THRESHOLD: u32 = 128;

/// Streaming reader that turns a labelled numeric table into binary feature vectors.
///
/// The input is comma-separated text in the MNIST CSV layout:
/// - the first line is a header and is skipped
/// - the first column of every row is a label and is skipped
/// - the next `n_features` columns are integer intensities, mapped to `value >= threshold`;
///   only unsigned integers are accepted, so fields such as `12.0` or `-5` are rejected
/// - columns beyond `n_features` are ignored
///
/// Blank lines are skipped. Each remaining row yields either a binary vector or an
/// `RbmError::Ingestion` describing why it could not be read. Rows yielded before an
/// error remain valid; a caller that needs the whole table should stop at the first
/// error, as [`load_binarized_csv`] does.
///
/// # Examples
/// ```rust
/// use rustyrbm::dataset::BinarizedCsvReader;
///
/// let table = "label,p0,p1,p2\n7,0,200,128\n3,255,10,0\n";
/// let rows: Vec<_> = BinarizedCsvReader::new(table.as_bytes(), 3, 128)
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert_eq!(rows[0].to_vec(), vec![false, true, true]);
/// assert_eq!(rows[1].to_vec(), vec![true, false, false]);
/// ```
pub struct BinarizedCsvReader<R> {
    lines: std::io::Lines<R>,
    n_features: usize,
    threshold: u32,
    line_number: usize,
    header_skipped: bool,
}

impl<R: BufRead> BinarizedCsvReader<R> {
    /// Creates a reader over `source`.
    ///
    /// # Parameters
    ///
    /// - `source` - Buffered text source
    /// - `n_features` - Number of values each row must provide after the label
    /// - `threshold` - Intensities at or above this value map to `true`
    pub fn new(source: R, n_features: usize, threshold: u32) -> Self {
        BinarizedCsvReader {
            lines: source.lines(),
            n_features,
            threshold,
            line_number: 0,
            header_skipped: false,
        }
    }

    fn parse_row(&self, line: &str) -> Result<Array1<bool>, RbmError> {
        let mut values = Vec::with_capacity(self.n_features);

        for field in line.split(',').skip(1).take(self.n_features) {
            let intensity = field.trim().parse::<u32>().map_err(|e| RbmError::Ingestion {
                line: self.line_number,
                reason: format!("field {} ('{}') is not an intensity: {}", values.len() + 1, field.trim(), e),
            })?;
            values.push(intensity >= self.threshold);
        }

        if values.len() != self.n_features {
            return Err(RbmError::Ingestion {
                line: self.line_number,
                reason: format!(
                    "expected {} values after the label, found {}",
                    self.n_features,
                    values.len()
                ),
            });
        }

        Ok(Array1::from_vec(values))
    }
}

impl<R: BufRead> Iterator for BinarizedCsvReader<R> {
    type Item = Result<Array1<bool>, RbmError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(RbmError::Io(e))),
            };
            self.line_number += 1;

            if !self.header_skipped {
                self.header_skipped = true;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            return Some(self.parse_row(&line));
        }
    }
}

/// Loads a whole labelled table as a binary training set.
///
/// Ingestion is all-or-nothing: the first malformed row aborts the load and no
/// partial dataset is returned.
///
/// # Parameters
///
/// - `path` - Path of the CSV file
/// - `n_features` - Number of visible units each row must provide
/// - `threshold` - Intensities at or above this value map to `true`
///
/// # Returns
///
/// - `Ok(Array2<bool>)` - One row per example, `n_features` columns
/// - `Err(RbmError::Ingestion)` - If a row is malformed
/// - `Err(RbmError::InvalidInput)` - If the table has no data rows
/// - `Err(RbmError::Io)` - If the file cannot be read
pub fn load_binarized_csv<P: AsRef<Path>>(
    path: P,
    n_features: usize,
    threshold: u32,
) -> Result<Array2<bool>, RbmError> {
    let path = path.as_ref();
    let reader = BinarizedCsvReader::new(BufReader::new(File::open(path)?), n_features, threshold);

    let mut values = Vec::new();
    let mut n_rows = 0;
    for row in reader {
        values.extend(row?.iter().copied());
        n_rows += 1;
    }

    if n_rows == 0 {
        return Err(RbmError::InvalidInput(format!(
            "{} contains no training examples",
            path.display()
        )));
    }

    let training_set = Array2::from_shape_vec((n_rows, n_features), values)
        .map_err(|e| RbmError::InvalidInput(format!("Failed to shape training set: {}", e)))?;

    tracing::info!(
        path = %path.display(),
        examples = n_rows,
        features = n_features,
        "Training set loaded"
    );
    Ok(training_set)
}
