//! Tabular Frames
//!
//! In-memory table of numeric/text cells with CSV and XLSX persistence.
//! Layout on disk: [Header row][Data rows]; CSV may carry a leading index column.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound of the uniform random cell values
pub const VALUE_SCALE: f64 = 100.0;

/// Column name used by CSV writers for the row index
pub const INDEX_COLUMN: &str = "";

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Unknown file format: {0:?}")]
    UnknownFormat(String),

    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, TabularError>;

/// Single table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Empty,
}

impl Value {
    /// Parse a CSV field: finite numbers first, blanks as `Empty`, text otherwise
    pub fn parse(field: &str) -> Self {
        if field.is_empty() {
            return Value::Empty;
        }
        match field.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(field.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Empty => Ok(()),
        }
    }
}

/// On-disk encoding of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    DelimitedText,
    SpreadsheetBinary,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::DelimitedText => "csv",
            FileFormat::SpreadsheetBinary => "xlsx",
        }
    }
}

impl FromStr for FileFormat {
    type Err = TabularError;

    /// Accepts `csv` and the spreadsheet synonyms `excel`, `xl`, `xls`, `xlsx`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::DelimitedText),
            "excel" | "xl" | "xls" | "xlsx" => Ok(FileFormat::SpreadsheetBinary),
            _ => Err(TabularError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// CSV writer options
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvOptions {
    /// Emit a leading unnamed column holding the row number
    pub index: bool,
}

/// Spreadsheet-style column names: A..Z, AA, AB, ...
pub fn column_names(count: usize) -> Vec<String> {
    (0..count).map(column_name).collect()
}

fn column_name(mut idx: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Row-major table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TabularError::RaggedRow {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Random frame with `column_count` lettered columns of floats in [0, 100)
    pub fn random<R: Rng + ?Sized>(row_count: usize, column_count: usize, rng: &mut R) -> Self {
        let rows = (0..row_count)
            .map(|_| {
                (0..column_count)
                    .map(|_| Value::Number(rng.gen::<f64>() * VALUE_SCALE))
                    .collect()
            })
            .collect();
        Self {
            columns: column_names(column_count),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Cells of the first column called `name`
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Append a column holding the same value on every row
    pub fn with_column(mut self, name: impl Into<String>, value: Value) -> Self {
        self.columns.push(name.into());
        for row in &mut self.rows {
            row.push(value.clone());
        }
        self
    }

    pub fn write(&self, path: &Path, format: FileFormat) -> Result<()> {
        match format {
            FileFormat::DelimitedText => self.write_csv(path, CsvOptions::default()),
            FileFormat::SpreadsheetBinary => self.write_xlsx(path),
        }
    }

    pub fn write_csv(&self, path: &Path, opts: CsvOptions) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut record: Vec<String> = Vec::with_capacity(self.columns.len() + 1);
        if opts.index {
            record.push(INDEX_COLUMN.to_string());
        }
        record.extend(self.columns.iter().cloned());
        writer.write_record(&record)?;

        for (i, row) in self.rows.iter().enumerate() {
            record.clear();
            if opts.index {
                record.push(i.to_string());
            }
            record.extend(row.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(Value::parse).collect());
        }

        Ok(Self { columns, rows })
    }

    /// Single worksheet: header row, then one row per frame row
    pub fn write_xlsx(&self, path: &Path) -> Result<()> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();

        for (c, name) in self.columns.iter().enumerate() {
            sheet.write_string(0, c as u16, name.as_str())?;
        }

        for (r, row) in self.rows.iter().enumerate() {
            let xr = (r + 1) as u32;
            for (c, value) in row.iter().enumerate() {
                let xc = c as u16;
                match value {
                    Value::Number(n) => {
                        sheet.write_number(xr, xc, *n)?;
                    }
                    Value::Text(s) => {
                        sheet.write_string(xr, xc, s.as_str())?;
                    }
                    Value::Empty => {}
                }
            }
        }

        workbook.save(path)?;
        Ok(())
    }
}

/// Concatenate frames row-wise.
///
/// Columns are the union of all inputs in first-appearance order; cells a
/// frame has no column for are `Empty`.
pub fn concat<I>(frames: I) -> Frame
where
    I: IntoIterator<Item = Frame>,
{
    let frames: Vec<Frame> = frames.into_iter().collect();

    let mut columns: Vec<String> = Vec::new();
    for frame in &frames {
        for name in &frame.columns {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }

    let total: usize = frames.iter().map(Frame::row_count).sum();
    let mut rows = Vec::with_capacity(total);

    for frame in frames {
        if frame.columns == columns {
            rows.extend(frame.rows);
            continue;
        }

        let positions: Vec<Option<usize>> = columns
            .iter()
            .map(|name| frame.columns.iter().position(|c| c == name))
            .collect();

        for row in frame.rows {
            rows.push(
                positions
                    .iter()
                    .map(|p| p.map_or(Value::Empty, |i| row[i].clone()))
                    .collect(),
            );
        }
    }

    Frame { columns, rows }
}

/// Serialize `frame` to `path` and return the resulting file size in KB
pub fn serialized_kb(frame: &Frame, format: FileFormat, path: &Path) -> Result<f64> {
    frame.write(path, format)?;
    let bytes = fs::metadata(path)?.len();
    log::trace!("{} rows as {} -> {} bytes", frame.row_count(), format, bytes);
    Ok(bytes as f64 / 1024.0)
}
