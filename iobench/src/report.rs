//! Benchmark results: CSV export and console tables

use crate::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One timed file-generation run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenerateRecord {
    pub function: String,
    pub path: String,
    pub file_count: usize,
    pub row_count: usize,
    /// Seconds, summed over all iterations
    pub run_time: f64,
    pub drive_type: String,
    pub iter_count: usize,
}

/// One timed load/concatenate run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadRecord {
    pub function: String,
    pub path: String,
    pub file_count: usize,
    pub row_count: usize,
    /// Size of one input file
    #[serde(rename = "FileKB")]
    pub file_kb: f64,
    /// Seconds, summed over all iterations
    pub run_time: f64,
    /// Seconds per iteration
    pub avg_run_time: f64,
    pub drive_type: String,
    pub iter_count: usize,
}

/// Record that can be printed as a table row
pub trait ResultRow {
    fn header() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl ResultRow for GenerateRecord {
    fn header() -> &'static [&'static str] {
        &["Function", "Path", "FileCount", "RowCount", "RunTime", "DriveType", "IterCount"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.function.clone(),
            self.path.clone(),
            self.file_count.to_string(),
            self.row_count.to_string(),
            format!("{:.3}", self.run_time),
            self.drive_type.clone(),
            self.iter_count.to_string(),
        ]
    }
}

impl ResultRow for LoadRecord {
    fn header() -> &'static [&'static str] {
        &[
            "Function",
            "Path",
            "FileCount",
            "RowCount",
            "FileKB",
            "RunTime",
            "AvgRunTime",
            "DriveType",
            "IterCount",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.function.clone(),
            self.path.clone(),
            self.file_count.to_string(),
            self.row_count.to_string(),
            format!("{:.2}", self.file_kb),
            format!("{:.3}", self.run_time),
            format!("{:.4}", self.avg_run_time),
            self.drive_type.clone(),
            self.iter_count.to_string(),
        ]
    }
}

/// Aligned text table; first column left-aligned, the rest right-aligned
pub fn render_table<T: ResultRow>(records: &[T]) -> String {
    let header = T::header();
    let rows: Vec<Vec<String>> = records.iter().map(ResultRow::cells).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = line(header.to_vec());
    out.push('\n');
    let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(total));
    for row in &rows {
        out.push('\n');
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

/// Write `records` to `{dir}/{stem}_results_{uuid}.csv`, creating `dir`
pub fn write_results<T: Serialize>(dir: &Path, stem: &str, records: &[T]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_results_{}.csv", stem, uuid::Uuid::new_v4()));

    let mut writer = csv::Writer::from_path(&path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    log::info!("wrote {} results to {}", records.len(), path.display());
    Ok(path)
}
