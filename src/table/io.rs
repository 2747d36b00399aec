// src/table/io.rs
// =============================================================================
// CSV reading and writing.
//
// Input: any CSV with a header row; one column holds the post URLs.
// Output: the input columns unchanged, plus the result columns appended.
//
// The readers/writers are generic over std::io::Read / Write so tests can
// run on in-memory buffers; the *_file helpers wrap them for real paths.
// =============================================================================

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use csv::{ReaderBuilder, WriterBuilder};
use tracing::warn;

use crate::batch::{BatchReport, PostReference, ResultRecord};
use crate::error::{AppError, Result};

/// Columns appended to every output row, in this order.
pub const RESULT_COLUMNS: [&str; 7] = [
    "identifier",
    "availability",
    "http_status",
    "detail",
    "checked_at",
    "embed_status",
    "resolved_url",
];

/// The input file, held in memory for the length of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTable {
    pub headers: Vec<String>,
    /// Every row has exactly `headers.len()` cells
    pub rows: Vec<Vec<String>>,
    url_index: usize,
}

impl InputTable {
    /// The post reference of every row, in input order.
    pub fn references(&self) -> Vec<PostReference> {
        self.rows
            .iter()
            .map(|row| PostReference::new(row[self.url_index].clone()))
            .collect()
    }

    pub fn url_column(&self) -> &str {
        &self.headers[self.url_index]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads a CSV table and locates the URL column.
pub fn read_table<R: Read>(reader: R, url_column: &str) -> Result<InputTable> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(AppError::EmptyInput);
    }
    let url_index = headers
        .iter()
        .position(|h| h == url_column)
        .ok_or_else(|| AppError::missing_column(url_column, &headers))?;

    let width = headers.len();
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let mut row: Vec<String> = record?.iter().map(str::to_string).collect();
        if row.len() > width {
            // +2: header line, 1-based numbering
            warn!(line = index + 2, cells = row.len(), width, "dropping cells beyond the header width");
            row.truncate(width);
        }
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(InputTable {
        headers,
        rows,
        url_index,
    })
}

/// Opens `path` and reads it with `read_table`.
pub fn read_table_file(path: &Path, url_column: &str) -> Result<InputTable> {
    let file = File::open(path)?;
    read_table(file, url_column)
}

/// Writes the input rows with the result columns appended.
///
/// Rows without a record (cancelled batch) are left out.
/// Returns the number of rows written.
pub fn write_results<W: Write>(writer: W, table: &InputTable, report: &BatchReport) -> Result<usize> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    let header = table
        .headers
        .iter()
        .map(String::as_str)
        .chain(RESULT_COLUMNS.iter().copied());
    writer.write_record(header)?;

    let mut written = 0;
    for (row, record) in table.rows.iter().zip(&report.records) {
        let Some(record) = record else {
            continue;
        };
        let cells = row.iter().cloned().chain(result_cells(record));
        writer.write_record(cells)?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}

/// Creates `path` and writes the results into it.
pub fn write_results_file(path: &Path, table: &InputTable, report: &BatchReport) -> Result<usize> {
    let file = File::create(path)?;
    write_results(file, table, report)
}

/// `data/posts.csv` -> `data/posts_checked.csv`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    input.with_file_name(format!("{stem}_checked.csv"))
}

// Null cells are written as empty strings
fn result_cells(record: &ResultRecord) -> [String; 7] {
    let outcome = &record.outcome;
    [
        record.identifier.clone().unwrap_or_default(),
        outcome.availability.to_string(),
        outcome.http_status.map(|s| s.to_string()).unwrap_or_default(),
        outcome.detail.clone().unwrap_or_default(),
        record.checked_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        outcome.embed_status.map(|s| s.to_string()).unwrap_or_default(),
        outcome.resolved_url.clone().unwrap_or_default(),
    ]
}
