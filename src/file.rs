use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::{info, warn};

use crate::error::{InputError, RecordFormatError, RowDataError};

pub const COLUMNS: [&str; 3] = ["name", "pool", "target"];

/// One subset sum problem as stored in a CSV row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    pub pool: Vec<u64>,
    pub target: u64,
}

/// A row that was left out of the batch and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based file line, the header being line 1
    pub line: u64,
    pub name: Option<String>,
    pub error: RowDataError,
}

impl std::fmt::Display for SkippedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "[line {}] [{}] skipped: {}", self.line, name, self.error),
            None => write!(f, "[line {}] skipped: {}", self.line, self.error),
        }
    }
}

pub type Row = std::result::Result<Instance, SkippedRow>;

struct Columns {
    name: usize,
    pool: usize,
    target: usize,
}

pub fn load(path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path).with_context(|| format!("open file {}", path.display()))?;
    let rows = read(file).with_context(|| format!("read instances from {}", path.display()))?;

    info!(path = %path.display(), rows = rows.len(), "loaded instances");

    Ok(rows)
}

/// Reads a whole batch. A header without the required columns fails the
/// batch, bad rows are returned as [`SkippedRow`]s.
pub fn read<R: Read>(rdr: R) -> Result<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(rdr);

    let headers = reader.headers().context("read CSV header")?.clone();
    let columns = locate_columns(&headers)?;

    let mut rows = vec![];
    for (i, record) in reader.records().enumerate() {
        let fallback_line = i as u64 + 2;
        let row = match record {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                parse_row(&record, &columns).map_err(|error| SkippedRow {
                    line,
                    name: record.get(columns.name).map(str::to_string),
                    error,
                })
            }
            Err(err) => Err(SkippedRow {
                line: err.position().map_or(fallback_line, |p| p.line()),
                name: None,
                error: RowDataError::Malformed(err.to_string()),
            }),
        };

        if let Err(skipped) = &row {
            warn!("{skipped}");
        }
        rows.push(row);
    }

    Ok(rows)
}

fn locate_columns(headers: &StringRecord) -> Result<Columns, RecordFormatError> {
    let find = |column: &str| headers.iter().position(|h| h == column);

    let missing = COLUMNS
        .into_iter()
        .filter(|&c| find(c).is_none())
        .collect::<Vec<_>>();

    match (find("name"), find("pool"), find("target")) {
        (Some(name), Some(pool), Some(target)) => Ok(Columns { name, pool, target }),
        _ => Err(RecordFormatError { missing }),
    }
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<Instance, RowDataError> {
    let field = |index: usize, column: &'static str| {
        record
            .get(index)
            .ok_or(RowDataError::MissingField(column))
    };

    let name = field(columns.name, "name")?.to_string();
    let pool = parse_pool_field(field(columns.pool, "pool")?)?;
    let target = field(columns.target, "target")?;
    let target = parse_amount(target, RowDataError::InvalidTarget)?;

    Ok(Instance { name, pool, target })
}

/// Parses a non-negative integer over the whole `u64` range. A well-formed
/// negative number is [`RowDataError::Negative`], anything else `invalid`.
fn parse_amount(
    text: &str,
    invalid: fn(String) -> RowDataError,
) -> Result<u64, RowDataError> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) if !digits.starts_with('+') => (true, digits),
        _ => (false, text),
    };
    let value = digits.parse::<u64>().map_err(|_| invalid(text.to_string()))?;

    match (negative, value) {
        (true, 0) | (false, _) => Ok(value),
        (true, _) => Err(RowDataError::Negative),
    }
}

/// Parses `[1,2,3]`, `1,2,3` or `1;2;3` into non-negative integers
pub fn parse_pool_field(field: &str) -> Result<Vec<u64>, RowDataError> {
    let s = field.trim();
    let s = s
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(s);

    let sep = if s.contains(';') { ';' } else { ',' };

    s.split(sep)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_amount(part, RowDataError::InvalidPoolValue))
        .collect()
}

pub fn format_pool(pool: &[u64]) -> String {
    let values = pool.iter().map(u64::to_string).collect::<Vec<_>>();
    format!("[{}]", values.join(","))
}

/// Checks a generator output path: not empty and ending in `.csv`
pub fn validate_output_path(input: &str) -> Result<PathBuf, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(InputError::EmptyPath);
    }

    let path = PathBuf::from(input);
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(InputError::NotCsv(path));
    }

    Ok(path)
}

pub fn save(instance: &Instance, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create dir {}", dir.display()))?;
        }
    }

    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create file {}", path.display()))?;

    writer.write_record(COLUMNS).context("write CSV header")?;
    writer
        .write_record([
            instance.name.as_str(),
            format_pool(&instance.pool).as_str(),
            instance.target.to_string().as_str(),
        ])
        .context("write instance record")?;
    writer.flush().context("flush CSV file")?;

    info!(path = %path.display(), items = instance.pool.len(), "saved instance");

    Ok(())
}
