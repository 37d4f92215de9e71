use std::{io::Write, path::Path};

use anyhow::Result;
use serde::Serialize;

use crate::{
    builder::PlantedInstance,
    error::SolveError,
    file::{Instance, SkippedRow},
    money::format_cents,
};

/// Subsets up to this size are printed whole in the generator summary
const PREVIEW_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct Solved<'a> {
    name: &'a str,
    target: u64,
    items: usize,
    found: bool,
    subset: &'a [u64],
}

#[derive(Serialize)]
struct Skipped<'a> {
    line: Option<u64>,
    name: Option<&'a str>,
    error: String,
}

/// Writes one entry per batch row, in the order rows are handed in
pub struct Reporter<W> {
    out: W,
    format: Format,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: Format) -> Self {
        Self { out, format }
    }

    pub fn solved(&mut self, instance: &Instance, witness: Option<&[u64]>) -> Result<()> {
        match self.format {
            Format::Json => {
                let report = Solved {
                    name: &instance.name,
                    target: instance.target,
                    items: instance.pool.len(),
                    found: witness.is_some(),
                    subset: witness.unwrap_or_default(),
                };
                serde_json::to_writer(&mut self.out, &report)?;
                writeln!(self.out)?;
            }
            Format::Text => {
                let out = &mut self.out;
                writeln!(out, "{}", "=".repeat(80))?;
                writeln!(out, "Instance: {}", instance.name)?;
                writeln!(
                    out,
                    "Target  : {} -> {}",
                    instance.target,
                    format_cents(instance.target)
                )?;
                writeln!(out, "Items   : {} values", instance.pool.len())?;

                match witness {
                    Some(subset) => {
                        let sum = subset.iter().sum::<u64>();
                        let money = subset.iter().map(|&v| format_cents(v)).collect::<Vec<_>>();
                        writeln!(out, "\n>>> FOUND")?;
                        writeln!(out, "Subset sum: {} -> {}", sum, format_cents(sum))?;
                        writeln!(out, "Subset (cents): {:?}", subset)?;
                        writeln!(out, "Subset (R$)   : [{}]", money.join(", "))?;
                    }
                    None => writeln!(out, "\n>>> NOT FOUND")?,
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn skipped(&mut self, row: &SkippedRow) -> Result<()> {
        match self.format {
            Format::Json => self.json_skip(Some(row.line), row.name.as_deref(), &row.error)?,
            Format::Text => writeln!(self.out, "{row}")?,
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn failed(&mut self, instance: &Instance, err: &SolveError) -> Result<()> {
        match self.format {
            Format::Json => self.json_skip(None, Some(instance.name.as_str()), err)?,
            Format::Text => writeln!(self.out, "[{}] skipped: {}", instance.name, err)?,
        }
        self.out.flush()?;
        Ok(())
    }

    fn json_skip(
        &mut self,
        line: Option<u64>,
        name: Option<&str>,
        error: &dyn std::fmt::Display,
    ) -> Result<()> {
        let report = Skipped {
            line,
            name,
            error: error.to_string(),
        };
        serde_json::to_writer(&mut self.out, &report)?;
        writeln!(self.out)?;
        Ok(())
    }
}

/// `[1, 2, 3]` for short subsets, `[1, ..., 10, ..., last]` otherwise
fn preview(subset: &[u64]) -> String {
    if subset.len() <= PREVIEW_LEN {
        return format!("{subset:?}");
    }

    let mut parts = subset[..10].iter().map(u64::to_string).collect::<Vec<_>>();
    parts.push("...".to_string());
    if let Some(last) = subset.last() {
        parts.push(last.to_string());
    }
    format!("[{}]", parts.join(", "))
}

/// What the generator prints after writing its record
pub fn write_summary(out: &mut impl Write, path: &Path, planted: &PlantedInstance) -> Result<()> {
    let shown = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    writeln!(out, "\n=== Done ===")?;
    writeln!(out, "Saved to        : {}", shown.display())?;
    writeln!(out, "Pool size       : {}", planted.pool.len())?;
    writeln!(out, "Distinct?       : {}", planted.is_distinct())?;
    writeln!(out, "Sum(subset)==T  : {}", planted.closes_target())?;
    writeln!(out, "Planted subset  : {}", preview(&planted.subset))?;
    writeln!(out, "Target          : {}", format_cents(planted.target))?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::RowDataError;

    fn instance() -> Instance {
        Instance {
            name: "custom_5".to_string(),
            pool: vec![1, 2, 3, 4, 90],
            target: 100,
        }
    }

    fn text(f: impl FnOnce(&mut Reporter<&mut Vec<u8>>)) -> String {
        let mut buf = Vec::new();
        f(&mut Reporter::new(&mut buf, Format::Text));
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_found() {
        let out = text(|r| r.solved(&instance(), Some(&[10, 90][..])).unwrap());
        assert!(out.starts_with(&"=".repeat(80)));
        assert!(out.contains("Instance: custom_5\n"));
        assert!(out.contains("Target  : 100 -> R$ 1,00\n"));
        assert!(out.contains("Items   : 5 values\n"));
        assert!(out.contains(">>> FOUND\n"));
        assert!(out.contains("Subset sum: 100 -> R$ 1,00\n"));
        assert!(out.contains("Subset (cents): [10, 90]\n"));
        assert!(out.contains("Subset (R$)   : [R$ 0,10, R$ 0,90]\n"));
    }

    #[test]
    fn test_text_not_found_and_skipped() {
        let out = text(|r| {
            r.solved(&instance(), None).unwrap();
            r.skipped(&SkippedRow {
                line: 3,
                name: Some("bad".to_string()),
                error: RowDataError::InvalidPoolValue("abc".to_string()),
            })
            .unwrap();
        });
        assert!(out.contains(">>> NOT FOUND\n"));
        assert!(out.ends_with("[line 3] [bad] skipped: invalid pool value 'abc'\n"));
    }

    #[test]
    fn test_json_lines() {
        let mut buf = Vec::new();
        let mut reporter = Reporter::new(&mut buf, Format::Json);
        reporter.solved(&instance(), Some(&[][..])).unwrap();
        reporter.solved(&instance(), None).unwrap();
        reporter
            .failed(
                &instance(),
                &SolveError::TargetTooLarge {
                    target: 100,
                    max: 10,
                },
            )
            .unwrap();

        let out = String::from_utf8(buf).unwrap();
        let lines = out
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(
            lines[0],
            serde_json::json!({"name": "custom_5", "target": 100, "items": 5, "found": true, "subset": []})
        );
        assert_eq!(lines[1]["found"], false);
        assert_eq!(lines[2]["line"], serde_json::Value::Null);
        assert_eq!(
            lines[2]["error"],
            "target 100 exceeds the solver limit of 10"
        );
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview(&[1, 2, 90]), "[1, 2, 90]");
        let long = (1..=20).collect::<Vec<u64>>();
        assert_eq!(
            preview(&long),
            "[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, ..., 20]"
        );
    }

    #[test]
    fn test_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instances.csv");
        let planted = crate::builder::build(100, 5).unwrap();

        let mut buf = Vec::new();
        write_summary(&mut buf, &path, &planted).unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert!(out.contains("Pool size       : 5\n"));
        assert!(out.contains("Distinct?       : true\n"));
        assert!(out.contains("Sum(subset)==T  : true\n"));
        assert!(out.contains("Planted subset  : [1, 2, 3, 4, 90]\n"));
        assert!(out.contains("Target          : R$ 1,00\n"));
    }
}
