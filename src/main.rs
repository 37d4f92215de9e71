use std::io::Write;

use anyhow::{Context, bail};
use tracing::{Level, info, warn};

use crate::cli::Command;
use crate::file::{Instance, Row};
use crate::prompt::Prompt;
use crate::report::{Format, Reporter};
use crate::solver::{Solver, SolverConfig};

mod builder;
mod cli;
mod error;
mod file;
mod money;
mod prompt;
mod report;
mod solver;

fn main() -> anyhow::Result<()> {
    let cli = cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Generate {
            target,
            count,
            output,
            name,
        } => {
            let mut prompt = Prompt::stdio();

            let target = match target {
                Some(target) => money::parse_target_to_cents(&target)?,
                None => prompt.target()?,
            };
            let count = match count {
                Some(count) => count,
                None => prompt.count()?,
            };
            let output = match output {
                Some(output) => file::validate_output_path(&output)?,
                None => prompt.output_path()?,
            };

            let planted = builder::build(target, count)?;
            info!(count, target, planted = planted.subset.len(), "built instance");

            let instance = Instance {
                name: name.unwrap_or_else(|| format!("custom_{count}")),
                pool: planted.pool.clone(),
                target,
            };
            file::save(&instance, &output)?;

            report::write_summary(&mut std::io::stdout(), &output, &planted)?;
        }
        Command::Solve {
            path,
            json,
            jobs,
            checkpoint_interval,
        } => {
            let path = Prompt::stdio().existing_file(path)?;
            let rows = file::load(&path).context("load instances")?;

            let solver = Solver::new(SolverConfig {
                checkpoint_interval,
                ..Default::default()
            });
            let format = if json { Format::Json } else { Format::Text };
            let mut reporter = Reporter::new(std::io::stdout().lock(), format);
            report_batch(&solver, &rows, jobs, &mut reporter)?;
        }
    }

    Ok(())
}

/// Solves the good rows and reports every row in file order, each one as
/// soon as it and the rows before it are known.
fn report_batch<W: Write>(
    solver: &Solver,
    rows: &[Row],
    jobs: usize,
    reporter: &mut Reporter<W>,
) -> anyhow::Result<()> {
    let instances = rows
        .iter()
        .filter_map(|row| row.as_ref().ok())
        .map(|i| (i.pool.as_slice(), i.target))
        .collect::<Vec<_>>();

    let mut rows = rows.iter();
    solver.solve_each(&instances, jobs, |_, outcome| {
        loop {
            match rows.next() {
                Some(Ok(instance)) => {
                    match outcome {
                        Ok(witness) => reporter.solved(instance, witness.as_deref())?,
                        Err(err) => {
                            warn!(name = %instance.name, "{err}");
                            reporter.failed(instance, &err)?;
                        }
                    }
                    return Ok(());
                }
                Some(Err(skipped)) => reporter.skipped(skipped)?,
                None => bail!("solver returned more outcomes than instances"),
            }
        }
    })?;

    for row in rows {
        if let Err(skipped) = row {
            reporter.skipped(skipped)?;
        }
    }

    Ok(())
}
