use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use config::Cli;
use runner::{run_checker, ProcessResult};
use score::ScoreRecord;

pub mod config;
pub mod report;
pub mod results;
pub mod runner;
pub mod score;

fn debug(cli: &Cli, msg: impl Display) {
    if cli.debug {
        eprintln!("{}", format!("[debug] {msg}").dimmed());
    }
}

/// Runs the checker once, scores every configured check and writes the
/// report to `out`.
pub fn grade<W: Write>(cli: &Cli, out: &mut W) -> Result<Vec<ScoreRecord>> {
    let checks = config::checks_for(cli).context("Couldn't load check definitions")?;

    report::print_banner(out, &cli.checker.display().to_string())?;
    out.flush()?;

    let limit = cli.limit_run.map(Duration::from_secs);
    let output = run_checker(&cli.checker, limit)?;
    debug(
        cli,
        format!("{:?} finished: {:?}, {} lines", output.path, output.result, output.lines.len()),
    );

    let extraction = results::extract_result(output.lines.as_slice(), out)?;

    match output.result {
        ProcessResult::Success => {}
        ProcessResult::Failure(_) | ProcessResult::Signal(_) if cli.ignore_exit_status => {
            eprintln!(
                "{}",
                format!("Ignoring checker status {:?}", output.result).yellow()
            );
        }
        _ => output.ensure_success()?,
    }

    let counts = extraction.into_counts()?;
    debug(cli, format!("results line integers: {counts:?}"));

    let records = checks
        .iter()
        .map(|check| ScoreRecord::grade(check, &counts))
        .collect::<Result<Vec<_>, _>>()?;
    for r in &records {
        debug(cli, format!("{}: measured {} -> {:.1}", r.key, r.measured, r.points));
    }

    report::summarize(out, &records)?;

    if cli.autograder {
        writeln!(out, "{}", report::autoresult(&records)?)?;
    }

    Ok(records)
}

/// Applies `--color on|off`; anything else leaves terminal detection alone.
pub fn apply_color(choice: Option<&str>) {
    match choice {
        Some("on") => colored::control::set_override(true),
        Some("off") => colored::control::set_override(false),
        _ => {}
    }
}

pub fn run(cli: Cli) -> Result<()> {
    apply_color(cli.color.as_deref());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    grade(&cli, &mut out)?;
    out.flush()?;

    Ok(())
}
