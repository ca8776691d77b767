use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Parser)]
#[command(author, version, about = "Grades the TLB simulator using ./test-csim", long_about = None)]
pub struct Cli {
    /// Emit autoresult string for Autolab
    #[arg(short = 'A', long)]
    pub autograder: bool,

    /// Correctness checker to run
    #[arg(long, default_value = "./test-csim")]
    pub checker: PathBuf,

    /// JSON file with check definitions (defaults to the built-in csim check)
    #[arg(long)]
    pub checks: Option<PathBuf>,

    /// Checker time limit in seconds (no limit if omitted)
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub limit_run: Option<u64>,

    /// Don't fail when the checker exits with a non-zero status
    #[arg(long)]
    pub ignore_exit_status: bool,

    /// Terminal coloring
    #[arg(short = 'c', long, value_parser = ["on", "off"])]
    pub color: Option<String>,

    /// Debug information
    #[arg(long)]
    pub debug: bool,
}

/// How the integer pulled from the result line turns into points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scoring {
    /// Full credit at or below `lower`, nothing at or above `upper`,
    /// linear in between.
    Misses { lower: u64, upper: u64 },
    /// The checker already reports points; clamp them to the maximum.
    Reported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub key: String,
    pub label: String,
    pub max_points: u32,
    /// Index into the integers found on the result line.
    #[serde(default)]
    pub field: usize,
    pub scoring: Scoring,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Couldn't read check file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Check file {path:?} is not valid JSON")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No checks defined")]
    Empty,
    #[error("Duplicate check key {0:?}")]
    DuplicateKey(String),
    #[error("Check {key:?} needs upper threshold above lower ({lower} >= {upper})")]
    BadThresholds { key: String, lower: u64, upper: u64 },
}

/// The only check the handout grades. test-csim prints the points it awards
/// as the first integer of its results line, out of 27.
pub fn default_checks() -> Vec<CheckDefinition> {
    vec![CheckDefinition {
        key: "csim".to_string(),
        label: "Csim correctness".to_string(),
        max_points: 27,
        field: 0,
        scoring: Scoring::Reported,
    }]
}

pub fn load_checks<P>(path: P) -> Result<Vec<CheckDefinition>, ConfigError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let checks = parse_checks(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_checks(&checks)?;
    Ok(checks)
}

fn parse_checks(contents: &str) -> Result<Vec<CheckDefinition>, serde_json::Error> {
    serde_json::from_str(contents)
}

pub fn validate_checks(checks: &[CheckDefinition]) -> Result<(), ConfigError> {
    if checks.is_empty() {
        return Err(ConfigError::Empty);
    }

    let mut seen = HashSet::new();
    for check in checks {
        if !seen.insert(check.key.as_str()) {
            return Err(ConfigError::DuplicateKey(check.key.clone()));
        }

        if let Scoring::Misses { lower, upper } = check.scoring {
            if upper <= lower {
                return Err(ConfigError::BadThresholds {
                    key: check.key.clone(),
                    lower,
                    upper,
                });
            }
        }
    }

    Ok(())
}

/// Builds the check list for one run, from `--checks` if given.
pub fn checks_for(cli: &Cli) -> Result<Vec<CheckDefinition>, ConfigError> {
    match &cli.checks {
        Some(path) => load_checks(path),
        None => Ok(default_checks()),
    }
}
