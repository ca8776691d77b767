use std::io::{self, Write};

use thiserror::Error;

/// Line prefix test-csim uses for its machine-readable results
pub const RESULTS_MARKER: &str = "TEST_CSIM_RESULTS";

#[derive(Debug, PartialEq)]
pub enum Extraction {
    Found(Vec<u64>),
    NotFound,
}

#[derive(Error, Debug)]
pub enum ResultError {
    #[error("Checker output had no TEST_CSIM_RESULTS line")]
    Missing,
    #[error("Expected integers on the results line instead got: {0}")]
    Malformed(String),
    #[error("Check {check:?} reads result #{field} but the results line only has {found}")]
    MissingField {
        check: String,
        field: usize,
        found: usize,
    },
    #[error("Couldn't echo checker output")]
    Echo(#[from] io::Error),
}

impl Extraction {
    pub fn into_counts(self) -> Result<Vec<u64>, ResultError> {
        match self {
            Extraction::Found(counts) => Ok(counts),
            Extraction::NotFound => Err(ResultError::Missing),
        }
    }
}

fn is_marker(line: &str) -> bool {
    line.starts_with(RESULTS_MARKER)
}

/// Every maximal run of ASCII digits, left to right.
fn parse_counts(line: &str) -> Result<Vec<u64>, ResultError> {
    let counts = line
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(|run| run.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ResultError::Malformed(line.to_string()))?;

    if counts.is_empty() {
        return Err(ResultError::Malformed(line.to_string()));
    }

    Ok(counts)
}

/// Echoes the checker's log lines to `out` and pulls the integers off the
/// first results line. Results lines themselves are never echoed. A bad
/// results line is reported only after the whole output has been echoed.
pub fn extract_result<S, W>(lines: &[S], out: &mut W) -> Result<Extraction, ResultError>
where
    S: AsRef<str>,
    W: Write,
{
    let mut found = None;

    for line in lines {
        let line: &str = line.as_ref();
        if is_marker(line) {
            if found.is_none() {
                found = Some(parse_counts(line));
            }
        } else {
            writeln!(out, "{line}")?;
        }
    }

    Ok(match found.transpose()? {
        Some(counts) => Extraction::Found(counts),
        None => Extraction::NotFound,
    })
}
