use std::collections::BTreeMap;
use std::io::{self, Write};

use colored::Colorize;
use serde::Serialize;

use crate::score::{FinalScore, ScoreRecord};

pub fn print_banner<W: Write>(out: &mut W, checker: &str) -> io::Result<()> {
    writeln!(out, "Testing TLB simulator")?;
    writeln!(out, "Running {checker}")
}

/// Writes the points table: header, one row per check, then the total.
pub fn summarize<W: Write>(out: &mut W, records: &[ScoreRecord]) -> io::Result<FinalScore> {
    let total = FinalScore::from_records(records);

    writeln!(out, "\n{}", "TLB Simulator summary:".bold())?;
    writeln!(
        out,
        "{:<22}{:>8}{:>10}{:>12}",
        "", "Points", "Max pts", "Misses"
    )?;
    for r in records {
        writeln!(out, "{:<22}{:>8.1}{:>10}", r.label, r.points, r.max_points)?;
    }
    writeln!(
        out,
        "{:>22}{:>8.1}{:>10}",
        "Total points", total.points, total.max_points
    )?;

    Ok(total)
}

#[derive(Debug, Serialize)]
struct AutoResult<'a> {
    scores: BTreeMap<&'a str, f64>,
}

/// Autolab's autoresult line: `{"scores":{"<key>":<points>,...}}`.
pub fn autoresult(records: &[ScoreRecord]) -> serde_json::Result<String> {
    let result = AutoResult {
        scores: records
            .iter()
            .map(|r| (r.key.as_str(), r.points))
            .collect(),
    };
    serde_json::to_string(&result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, label: &str, points: f64, max_points: u32) -> ScoreRecord {
        ScoreRecord {
            key: key.to_string(),
            label: label.to_string(),
            points,
            max_points,
            measured: 0,
        }
    }

    fn render(records: &[ScoreRecord]) -> (String, FinalScore) {
        colored::control::set_override(false);
        let mut out = Vec::new();
        let total = summarize(&mut out, records).unwrap();
        (String::from_utf8(out).unwrap(), total)
    }

    #[test]
    fn single_check_table() {
        let (text, total) = render(&[record("csim", "Csim correctness", 8.1, 27)]);
        let expected = concat!(
            "\n",
            "TLB Simulator summary:\n",
            "                        Points   Max pts      Misses\n",
            "Csim correctness           8.1        27\n",
            "          Total points     8.1        27\n",
        );
        assert_eq!(text, expected);
        assert_eq!(total.points, 8.1);
        assert_eq!(total.max_points, 27);
    }

    #[test]
    fn total_row_covers_every_check() {
        let (text, total) = render(&[
            record("csim", "Csim correctness", 27.0, 27),
            record("evict", "Evictions", 2.0, 5),
        ]);
        assert!(text.ends_with("          Total points    29.0        32\n"));
        assert_eq!(total.max_points, 32);
    }

    #[test]
    fn banner_names_the_checker() {
        let mut out = Vec::new();
        print_banner(&mut out, "./test-csim").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Testing TLB simulator\nRunning ./test-csim\n"
        );
    }

    #[test]
    fn autoresult_is_keyed_by_check() {
        let json = autoresult(&[
            record("csim", "Csim correctness", 13.5, 27),
            record("evict", "Evictions", 5.0, 5),
        ])
        .unwrap();
        assert_eq!(json, r#"{"scores":{"csim":13.5,"evict":5.0}}"#);
    }
}
