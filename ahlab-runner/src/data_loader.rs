//! Match dataset loading from CSV.
//!
//! Required columns: `home_team`, `away_team`, `handicap`, `home_odds`,
//! `away_odds`. Optional: `home_score`, `away_score`, `league`, `date`
//! (`YYYY-MM-DD`), `week`. Every other column is read as a numeric
//! attribute; empty cells are simply absent.
//!
//! Rows that cannot be parsed are rejected and reported with their line
//! number. Nothing is defaulted: a row with unreadable odds is dropped, not
//! given placeholder odds. Empty score cells load as a missing score and are
//! rejected later by the precompute cache.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use ahlab_core::domain::{HandicapLine, MatchRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that stop a load entirely.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open dataset {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// A row the loader could not turn into a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRejection {
    /// 1-based line in the source file (the header is line 1).
    pub line: u64,
    pub reason: String,
}

/// Parsed records plus the rows that were dropped.
#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    pub records: Vec<MatchRecord>,
    pub rejected_rows: Vec<RowRejection>,
}

const KNOWN_COLUMNS: [&str; 10] = [
    "home_team",
    "away_team",
    "league",
    "date",
    "week",
    "home_score",
    "away_score",
    "handicap",
    "home_odds",
    "away_odds",
];

/// Column positions resolved from the header row.
struct Columns {
    home_team: usize,
    away_team: usize,
    handicap: usize,
    home_odds: usize,
    away_odds: usize,
    home_score: Option<usize>,
    away_score: Option<usize>,
    league: Option<usize>,
    date: Option<usize>,
    week: Option<usize>,
    attributes: Vec<(usize, String)>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let require = |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));

        let attributes = names
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.is_empty() && !KNOWN_COLUMNS.contains(&n.as_str()))
            .map(|(i, n)| (i, n.clone()))
            .collect();

        Ok(Self {
            home_team: require("home_team")?,
            away_team: require("away_team")?,
            handicap: require("handicap")?,
            home_odds: require("home_odds")?,
            away_odds: require("away_odds")?,
            home_score: find("home_score"),
            away_score: find("away_score"),
            league: find("league"),
            date: find("date"),
            week: find("week"),
            attributes,
        })
    }

    fn parse(&self, row: &csv::StringRecord) -> Result<MatchRecord, String> {
        let cell = |i: usize| row.get(i).map(str::trim).unwrap_or("");
        let optional = |i: Option<usize>| i.map(cell).filter(|s| !s.is_empty());

        let home_team = cell(self.home_team);
        let away_team = cell(self.away_team);
        if home_team.is_empty() || away_team.is_empty() {
            return Err("team name is empty".into());
        }

        let handicap: HandicapLine = cell(self.handicap)
            .parse()
            .map_err(|e| format!("handicap: {e}"))?;
        let home_odds = parse_number::<f64>("home_odds", cell(self.home_odds))?;
        let away_odds = parse_number::<f64>("away_odds", cell(self.away_odds))?;

        let mut record = MatchRecord::new(home_team, away_team, handicap, home_odds, away_odds);
        record.home_score = optional(self.home_score)
            .map(|s| parse_number("home_score", s))
            .transpose()?;
        record.away_score = optional(self.away_score)
            .map(|s| parse_number("away_score", s))
            .transpose()?;
        record.week = optional(self.week)
            .map(|s| parse_number("week", s))
            .transpose()?;
        record.league = optional(self.league).map(str::to_string);
        record.date = optional(self.date)
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| format!("date '{s}': {e}"))
            })
            .transpose()?;

        for (i, name) in &self.attributes {
            if let Some(raw) = optional(Some(*i)) {
                let value: f64 = parse_number(name, raw)?;
                record.attributes.insert(name.clone(), value);
            }
        }
        Ok(record)
    }
}

fn parse_number<T: std::str::FromStr>(column: &str, raw: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| format!("{column} '{raw}' is not a valid number: {e}"))
}

/// Read a dataset from any CSV source.
pub fn read_csv<R: io::Read>(reader: R) -> Result<LoadedDataset, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let columns = Columns::resolve(rdr.headers()?)?;
    let width = rdr.headers()?.len();

    let mut dataset = LoadedDataset::default();
    for (i, row) in rdr.records().enumerate() {
        let fallback_line = i as u64 + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                dataset.rejected_rows.push(RowRejection {
                    line: e.position().map_or(fallback_line, |p| p.line()),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = row.position().map_or(fallback_line, |p| p.line());
        if row.len() != width {
            dataset.rejected_rows.push(RowRejection {
                line,
                reason: format!("expected {width} fields, found {}", row.len()),
            });
            continue;
        }
        match columns.parse(&row) {
            Ok(record) => dataset.records.push(record),
            Err(reason) => dataset.rejected_rows.push(RowRejection { line, reason }),
        }
    }
    Ok(dataset)
}

/// Load a dataset from a CSV file.
pub fn load_csv(path: &Path) -> Result<LoadedDataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Open {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    read_csv(file)
}

/// Write records in the layout `read_csv` accepts.
///
/// Attribute columns are the union of all records' attribute names, sorted.
pub fn write_csv<W: io::Write>(records: &[MatchRecord], writer: W) -> Result<(), LoadError> {
    let attributes: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.attributes.keys().map(String::as_str))
        .collect();

    let mut wtr = csv::Writer::from_writer(writer);
    let mut header: Vec<&str> = KNOWN_COLUMNS.to_vec();
    header.extend(attributes.iter().copied());
    wtr.write_record(&header)?;

    let opt = |v: Option<String>| v.unwrap_or_default();
    for r in records {
        let mut row = vec![
            r.home_team.clone(),
            r.away_team.clone(),
            opt(r.league.clone()),
            opt(r.date.map(|d| d.format("%Y-%m-%d").to_string())),
            opt(r.week.map(|w| w.to_string())),
            opt(r.home_score.map(|s| s.to_string())),
            opt(r.away_score.map(|s| s.to_string())),
            r.handicap.to_string(),
            r.home_odds.to_string(),
            r.away_odds.to_string(),
        ];
        row.extend(
            attributes
                .iter()
                .map(|name| opt(r.attribute(name).map(|v| v.to_string()))),
        );
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records to a CSV file.
pub fn save_csv(records: &[MatchRecord], path: &Path) -> Result<(), LoadError> {
    let file = std::fs::File::create(path)?;
    write_csv(records, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
home_team,away_team,league,date,week,home_score,away_score,handicap,home_odds,away_odds,home_position
Arsenal,Chelsea,EPL,2023-08-12,1,2,1,-0.5,1.95,1.95,3
Leeds,Wolves,EPL,2023-08-12,1,0,0,0/-0.5,1.90,2.00,
Spurs,Fulham,EPL,,2,,,-0.25,1.85,2.05,9
";

    #[test]
    fn reads_known_and_attribute_columns() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        assert!(ds.rejected_rows.is_empty());
        assert_eq!(ds.records.len(), 3);

        let first = &ds.records[0];
        assert_eq!(first.home_team, "Arsenal");
        assert_eq!(first.score(), Some((2, 1)));
        assert_eq!(first.handicap, HandicapLine::Single(-0.5));
        assert_eq!(first.league.as_deref(), Some("EPL"));
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 8, 12));
        assert_eq!(first.week, Some(1));
        assert_eq!(first.attribute("home_position"), Some(3.0));

        let second = &ds.records[1];
        assert_eq!(second.handicap, HandicapLine::Split(0.0, -0.5));
        assert_eq!(second.attribute("home_position"), None);

        let third = &ds.records[2];
        assert_eq!(third.score(), None);
        assert_eq!(third.date, None);
        assert_eq!(third.handicap, HandicapLine::Split(0.0, -0.5));
    }

    #[test]
    fn bad_rows_are_rejected_with_line_numbers() {
        let csv = "\
home_team,away_team,handicap,home_odds,away_odds,home_score,away_score
A,B,-0.5,1.9,1.9,1,0
C,D,-0.5,abc,1.9,1,0
E,F,-0.3,1.9,1.9,1,0
G,H,-0.5,1.9
I,J,0,2.0,1.8,x,0
K,L,0,2.0,1.8,0,0
";
        let ds = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.records.len(), 2);
        let lines: Vec<u64> = ds.rejected_rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
        assert!(ds.rejected_rows[0].reason.contains("home_odds"));
        assert!(ds.rejected_rows[1].reason.contains("handicap"));
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let csv = "home_team,away_team,handicap,home_odds\nA,B,0,1.9\n";
        assert!(matches!(
            read_csv(csv.as_bytes()),
            Err(LoadError::MissingColumn("away_odds"))
        ));
    }

    #[test]
    fn written_csv_reads_back() {
        let original = read_csv(SAMPLE.as_bytes()).unwrap().records;
        let mut buf = Vec::new();
        write_csv(&original, &mut buf).unwrap();
        let reread = read_csv(buf.as_slice()).unwrap();
        assert!(reread.rejected_rows.is_empty());
        assert_eq!(reread.records, original);
    }

    #[test]
    fn open_failure_names_the_path() {
        let err = load_csv(Path::new("/nonexistent/matches.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/matches.csv"));
    }
}
