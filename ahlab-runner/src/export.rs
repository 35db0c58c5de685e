//! Export — JSON and CSV artifacts for search reports.
//!
//! - **JSON**: the full `SearchReport`, round-trippable, with schema versioning
//! - **CSV**: one row per ranked entry for spreadsheets and report generators
//!
//! Unknown schema versions are rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::search::{RankedEntry, SearchReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `SearchReport` to pretty JSON.
pub fn export_json(report: &SearchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SearchReport to JSON")
}

/// Deserialize a `SearchReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SearchReport> {
    let report: SearchReport =
        serde_json::from_str(json).context("failed to deserialize SearchReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export ranked entries as CSV.
///
/// Columns: rank, combination_id, side, stake, filters, bet_count, wins,
/// half_wins, pushes, half_losses, losses, total_stake, total_profit, roi,
/// win_rate, average_odds. Filters are joined with `+`.
pub fn export_entries_csv(entries: &[RankedEntry]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "rank",
        "combination_id",
        "side",
        "stake",
        "filters",
        "bet_count",
        "wins",
        "half_wins",
        "pushes",
        "half_losses",
        "losses",
        "total_stake",
        "total_profit",
        "roi",
        "win_rate",
        "average_odds",
    ])?;

    for e in entries {
        let r = &e.result;
        wtr.write_record([
            &e.rank.to_string(),
            &e.combination_id.to_string(),
            &e.description.side,
            &e.description.stake,
            &e.description.filters.join("+"),
            &r.bet_count.to_string(),
            &r.wins.to_string(),
            &r.half_wins.to_string(),
            &r.pushes.to_string(),
            &r.half_losses.to_string(),
            &r.losses.to_string(),
            &format!("{:.2}", r.total_stake),
            &format!("{:.2}", r.total_profit),
            &format!("{:.6}", r.roi),
            &format!("{:.6}", r.win_rate),
            &format!("{:.4}", r.average_odds),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Files ──────────────────────────────────────────────────────────

/// Write a report to `path`; the extension picks the format (`.json` or `.csv`).
pub fn save_report(report: &SearchReport, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let content = match ext.as_deref() {
        Some("json") => export_json(report)?,
        Some("csv") => export_entries_csv(&report.entries)?,
        _ => bail!(
            "cannot infer export format from '{}' (use .json or .csv)",
            path.display()
        ),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write report: {}", path.display()))
}

pub fn load_report(path: &Path) -> Result<SearchReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report: {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{run_search, SearchOptions};
    use crate::synthetic::{generate, SyntheticConfig};
    use ahlab_core::factor::FactorLibrary;
    use ahlab_core::stake::TieredStake;

    fn report() -> SearchReport {
        let lib = FactorLibrary::standard(TieredStake::default(), 100.0).unwrap();
        let data = generate(&SyntheticConfig::new(150, 3));
        let opts = SearchOptions {
            min_size: 2,
            max_size: 3,
            min_bets: 5,
            top: Some(5),
            parallel: false,
        };
        run_search(&data, &lib, &opts).unwrap()
    }

    fn assert_same_ranking(a: &SearchReport, b: &SearchReport) {
        assert_eq!(a.dataset_hash, b.dataset_hash);
        assert_eq!(a.sizes, b.sizes);
        assert_eq!(a.rejections, b.rejections);
        let ids = |r: &SearchReport| {
            r.entries
                .iter()
                .map(|e| (e.rank, e.combination_id.clone(), e.result.bet_count))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(a), ids(b));
    }

    #[test]
    fn json_roundtrip() {
        let r = report();
        let json = export_json(&r).unwrap();
        assert_same_ranking(&import_json(&json).unwrap(), &r);
    }

    #[test]
    fn future_schema_rejected() {
        let mut r = report();
        r.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&r).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn csv_has_header_and_one_row_per_entry() {
        let r = report();
        let csv = export_entries_csv(&r.entries).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), r.entries.len() + 1);
        assert!(lines[0].starts_with("rank,combination_id,side,stake,filters"));
        assert!(lines[1].starts_with("1,"));
    }

    #[test]
    fn save_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let r = report();

        let json_path = dir.path().join("out").join("report.json");
        save_report(&r, &json_path).unwrap();
        assert_same_ranking(&load_report(&json_path).unwrap(), &r);

        let csv_path = dir.path().join("ranking.CSV");
        save_report(&r, &csv_path).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("rank,"));

        assert!(save_report(&r, &dir.path().join("report.txt")).is_err());
    }
}
