//! Integration tests for the full pipeline: config file, CSV dataset,
//! search, and exported artifacts.

use std::path::PathBuf;

use ahlab_core::domain::{HandicapLine, MatchRecord};
use ahlab_runner::config::SearchConfig;
use ahlab_runner::data_loader::{load_csv, save_csv};
use ahlab_runner::export::{load_report, save_report};
use ahlab_runner::search::{run_search, SearchOptions};
use ahlab_runner::synthetic::{generate, SyntheticConfig};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[test]
fn synthetic_csv_config_search_export() {
    let dir = tempfile::tempdir().unwrap();

    let data_path = dir.path().join("matches.csv");
    let records = generate(&SyntheticConfig::new(400, 21));
    save_csv(&records, &data_path).unwrap();

    let config_path = write(
        &dir,
        "search.toml",
        r#"
        [search]
        min_size = 2
        max_size = 4
        min_bets = 15
        top = 30

        [stake]
        base_stake = 50.0
        max_stake = 120.0
        fixed_amount = 50.0
        "#,
    );

    let config = SearchConfig::load(&config_path).unwrap();
    config.validate().unwrap();
    let library = config.library().unwrap();

    let loaded = load_csv(&data_path).unwrap();
    assert!(loaded.rejected_rows.is_empty());
    assert_eq!(loaded.records.len(), 400);

    let options = SearchOptions::from(&config.search);
    let report = run_search(&loaded.records, &library, &options).unwrap();
    assert_eq!(report.valid_records, 400);
    assert!(report.entries.len() <= 30);
    assert!(!report.entries.is_empty());
    assert!(report.entries.iter().all(|e| e.result.bet_count >= 15));

    // Loading the CSV must not change what was searched.
    let direct = run_search(&records, &library, &options).unwrap();
    assert_eq!(direct.dataset_hash, report.dataset_hash);
    assert_eq!(
        direct
            .entries
            .iter()
            .map(|e| &e.combination_id)
            .collect::<Vec<_>>(),
        report
            .entries
            .iter()
            .map(|e| &e.combination_id)
            .collect::<Vec<_>>()
    );

    let json_path = dir.path().join("artifacts").join("report.json");
    save_report(&report, &json_path).unwrap();
    let reloaded = load_report(&json_path).unwrap();
    assert_eq!(reloaded.entries.len(), report.entries.len());
    assert_eq!(reloaded.dataset_hash, report.dataset_hash);

    let csv_path = dir.path().join("artifacts").join("ranking.csv");
    save_report(&report, &csv_path).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), report.entries.len() + 1);
}

#[test]
fn malformed_rows_and_records_are_counted_separately() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = write(
        &dir,
        "matches.csv",
        "\
home_team,away_team,week,home_score,away_score,handicap,home_odds,away_odds
A,B,1,2,0,-1,1.90,1.95
C,D,1,1,0,-1,1.90,1.95
E,F,2,0,0,0/-0.5,1.90,1.95
G,H,2,1,0,0/-0.5,1.90,1.95
I,J,3,,,-0.5,1.90,1.95
K,L,3,1,1,0/-1,1.90,1.95
M,N,4,1,1,0,1.00,2.80
O,P,4,1,1,zero,1.90,1.95
",
    );

    let loaded = load_csv(&data_path).unwrap();
    // "0/-1" is not an adjacent split and "zero" is not a line at all.
    let lines: Vec<u64> = loaded.rejected_rows.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![7, 9]);
    assert_eq!(loaded.records.len(), 6);

    let library = SearchConfig::default().library().unwrap();
    let options = SearchOptions {
        min_size: 2,
        max_size: 2,
        min_bets: 0,
        top: None,
        parallel: true,
    };
    let report = run_search(&loaded.records, &library, &options).unwrap();

    // Missing score and odds of 1.0.
    assert_eq!(report.rejected_records(), 2);
    assert_eq!(report.valid_records, 4);

    let home_fixed = report
        .entries
        .iter()
        .find(|e| e.description.side == "back_home" && e.description.stake == "fixed_stake")
        .unwrap();
    // Win 90, push 0, half-lose -50, win 90.
    assert_eq!(home_fixed.result.bet_count, 4);
    assert!((home_fixed.result.total_profit - 130.0).abs() < 1e-9);
    assert!((home_fixed.result.roi - 0.325).abs() < 1e-12);
}

#[test]
fn quarter_notation_settles_as_split() {
    let records = vec![
        MatchRecord::new("A", "B", "-0.25".parse().unwrap(), 2.00, 1.90).with_score(0, 0),
        MatchRecord::new("C", "D", HandicapLine::Split(0.0, -0.5), 2.00, 1.90).with_score(0, 0),
    ];
    let library = SearchConfig::default().library().unwrap();
    let options = SearchOptions {
        min_size: 2,
        max_size: 2,
        min_bets: 0,
        top: None,
        parallel: false,
    };
    let report = run_search(&records, &library, &options).unwrap();
    let away_fixed = report
        .entries
        .iter()
        .find(|e| e.description.side == "back_away" && e.description.stake == "fixed_stake")
        .unwrap();
    assert_eq!(away_fixed.result.half_wins, 2);
    assert!((away_fixed.result.total_profit - 90.0).abs() < 1e-9);
}
