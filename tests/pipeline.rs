use jitu_core::insights::{InsightCategory, Severity};
use jitu_core::metrics::Direction;
use jitu_core::recommendations::Priority;
use jitu_core::{analyze, AnalysisConfig, CanonicalField, RawTable};
use polars::prelude::*;

fn workflow_frame() -> DataFrame {
    df! {
        "Tanggal" => ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05", "2024-01-06"],
        "Produk" => ["Kopi", "Teh", "Kopi", "Teh", "Kopi", "Roti"],
        "Harga" => ["Rp 10.000", "Rp 5.000", "Rp 10.000", "Rp 5.000", "Rp 10.000", "Rp 8.000"],
        "Jumlah" => [1i64, 2, 1, 1, 2, 1],
    }
    .unwrap()
}

#[test]
fn full_workflow_from_frame() {
    let table = RawTable::from_frame(&workflow_frame()).unwrap();
    let config = AnalysisConfig::default();
    let (prepared, report) = analyze(&table, None, &config).unwrap();

    assert_eq!(prepared.mapping.get(CanonicalField::Date), Some("Tanggal"));
    assert_eq!(prepared.mapping.get(CanonicalField::Product), Some("Produk"));
    assert_eq!(prepared.mapping.get(CanonicalField::Price), Some("Harga"));
    assert_eq!(prepared.mapping.get(CanonicalField::Qty), Some("Jumlah"));
    assert_eq!(prepared.dropped_rows, 0);
    assert!(prepared.data_issues.is_empty());

    assert_eq!(report.summary.total_revenue, 48000.0);
    assert_eq!(report.summary.total_transactions, 6);
    assert_eq!(report.best_selling.entries[0].product, "Kopi");
    assert_eq!(report.best_selling.entries[0].value, 4.0);

    // Last three days average 7,667 against 8,333 before.
    assert_eq!(report.trend.direction, Direction::Down);
    assert_eq!(report.pareto.products.len(), 1);

    let trend = report
        .insights
        .iter()
        .find(|i| i.category == InsightCategory::Trend)
        .unwrap();
    assert_eq!(trend.severity, Severity::Danger);
    assert!(!trend.message.is_empty());

    assert_eq!(report.recommendations.len(), 4);
    assert_eq!(report.recommendations[0].priority, Priority::High);
}

#[test]
fn duplicates_and_bad_rows_are_counted() {
    let mut table = RawTable::new(vec![
        "Tgl Transaksi".into(),
        "Nama Produk".into(),
        "Harga Jual".into(),
    ]);
    table.push_row(vec!["17-08-2024".into(), "Kopi".into(), "15rb".into()]);
    table.push_row(vec!["17-08-2024".into(), "Kopi".into(), "15rb".into()]);
    table.push_row(vec!["bukan tanggal".into(), "Teh".into(), "5000".into()]);
    table.push_row(vec!["18-08-2024".into(), "Teh".into(), "Rp 5.000,00".into()]);

    let (prepared, report) = analyze(&table, None, &AnalysisConfig::default()).unwrap();
    assert_eq!(prepared.dropped_rows, 1);
    assert_eq!(prepared.duplicates_removed, 1);
    assert_eq!(prepared.transactions.len(), 2);
    assert_eq!(report.summary.total_revenue, 20000.0);

    // Two rows is below the default minimum.
    assert_eq!(report.insights[0].category, InsightCategory::DataQuality);
    assert_eq!(report.trend.direction, Direction::InsufficientData);
}

#[test]
fn report_serializes_to_json() {
    let table = RawTable::from_frame(&workflow_frame()).unwrap();
    let (_, report) = analyze(&table, None, &AnalysisConfig::default()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["trend"]["direction"], "down");
    assert_eq!(json["summary"]["start_date"], "2024-01-01");
    assert_eq!(json["daily_trend"]["points"].as_array().unwrap().len(), 6);
}
