//! End-to-end flow: raw table → transactions → metrics → insights.

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::dedup::deduplicate;
use crate::detector::{ColumnMapping, SchemaDetector};
use crate::error::Result;
use crate::insights::{narrate_summary, Insight, InsightClassifier};
use crate::metrics::{
    DayOfWeekProfile, Granularity, MetricResult, MetricsEngine, ParetoResult, ProductRanking,
    ScalarMetric, SlowMovingList, SummaryMetrics, TrendDirection, TrendSeries,
};
use crate::normalizer::FieldNormalizer;
use crate::quality::{quality_score, validate_minimum_data, QualityReport};
use crate::recommendations::{recommend, Recommendation};
use crate::table::RawTable;
use crate::transaction::TransactionSet;

/// Cleaned data ready for analysis, plus what it cost to get there.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedData {
    pub mapping: ColumnMapping,
    pub transactions: TransactionSet,
    pub dropped_rows: usize,
    pub duplicates_removed: usize,
    pub quality: QualityReport,
    pub data_issues: Vec<String>,
}

/// Detect (or take `overrides` on top of the detected mapping), validate,
/// normalize and deduplicate.
pub fn prepare(
    table: &RawTable,
    overrides: Option<&ColumnMapping>,
    config: &AnalysisConfig,
) -> Result<PreparedData> {
    let detected = SchemaDetector::new(config.allow_shared_headers).detect(table.headers());
    let mapping = match overrides {
        Some(o) => detected.merged_with(o),
        None => detected,
    };
    mapping.validate()?;

    let quality = quality_score(table);
    let data_issues = validate_minimum_data(table, config.min_rows);

    let normalized =
        FieldNormalizer::new(config.standardize_product_names).normalize(table, &mapping)?;
    let deduped = deduplicate(&normalized.transactions);

    tracing::info!(
        rows = deduped.transactions.len(),
        dropped = normalized.dropped_rows,
        duplicates = deduped.removed,
        quality = quality.score,
        "Prepared transactions"
    );

    Ok(PreparedData {
        mapping,
        transactions: deduped.transactions,
        dropped_rows: normalized.dropped_rows,
        duplicates_removed: deduped.removed,
        quality,
        data_issues,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: SummaryMetrics,
    pub scalars: Vec<ScalarMetric>,
    pub summary_sentences: Vec<String>,
    pub best_selling: ProductRanking,
    pub top_revenue: ProductRanking,
    pub daily_trend: TrendSeries,
    pub trend: TrendDirection,
    pub day_of_week: DayOfWeekProfile,
    pub pareto: ParetoResult,
    pub slow_moving: SlowMovingList,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run every metric with the configured parameters, classify, and
/// aggregate recommendations.
pub fn build_report(transactions: &TransactionSet, config: &AnalysisConfig) -> AnalysisReport {
    let engine = MetricsEngine::new(transactions)
        .with_trend_thresholds(config.trend_change_threshold, config.volatility_cv_threshold);
    let classifier = InsightClassifier {
        pareto_success_max_pct: config.pareto_success_max_pct,
        pareto_info_max_pct: config.pareto_info_max_pct,
    };

    let summary = engine.summary();
    let best_selling = engine.best_selling_products(config.top_n);
    let top_revenue = engine.revenue_by_product(config.top_n);
    let daily_trend = engine.sales_trend(Granularity::Day);
    let trend = engine.trend_direction(config.trend_window);
    let day_of_week = engine.day_of_week_profile();
    let pareto = engine.pareto_analysis(config.pareto_threshold);
    let slow_moving = engine.slow_moving_products(config.slow_moving_days);

    let scalars = engine.scalar_metrics();

    let classified = [
        MetricResult::TrendDirection(trend.clone()),
        MetricResult::Ranking(best_selling.clone()),
        MetricResult::Ranking(top_revenue.clone()),
        MetricResult::Pareto(pareto.clone()),
        MetricResult::DayOfWeek(day_of_week.clone()),
        MetricResult::SlowMoving(slow_moving.clone()),
    ];

    let insights: Vec<Insight> = classifier
        .data_sufficiency(transactions.len(), config.min_rows)
        .into_iter()
        .chain(
            scalars
                .iter()
                .cloned()
                .map(MetricResult::Scalar)
                .chain(classified)
                .filter_map(|r| classifier.classify(&r)),
        )
        .collect();

    let recommendations = recommend(&insights, config.max_recommendations);

    tracing::info!(
        insights = insights.len(),
        recommendations = recommendations.len(),
        "Built analysis report"
    );

    AnalysisReport {
        summary_sentences: narrate_summary(&summary),
        summary,
        scalars,
        best_selling,
        top_revenue,
        daily_trend,
        trend,
        day_of_week,
        pareto,
        slow_moving,
        insights,
        recommendations,
    }
}

/// [`prepare`] followed by [`build_report`].
pub fn analyze(
    table: &RawTable,
    overrides: Option<&ColumnMapping>,
    config: &AnalysisConfig,
) -> Result<(PreparedData, AnalysisReport)> {
    let prepared = prepare(table, overrides, config)?;
    let report = build_report(&prepared.transactions, config);
    Ok((prepared, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JituError;
    use crate::insights::InsightCategory;
    use crate::schema::CanonicalField;
    use crate::table::RawValue;

    fn raw(headers: &[&str], rows: Vec<Vec<RawValue>>) -> RawTable {
        let mut table = RawTable::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    #[test]
    fn override_replaces_detected_header() {
        let table = raw(
            &["Tanggal", "Produk", "Harga", "Bayar"],
            vec![vec![
                "2024-01-01".into(),
                "Kopi".into(),
                "1000".into(),
                "2000".into(),
            ]],
        );
        let mut overrides = ColumnMapping::default();
        overrides.insert(CanonicalField::Price, "Bayar");

        let prepared = prepare(&table, Some(&overrides), &AnalysisConfig::default()).unwrap();
        assert_eq!(prepared.mapping.get(CanonicalField::Price), Some("Bayar"));
        assert_eq!(prepared.transactions.transactions()[0].price, 2000.0);
    }

    fn dated_rows(days: u32, cells: &[&str]) -> Vec<Vec<RawValue>> {
        (1..=days)
            .map(|day| {
                let mut row: Vec<RawValue> = vec![format!("2024-01-{day:02}").into()];
                row.extend(cells.iter().map(|c| RawValue::from(*c)));
                row
            })
            .collect()
    }

    #[test]
    fn shared_header_feeds_product_and_customer() {
        let table = raw(
            &["Tanggal", "Nama Pelanggan", "Harga"],
            dated_rows(6, &["Budi", "1000"]),
        );
        let config = AnalysisConfig {
            allow_shared_headers: true,
            ..AnalysisConfig::default()
        };

        let prepared = prepare(&table, None, &config).unwrap();
        assert_eq!(
            prepared.mapping.get(CanonicalField::Product),
            Some("Nama Pelanggan")
        );
        assert_eq!(
            prepared.mapping.get(CanonicalField::Customer),
            Some("Nama Pelanggan")
        );
        assert_eq!(prepared.dropped_rows, 0);
        assert_eq!(prepared.transactions.len(), 6);
        assert!(prepared
            .transactions
            .iter()
            .all(|t| t.product == "Budi" && t.customer.as_deref() == Some("Budi")));
    }

    #[test]
    fn override_may_reuse_a_detected_header() {
        let table = raw(&["Tanggal", "Produk", "Total"], dated_rows(6, &["Kopi", "3"]));
        let mut overrides = ColumnMapping::default();
        overrides.insert(CanonicalField::Qty, "Total");

        let (prepared, report) =
            analyze(&table, Some(&overrides), &AnalysisConfig::default()).unwrap();
        assert_eq!(prepared.mapping.get(CanonicalField::Price), Some("Total"));
        assert_eq!(prepared.mapping.get(CanonicalField::Qty), Some("Total"));
        assert_eq!(prepared.dropped_rows, 0);
        assert_eq!(prepared.transactions.len(), 6);
        assert!(prepared
            .transactions
            .iter()
            .all(|t| t.price == 3.0 && t.qty == 3));
        assert_eq!(report.summary.total_revenue, 18.0);
    }

    #[test]
    fn product_names_are_standardized_when_configured() {
        let table = raw(
            &["Tanggal", "Produk", "Harga"],
            vec![
                vec!["2024-01-01".into(), " Kopi  Susu".into(), "1000".into()],
                vec!["2024-01-02".into(), "kopi susu".into(), "1000".into()],
                vec!["2024-01-03".into(), "KOPI SUSU ".into(), "1000".into()],
            ],
        );
        let config = AnalysisConfig {
            standardize_product_names: true,
            ..AnalysisConfig::default()
        };

        let prepared = prepare(&table, None, &config).unwrap();
        assert_eq!(prepared.transactions.products(), vec!["kopi susu"]);

        let prepared = prepare(&table, None, &AnalysisConfig::default()).unwrap();
        assert_eq!(prepared.transactions.products().len(), 3);
    }

    #[test]
    fn missing_required_columns_block_preparation() {
        let table = raw(&["Tanggal", "Keterangan"], vec![]);
        assert!(matches!(
            prepare(&table, None, &AnalysisConfig::default()),
            Err(JituError::MissingRequiredColumns(_))
        ));
    }

    #[test]
    fn small_upload_gets_sufficiency_warning() {
        let table = raw(
            &["Tanggal", "Produk", "Harga"],
            vec![
                vec!["2024-01-01".into(), "Kopi".into(), "1000".into()],
                vec!["2024-01-02".into(), "Teh".into(), "500".into()],
            ],
        );
        let config = AnalysisConfig::default();
        let (prepared, report) = analyze(&table, None, &config).unwrap();
        assert_eq!(prepared.data_issues.len(), 1);
        assert_eq!(report.insights[0].category, InsightCategory::DataQuality);
        assert!(report.to_json().unwrap().contains("\"data_quality\""));
    }
}
