//! Fixed decision tables turning metric results into narrated insights.
//!
//! Every rule is total over its input: empty results are a branch of the
//! table, never an error.

use serde::Serialize;

use crate::metrics::{
    DayOfWeekProfile, Direction, MetricResult, ParetoResult, ProductRanking, RankingMetric,
    SlowMovingList, SummaryMetrics, TrendDirection, Volatility,
};
use crate::schema::weekday;

pub const DEFAULT_PARETO_SUCCESS_MAX_PCT: f64 = 20.0;
pub const DEFAULT_PARETO_INFO_MAX_PCT: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    DataQuality,
    Trend,
    BestSelling,
    TopRevenue,
    Pareto,
    DayPattern,
    SlowProducts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Insight {
    fn new(
        category: InsightCategory,
        severity: Severity,
        title: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// Maps metric results to insights using the Pareto bands it was built with.
#[derive(Debug, Clone, Copy)]
pub struct InsightClassifier {
    pub pareto_success_max_pct: f64,
    pub pareto_info_max_pct: f64,
}

impl Default for InsightClassifier {
    fn default() -> Self {
        Self {
            pareto_success_max_pct: DEFAULT_PARETO_SUCCESS_MAX_PCT,
            pareto_info_max_pct: DEFAULT_PARETO_INFO_MAX_PCT,
        }
    }
}

impl InsightClassifier {
    /// Dispatch on the result variant. Scalars, trend series and summaries
    /// have no rule table.
    pub fn classify(&self, result: &MetricResult) -> Option<Insight> {
        match result {
            MetricResult::TrendDirection(t) => Some(self.trend(t)),
            MetricResult::Ranking(r) => Some(self.top_product(r)),
            MetricResult::Pareto(p) => Some(self.pareto(p)),
            MetricResult::DayOfWeek(d) => Some(self.day_pattern(d)),
            MetricResult::SlowMoving(s) => Some(self.slow_products(s)),
            MetricResult::Scalar(_) | MetricResult::TrendSeries(_) | MetricResult::Summary(_) => {
                None
            }
        }
    }

    pub fn trend(&self, trend: &TrendDirection) -> Insight {
        use InsightCategory::Trend;

        let change = trend.change_percentage.abs();
        let cv = trend.coefficient_of_variation;
        let volatile = trend.volatility == Volatility::High;

        match (trend.direction, volatile) {
            (Direction::InsufficientData, _) => Insight::new(
                Trend,
                Severity::Warning,
                "Data Terbatas",
                "Belum cukup data untuk menganalisis tren. Upload lebih banyak transaksi untuk \
                 mendapat insight yang lebih baik.",
            ),
            (Direction::Up, true) => Insight::new(
                Trend,
                Severity::Info,
                "Tren Naik Tapi Tidak Stabil",
                format!(
                    "Penjualan naik {change:.1}% tapi sangat fluktuatif (volatilitas {cv:.1}%). \
                     Meskipun tren positif, penjualan naik-turun drastis. Cari cara untuk \
                     stabilkan operasional agar pertumbuhan lebih konsisten."
                ),
            ),
            (Direction::Up, false) => Insight::new(
                Trend,
                Severity::Success,
                "Tren Positif",
                format!(
                    "Penjualan naik {change:.1}% dalam periode ini. Pertahankan strategi yang \
                     sedang berjalan dan pastikan stok selalu tersedia."
                ),
            ),
            (Direction::Down, true) => Insight::new(
                Trend,
                Severity::Danger,
                "Penjualan Turun dan Tidak Stabil",
                format!(
                    "PERHATIAN: Penjualan turun {change:.1}% DAN sangat fluktuatif (volatilitas \
                     {cv:.1}%). Ini kombinasi berbahaya. Segera evaluasi kualitas produk, harga, \
                     kompetitor, dan konsistensi stok. Bisnis dalam kondisi kritis."
                ),
            ),
            (Direction::Down, false) => Insight::new(
                Trend,
                Severity::Danger,
                "Peringatan Dini",
                format!(
                    "Penjualan turun {change:.1}% dalam periode ini. Pertimbangkan untuk membuat \
                     promo atau evaluasi harga dan kualitas produk."
                ),
            ),
            (Direction::Stable, true) => Insight::new(
                Trend,
                Severity::Warning,
                "Stabil Tapi Fluktuatif",
                format!(
                    "Rata-rata penjualan stabil (perubahan {change:.1}%), TAPI grafik naik-turun \
                     drastis (volatilitas {cv:.1}%). Ini bukan kondisi sehat. Cari penyebab \
                     fluktuasi: hari libur, stok tidak teratur, atau faktor lain."
                ),
            ),
            (Direction::Stable, false) => Insight::new(
                Trend,
                Severity::Info,
                "Tren Stabil",
                format!(
                    "Penjualan relatif stabil (perubahan {change:.1}%). Ini waktu yang baik untuk \
                     mencoba strategi baru tanpa risiko besar."
                ),
            ),
        }
    }

    pub fn top_product(&self, ranking: &ProductRanking) -> Insight {
        let category = match ranking.metric {
            RankingMetric::Quantity => InsightCategory::BestSelling,
            RankingMetric::Revenue => InsightCategory::TopRevenue,
        };

        let Some(leader) = ranking.leader() else {
            return Insight::new(
                category,
                Severity::Warning,
                "Tidak Ada Data Produk",
                "Tidak ditemukan data produk untuk dianalisis.",
            );
        };

        match ranking.metric {
            RankingMetric::Quantity => Insight::new(
                category,
                Severity::Success,
                "Produk Terlaris",
                format!(
                    "\"{}\" adalah produk paling laku dengan {} unit terjual. Pastikan stok \
                     produk ini selalu tersedia dan pertimbangkan untuk meningkatkan margin atau \
                     membuat varian baru.",
                    leader.product, leader.value as i64
                ),
            ),
            RankingMetric::Revenue => Insight::new(
                category,
                Severity::Success,
                "Penyumbang Omzet Terbesar",
                format!(
                    "\"{}\" menghasilkan pendapatan {}. Produk ini adalah tulang punggung bisnis \
                     Anda. Jaga kualitas dan ketersediaan stoknya.",
                    leader.product,
                    format_rupiah(leader.value)
                ),
            ),
        }
    }

    pub fn pareto(&self, pareto: &ParetoResult) -> Insight {
        use InsightCategory::Pareto;

        if pareto.products.is_empty() {
            return Insight::new(
                Pareto,
                Severity::Info,
                "Analisis Pareto",
                "Tidak cukup data untuk analisis Pareto.",
            );
        }

        let count = pareto.products.len();
        let pct = pareto.percentage_of_products;
        let share = pareto.threshold * 100.0;

        if pct <= self.pareto_success_max_pct {
            Insight::new(
                Pareto,
                Severity::Success,
                "Fokus Produk Sangat Baik",
                format!(
                    "Hanya {count} produk ({pct:.1}%) yang menghasilkan {share:.0}% pendapatan \
                     Anda. Ini efisiensi yang baik. Fokuskan perhatian pada produk-produk ini \
                     untuk maksimalkan profit."
                ),
            )
        } else if pct <= self.pareto_info_max_pct {
            Insight::new(
                Pareto,
                Severity::Info,
                "Fokus Produk Normal",
                format!(
                    "{count} produk ({pct:.1}%) menghasilkan {share:.0}% pendapatan. Ini cukup \
                     normal. Pertimbangkan untuk mengurangi produk yang kurang laku agar \
                     operasional lebih efisien."
                ),
            )
        } else {
            Insight::new(
                Pareto,
                Severity::Warning,
                "Terlalu Banyak Produk",
                format!(
                    "{count} produk ({pct:.1}%) diperlukan untuk mencapai {share:.0}% pendapatan. \
                     Ini menandakan portfolio produk terlalu luas. Pertimbangkan untuk fokus pada \
                     produk terlaris dan kurangi produk yang tidak menguntungkan."
                ),
            )
        }
    }

    pub fn day_pattern(&self, profile: &DayOfWeekProfile) -> Insight {
        use InsightCategory::DayPattern;

        let (Some(best), Some(worst)) = (profile.best(), profile.worst()) else {
            return Insight::new(
                DayPattern,
                Severity::Info,
                "Pola Harian",
                "Tidak cukup data untuk menganalisis pola harian.",
            );
        };

        let best_name = weekday::INDONESIAN[best.day.num_days_from_monday() as usize];
        let worst_name = weekday::INDONESIAN[worst.day.num_days_from_monday() as usize];

        Insight::new(
            DayPattern,
            Severity::Info,
            "Pola Hari Terbaik",
            format!(
                "Hari {best_name} adalah hari paling ramai (rata-rata {}), sedangkan {worst_name} \
                 paling sepi ({}). Manfaatkan hari ramai untuk upselling, dan buat promo khusus \
                 di hari sepi.",
                format_rupiah(best.mean),
                format_rupiah(worst.mean)
            ),
        )
    }

    pub fn slow_products(&self, slow: &SlowMovingList) -> Insight {
        use InsightCategory::SlowProducts;

        let Some(slowest) = slow.products.first() else {
            return Insight::new(
                SlowProducts,
                Severity::Success,
                "Tidak Ada Produk Mati",
                "Semua produk Anda aktif terjual. Pertahankan rotasi stok yang baik ini.",
            );
        };

        Insight::new(
            SlowProducts,
            Severity::Warning,
            "Produk Tidak Laku",
            format!(
                "Ada {} produk yang tidak terjual selama {} hari atau lebih. \"{}\" sudah {} hari \
                 tidak laku. Pertimbangkan untuk membuat diskon besar-besaran atau stop order \
                 produk ini.",
                slow.products.len(),
                slow.days_threshold,
                slowest.product,
                slowest.days_since_last_sale
            ),
        )
    }

    /// Warning when the upload is too small to analyse with confidence.
    pub fn data_sufficiency(&self, rows: usize, min_rows: usize) -> Option<Insight> {
        (rows < min_rows).then(|| {
            Insight::new(
                InsightCategory::DataQuality,
                Severity::Warning,
                "Data Tidak Cukup",
                format!(
                    "Hanya ada {rows} transaksi, minimal {min_rows} diperlukan untuk analisis \
                     yang bermakna. Hasil analisis mungkin belum akurat."
                ),
            )
        })
    }
}

/// Executive-summary sentences.
pub fn narrate_summary(summary: &SummaryMetrics) -> Vec<String> {
    let mut sentences = vec![
        format!(
            "Total pendapatan Anda adalah {} dari {} transaksi.",
            format_rupiah(summary.total_revenue),
            summary.total_transactions
        ),
        format!(
            "Rata-rata nilai per transaksi adalah {}.",
            format_rupiah(summary.average_transaction)
        ),
    ];

    if summary.unique_products > 0 {
        sentences.push(format!(
            "Anda memiliki {} produk berbeda yang terjual.",
            summary.unique_products
        ));
    }

    if let (Some(start), Some(end)) = (summary.start_date, summary.end_date) {
        sentences.push(format!(
            "Data transaksi mencakup periode {} hingga {}.",
            start.format("%d %B %Y"),
            end.format("%d %B %Y")
        ));
    }

    sentences
}

/// `Rp 1,234,567`: rounded to whole rupiah with comma grouping.
pub fn format_rupiah(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("Rp -{grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::*;
    use crate::metrics::{DayStats, ParetoEntry, RankedProduct, SlowMovingProduct};

    fn trend(direction: Direction, change: f64, volatility: Volatility) -> TrendDirection {
        TrendDirection {
            direction,
            change_percentage: change,
            recent_avg: 0.0,
            previous_avg: 0.0,
            coefficient_of_variation: 62.5,
            volatility,
        }
    }

    fn pareto_with(count: usize, total: usize) -> ParetoResult {
        ParetoResult {
            threshold: 0.8,
            products: (0..count)
                .map(|i| ParetoEntry {
                    product: format!("P{i}"),
                    revenue: 1.0,
                    cumulative_revenue: 1.0,
                    cumulative_share: 0.1,
                })
                .collect(),
            total_products: total,
            percentage_of_products: count as f64 / total as f64 * 100.0,
        }
    }

    #[test]
    fn trend_table() {
        let c = InsightClassifier::default();
        let cases = [
            (Direction::InsufficientData, Volatility::Normal, Severity::Warning),
            (Direction::Up, Volatility::Normal, Severity::Success),
            (Direction::Up, Volatility::High, Severity::Info),
            (Direction::Down, Volatility::Normal, Severity::Danger),
            (Direction::Down, Volatility::High, Severity::Danger),
            (Direction::Stable, Volatility::Normal, Severity::Info),
            (Direction::Stable, Volatility::High, Severity::Warning),
        ];
        for (direction, volatility, expected) in cases {
            let insight = c.trend(&trend(direction, 12.34, volatility));
            assert_eq!(insight.severity, expected, "{direction:?} {volatility:?}");
            assert_eq!(insight.category, InsightCategory::Trend);
        }
    }

    #[test]
    fn trend_message_interpolates_change_and_cv() {
        let insight = InsightClassifier::default().trend(&trend(Direction::Down, -17.857, Volatility::High));
        assert!(insight.message.contains("17.9%"));
        assert!(insight.message.contains("62.5%"));
    }

    #[test]
    fn top_product_names_leader() {
        let c = InsightClassifier::default();
        let ranking = ProductRanking {
            metric: RankingMetric::Revenue,
            entries: vec![RankedProduct {
                product: "Kopi".into(),
                value: 50000.0,
            }],
        };
        let insight = c.top_product(&ranking);
        assert_eq!(insight.severity, Severity::Success);
        assert_eq!(insight.category, InsightCategory::TopRevenue);
        assert!(insight.message.contains("\"Kopi\""));
        assert!(insight.message.contains("Rp 50,000"));

        let empty = ProductRanking {
            metric: RankingMetric::Quantity,
            entries: vec![],
        };
        assert_eq!(c.top_product(&empty).severity, Severity::Warning);
    }

    #[test]
    fn pareto_bands() {
        let c = InsightClassifier::default();
        assert_eq!(c.pareto(&pareto_with(0, 3)).severity, Severity::Info);
        assert_eq!(c.pareto(&pareto_with(1, 5)).severity, Severity::Success);
        assert_eq!(c.pareto(&pareto_with(1, 3)).severity, Severity::Info);
        assert_eq!(c.pareto(&pareto_with(3, 5)).severity, Severity::Warning);
    }

    #[test]
    fn day_pattern_uses_indonesian_names() {
        let profile = DayOfWeekProfile {
            days: vec![
                DayStats {
                    day: Weekday::Mon,
                    mean: 7500.0,
                    sum: 15000.0,
                    count: 2,
                },
                DayStats {
                    day: Weekday::Fri,
                    mean: 10000.0,
                    sum: 10000.0,
                    count: 1,
                },
            ],
        };
        let insight = InsightClassifier::default().day_pattern(&profile);
        assert!(insight.message.starts_with("Hari Jumat"));
        assert!(insight.message.contains("Senin paling sepi (Rp 7,500)"));

        let empty = DayOfWeekProfile { days: vec![] };
        assert_eq!(
            InsightClassifier::default().day_pattern(&empty).title,
            "Pola Harian"
        );
    }

    #[test]
    fn slow_products_branches() {
        let c = InsightClassifier::default();
        let none = SlowMovingList {
            days_threshold: 14,
            products: vec![],
        };
        assert_eq!(c.slow_products(&none).severity, Severity::Success);

        let some = SlowMovingList {
            days_threshold: 14,
            products: vec![SlowMovingProduct {
                product: "Roti".into(),
                last_sale_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                days_since_last_sale: 20,
            }],
        };
        let insight = c.slow_products(&some);
        assert_eq!(insight.severity, Severity::Warning);
        assert!(insight.message.contains("\"Roti\" sudah 20 hari"));
    }

    #[test]
    fn classify_skips_variants_without_rules() {
        let c = InsightClassifier::default();
        let scalar = MetricResult::Scalar(crate::metrics::ScalarMetric {
            name: "total_revenue",
            value: 1.0,
        });
        assert!(c.classify(&scalar).is_none());
        let slow = MetricResult::SlowMoving(SlowMovingList {
            days_threshold: 14,
            products: vec![],
        });
        assert!(c.classify(&slow).is_some());
    }

    #[test]
    fn sufficiency_only_below_minimum() {
        let c = InsightClassifier::default();
        assert!(c.data_sufficiency(5, 5).is_none());
        let insight = c.data_sufficiency(3, 5).unwrap();
        assert_eq!(insight.category, InsightCategory::DataQuality);
        assert_eq!(insight.severity, Severity::Warning);
    }

    #[test]
    fn summary_sentences() {
        let summary = SummaryMetrics {
            total_revenue: 81000.0,
            total_transactions: 10,
            average_transaction: 8100.0,
            unique_products: 3,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 10),
        };
        let sentences = narrate_summary(&summary);
        assert_eq!(sentences.len(), 4);
        assert_eq!(
            sentences[0],
            "Total pendapatan Anda adalah Rp 81,000 dari 10 transaksi."
        );
        assert!(sentences[3].contains("01 January 2024"));
    }

    #[test]
    fn rupiah_grouping() {
        assert_eq!(format_rupiah(0.0), "Rp 0");
        assert_eq!(format_rupiah(999.4), "Rp 999");
        assert_eq!(format_rupiah(1_234_567.0), "Rp 1,234,567");
        assert_eq!(format_rupiah(-15000.0), "Rp -15,000");
    }
}
