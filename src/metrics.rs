//! Aggregations and statistics over an immutable [`TransactionSet`].
//!
//! Every query is a pure function of the set. Grouping is explicit: groups
//! are kept in first-seen order and all rankings use a stable sort on
//! (value descending, first-seen ascending), so ties never depend on hash
//! order.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::JituError;
use crate::schema::weekday;
use crate::transaction::{Transaction, TransactionSet};

pub const DEFAULT_TREND_CHANGE_THRESHOLD: f64 = 5.0;
pub const DEFAULT_VOLATILITY_CV_THRESHOLD: f64 = 50.0;

// ── Result shapes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarMetric {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMetric {
    Quantity,
    Revenue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProduct {
    pub product: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRanking {
    pub metric: RankingMetric,
    pub entries: Vec<RankedProduct>,
}

impl ProductRanking {
    pub fn leader(&self) -> Option<&RankedProduct> {
        self.entries.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl FromStr for Granularity {
    type Err = JituError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Granularity::Day),
            "w" | "week" | "weekly" => Ok(Granularity::Week),
            "m" | "month" | "monthly" => Ok(Granularity::Month),
            _ => Err(JituError::UnknownGranularity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub revenue: f64,
}

/// Revenue per contiguous calendar period. Empty periods are present with
/// zero revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub granularity: Granularity,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Stable,
    InsufficientData,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Stable => "stable",
            Direction::InsufficientData => "insufficient_data",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendDirection {
    pub direction: Direction,
    pub change_percentage: f64,
    pub recent_avg: f64,
    pub previous_avg: f64,
    /// Sample standard deviation of daily revenue over its mean, in percent.
    pub coefficient_of_variation: f64,
    pub volatility: Volatility,
}

impl TrendDirection {
    fn insufficient() -> Self {
        Self {
            direction: Direction::InsufficientData,
            change_percentage: 0.0,
            recent_avg: 0.0,
            previous_avg: 0.0,
            coefficient_of_variation: 0.0,
            volatility: Volatility::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStats {
    pub day: Weekday,
    pub mean: f64,
    pub sum: f64,
    pub count: usize,
}

impl DayStats {
    pub fn name(&self) -> &'static str {
        weekday::ENGLISH[self.day.num_days_from_monday() as usize]
    }
}

/// Per-weekday revenue, Monday first. Weekdays with no sales are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOfWeekProfile {
    pub days: Vec<DayStats>,
}

impl DayOfWeekProfile {
    /// Highest mean revenue; the earlier weekday wins ties.
    pub fn best(&self) -> Option<&DayStats> {
        self.days
            .iter()
            .reduce(|best, d| if d.mean > best.mean { d } else { best })
    }

    /// Lowest mean revenue; the earlier weekday wins ties.
    pub fn worst(&self) -> Option<&DayStats> {
        self.days
            .iter()
            .reduce(|worst, d| if d.mean < worst.mean { d } else { worst })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoEntry {
    pub product: String,
    pub revenue: f64,
    pub cumulative_revenue: f64,
    pub cumulative_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoResult {
    pub threshold: f64,
    /// Top-revenue prefix whose cumulative share stays at or below the
    /// threshold. The product that would cross it is not included.
    pub products: Vec<ParetoEntry>,
    pub total_products: usize,
    pub percentage_of_products: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowMovingProduct {
    pub product: String,
    pub last_sale_date: NaiveDate,
    pub days_since_last_sale: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowMovingList {
    pub days_threshold: i64,
    pub products: Vec<SlowMovingProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_revenue: f64,
    pub total_transactions: usize,
    pub average_transaction: f64,
    pub unique_products: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Closed set of metric shapes the insight layer branches on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricResult {
    Scalar(ScalarMetric),
    Ranking(ProductRanking),
    TrendSeries(TrendSeries),
    TrendDirection(TrendDirection),
    Pareto(ParetoResult),
    DayOfWeek(DayOfWeekProfile),
    SlowMoving(SlowMovingList),
    Summary(SummaryMetrics),
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// Read-only query surface over one transaction snapshot.
#[derive(Debug, Clone, Copy)]
pub struct MetricsEngine<'a> {
    set: &'a TransactionSet,
    change_threshold: f64,
    volatility_threshold: f64,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(set: &'a TransactionSet) -> Self {
        Self {
            set,
            change_threshold: DEFAULT_TREND_CHANGE_THRESHOLD,
            volatility_threshold: DEFAULT_VOLATILITY_CV_THRESHOLD,
        }
    }

    /// Override the ±percent band for up/down and the CV that counts as volatile.
    pub fn with_trend_thresholds(mut self, change_threshold: f64, volatility_threshold: f64) -> Self {
        self.change_threshold = change_threshold;
        self.volatility_threshold = volatility_threshold;
        self
    }

    pub fn total_revenue(&self) -> f64 {
        self.set.iter().fold(0.0, |acc, t| acc + t.price)
    }

    pub fn total_transactions(&self) -> usize {
        self.set.len()
    }

    pub fn average_transaction_value(&self) -> f64 {
        if self.set.is_empty() {
            0.0
        } else {
            self.total_revenue() / self.set.len() as f64
        }
    }

    /// Headline numbers as named scalars.
    pub fn scalar_metrics(&self) -> Vec<ScalarMetric> {
        vec![
            ScalarMetric {
                name: "total_revenue",
                value: self.total_revenue(),
            },
            ScalarMetric {
                name: "total_transactions",
                value: self.total_transactions() as f64,
            },
            ScalarMetric {
                name: "average_transaction_value",
                value: self.average_transaction_value(),
            },
        ]
    }

    pub fn summary(&self) -> SummaryMetrics {
        SummaryMetrics {
            total_revenue: self.total_revenue(),
            total_transactions: self.total_transactions(),
            average_transaction: self.average_transaction_value(),
            unique_products: self.set.products().len(),
            start_date: self.set.min_date(),
            end_date: self.set.max_date(),
        }
    }

    /// Top `n` products by units sold, or by row count when the source
    /// had no quantity column.
    pub fn best_selling_products(&self, n: usize) -> ProductRanking {
        let has_qty = self.set.has_qty();
        let mut entries = self.rank_products(|t| if has_qty { t.qty as f64 } else { 1.0 });
        entries.truncate(n);
        ProductRanking {
            metric: RankingMetric::Quantity,
            entries,
        }
    }

    /// Top `n` products by summed price.
    pub fn revenue_by_product(&self, n: usize) -> ProductRanking {
        let mut entries = self.rank_products(|t| t.price);
        entries.truncate(n);
        ProductRanking {
            metric: RankingMetric::Revenue,
            entries,
        }
    }

    pub fn sales_trend(&self, granularity: Granularity) -> TrendSeries {
        let (Some(first), Some(last)) = (self.set.min_date(), self.set.max_date()) else {
            return TrendSeries {
                granularity,
                points: Vec::new(),
            };
        };

        let origin = period_start(first, granularity);
        let mut points = Vec::new();
        let mut start = origin;
        while start <= last {
            let next = advance(start, granularity);
            points.push(TrendPoint {
                period_start: start,
                period_end: next.pred_opt().unwrap_or(start),
                revenue: 0.0,
            });
            start = next;
        }

        for t in self.set {
            let idx = bucket_index(origin, t.date, granularity);
            if let Some(point) = points.get_mut(idx) {
                point.revenue += t.price;
            }
        }

        TrendSeries {
            granularity,
            points,
        }
    }

    /// Compare the mean of the last `window` daily buckets with the
    /// `window` before them.
    pub fn trend_direction(&self, window: usize) -> TrendDirection {
        let daily: Vec<f64> = self
            .sales_trend(Granularity::Day)
            .points
            .iter()
            .map(|p| p.revenue)
            .collect();

        if window == 0 || daily.len() < window * 2 {
            return TrendDirection::insufficient();
        }

        let recent = &daily[daily.len() - window..];
        let previous = &daily[daily.len() - 2 * window..daily.len() - window];
        let recent_avg = mean(recent);
        let previous_avg = mean(previous);

        let change_percentage = if previous_avg == 0.0 {
            0.0
        } else {
            (recent_avg - previous_avg) / previous_avg * 100.0
        };

        let direction = if change_percentage > self.change_threshold {
            Direction::Up
        } else if change_percentage < -self.change_threshold {
            Direction::Down
        } else {
            Direction::Stable
        };

        let cv = coefficient_of_variation(&daily);
        let volatility = if cv > self.volatility_threshold {
            Volatility::High
        } else {
            Volatility::Normal
        };

        TrendDirection {
            direction,
            change_percentage,
            recent_avg,
            previous_avg,
            coefficient_of_variation: cv,
            volatility,
        }
    }

    pub fn day_of_week_profile(&self) -> DayOfWeekProfile {
        let mut sums = [0.0f64; 7];
        let mut counts = [0usize; 7];
        for t in self.set {
            let idx = t.date.weekday().num_days_from_monday() as usize;
            sums[idx] += t.price;
            counts[idx] += 1;
        }

        let days = (0..7)
            .filter(|&i| counts[i] > 0)
            .map(|i| DayStats {
                day: weekday_from_index(i),
                mean: sums[i] / counts[i] as f64,
                sum: sums[i],
                count: counts[i],
            })
            .collect();

        DayOfWeekProfile { days }
    }

    /// Products carrying `threshold` of revenue, exclusive of the product
    /// that crosses it.
    pub fn pareto_analysis(&self, threshold: f64) -> ParetoResult {
        let ranked = self.rank_products(|t| t.price);
        let total_products = ranked.len();
        let total = ranked.iter().fold(0.0, |acc, r| acc + r.value);

        let mut products = Vec::new();
        if total > 0.0 {
            let mut cumulative = 0.0;
            for entry in ranked {
                cumulative += entry.value;
                let share = cumulative / total;
                if share > threshold {
                    break;
                }
                products.push(ParetoEntry {
                    product: entry.product,
                    revenue: entry.value,
                    cumulative_revenue: cumulative,
                    cumulative_share: share,
                });
            }
        }

        let percentage_of_products = if total_products == 0 {
            0.0
        } else {
            products.len() as f64 / total_products as f64 * 100.0
        };

        tracing::debug!(
            products = products.len(),
            percentage = percentage_of_products,
            threshold,
            "Pareto analysis"
        );

        ParetoResult {
            threshold,
            products,
            total_products,
            percentage_of_products,
        }
    }

    /// Products idle for at least `days_threshold` days, measured against
    /// the latest date in the data. Longest idle first.
    pub fn slow_moving_products(&self, days_threshold: i64) -> SlowMovingList {
        let Some(now) = self.set.max_date() else {
            return SlowMovingList {
                days_threshold,
                products: Vec::new(),
            };
        };

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut last_sales: Vec<(&str, NaiveDate)> = Vec::new();
        for t in self.set {
            match index.get(t.product.as_str()) {
                Some(&i) => {
                    if t.date > last_sales[i].1 {
                        last_sales[i].1 = t.date;
                    }
                }
                None => {
                    index.insert(t.product.as_str(), last_sales.len());
                    last_sales.push((t.product.as_str(), t.date));
                }
            }
        }

        let mut products: Vec<SlowMovingProduct> = last_sales
            .into_iter()
            .map(|(product, last)| SlowMovingProduct {
                product: product.to_string(),
                last_sale_date: last,
                days_since_last_sale: (now - last).num_days(),
            })
            .filter(|p| p.days_since_last_sale >= days_threshold)
            .collect();
        products.sort_by(|a, b| b.days_since_last_sale.cmp(&a.days_since_last_sale));

        SlowMovingList {
            days_threshold,
            products,
        }
    }

    /// Sum `value` per product, then stable-sort descending.
    fn rank_products<F>(&self, value: F) -> Vec<RankedProduct>
    where
        F: Fn(&Transaction) -> f64,
    {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<RankedProduct> = Vec::new();
        for t in self.set {
            let v = value(t);
            match index.get(t.product.as_str()) {
                Some(&i) => entries[i].value += v,
                None => {
                    index.insert(t.product.as_str(), entries.len());
                    entries.push(RankedProduct {
                        product: t.product.clone(),
                        value: v,
                    });
                }
            }
        }
        entries.sort_by(|a, b| b.value.total_cmp(&a.value));
        entries
    }
}

// ── Calendar helpers ────────────────────────────────────────────────────────

fn period_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => date - Days::new(date.weekday().num_days_from_monday() as u64),
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

fn advance(start: NaiveDate, granularity: Granularity) -> NaiveDate {
    let next = match granularity {
        Granularity::Day => start.checked_add_days(Days::new(1)),
        Granularity::Week => start.checked_add_days(Days::new(7)),
        Granularity::Month => start.checked_add_months(Months::new(1)),
    };
    next.unwrap_or(NaiveDate::MAX)
}

fn bucket_index(origin: NaiveDate, date: NaiveDate, granularity: Granularity) -> usize {
    let idx = match granularity {
        Granularity::Day => (date - origin).num_days(),
        Granularity::Week => (date - origin).num_days() / 7,
        Granularity::Month => {
            (date.year() as i64 * 12 + date.month0() as i64)
                - (origin.year() as i64 * 12 + origin.month0() as i64)
        }
    };
    idx.max(0) as usize
}

fn weekday_from_index(i: usize) -> Weekday {
    match i {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

// ── Statistics ──────────────────────────────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().fold(0.0, |acc, v| acc + *v) / values.len() as f64
    }
}

fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt() / m * 100.0
}
