//! Polars views of transactions and metric results, for hosts that work in
//! DataFrames.

use polars::prelude::*;

use crate::error::Result;
use crate::metrics::{
    DayOfWeekProfile, ParetoResult, ProductRanking, RankingMetric, SlowMovingList, TrendSeries,
};
use crate::schema::{columns, metrics};
use crate::transaction::TransactionSet;

/// Canonical columns; optional ones only when the source had them.
pub fn transactions_frame(set: &TransactionSet) -> Result<DataFrame> {
    let mut cols: Vec<Column> = vec![
        Column::new(
            columns::DATE.into(),
            set.iter().map(|t| t.date).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::PRODUCT.into(),
            set.iter().map(|t| t.product.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::PRICE.into(),
            set.iter().map(|t| t.price).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::QTY.into(),
            set.iter().map(|t| t.qty).collect::<Vec<_>>(),
        ),
    ];

    if set.has_category() {
        cols.push(Column::new(
            columns::CATEGORY.into(),
            set.iter().map(|t| t.category.as_deref()).collect::<Vec<_>>(),
        ));
    }
    if set.has_customer() {
        cols.push(Column::new(
            columns::CUSTOMER.into(),
            set.iter().map(|t| t.customer.as_deref()).collect::<Vec<_>>(),
        ));
    }

    Ok(DataFrame::new(cols)?)
}

pub fn ranking_frame(ranking: &ProductRanking) -> Result<DataFrame> {
    let value_col = match ranking.metric {
        RankingMetric::Quantity => metrics::TOTAL_QTY,
        RankingMetric::Revenue => metrics::TOTAL_REVENUE,
    };
    let df = DataFrame::new(vec![
        Column::new(
            columns::PRODUCT.into(),
            ranking
                .entries
                .iter()
                .map(|e| e.product.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            value_col.into(),
            ranking.entries.iter().map(|e| e.value).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

pub fn trend_frame(series: &TrendSeries) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(
            metrics::PERIOD_START.into(),
            series
                .points
                .iter()
                .map(|p| p.period_start)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::PERIOD_END.into(),
            series.points.iter().map(|p| p.period_end).collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::REVENUE.into(),
            series.points.iter().map(|p| p.revenue).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

pub fn day_of_week_frame(profile: &DayOfWeekProfile) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(
            metrics::DAY_OF_WEEK.into(),
            profile.days.iter().map(|d| d.name()).collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::MEAN.into(),
            profile.days.iter().map(|d| d.mean).collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::SUM.into(),
            profile.days.iter().map(|d| d.sum).collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::COUNT.into(),
            profile
                .days
                .iter()
                .map(|d| d.count as u64)
                .collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

/// Pareto set with cumulative share in percent.
pub fn pareto_frame(pareto: &ParetoResult) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(
            columns::PRODUCT.into(),
            pareto
                .products
                .iter()
                .map(|p| p.product.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::TOTAL_REVENUE.into(),
            pareto.products.iter().map(|p| p.revenue).collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::CUMULATIVE_REVENUE.into(),
            pareto
                .products
                .iter()
                .map(|p| p.cumulative_revenue)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::CUMULATIVE_SHARE.into(),
            pareto
                .products
                .iter()
                .map(|p| p.cumulative_share * 100.0)
                .collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

pub fn slow_moving_frame(slow: &SlowMovingList) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(
            columns::PRODUCT.into(),
            slow.products
                .iter()
                .map(|p| p.product.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::LAST_SALE_DATE.into(),
            slow.products
                .iter()
                .map(|p| p.last_sale_date)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            metrics::DAYS_SINCE_LAST_SALE.into(),
            slow.products
                .iter()
                .map(|p| p.days_since_last_sale)
                .collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}
