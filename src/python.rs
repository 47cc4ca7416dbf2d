//! Python bindings around `SalesAnalyzer` and the module-level cleaners.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use pyo3::prelude::*;
use pyo3::types::{PyModule, PyString};
use pyo3_polars::PyDataFrame;

use crate::config::AnalysisConfig;
use crate::detector::{ColumnMapping, SchemaDetector};
use crate::error::JituError;
use crate::frames;
use crate::metrics::{Granularity, MetricsEngine};
use crate::normalizer;
use crate::pipeline::{self, PreparedData};
use crate::schema::{self, CanonicalField};
use crate::table::{RawTable, RawValue};

#[pyclass]
pub struct SalesAnalyzer {
    config: AnalysisConfig,
    prepared: Option<PreparedData>,
}

#[pymethods]
impl SalesAnalyzer {
    /// Config is read from `config_path` (TOML) if given, then `JITU_*`
    /// environment variables.
    #[new]
    #[pyo3(signature = (config_path=None))]
    fn new(config_path: Option<String>) -> PyResult<Self> {
        let path = config_path.map(PathBuf::from);
        let config = AnalysisConfig::load(path.as_deref())?;
        Ok(Self {
            config,
            prepared: None,
        })
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load an upload already decoded into a DataFrame.
    ///
    /// Headers are detected automatically; `mapping` (canonical field →
    /// source header) overrides individual detections. Returns the cleaned,
    /// deduplicated transactions.
    #[pyo3(signature = (df, mapping=None))]
    fn load(
        &mut self,
        df: PyDataFrame,
        mapping: Option<HashMap<String, String>>,
    ) -> PyResult<PyDataFrame> {
        let table = RawTable::from_frame(&df.0)?;
        let overrides = mapping
            .as_ref()
            .map(ColumnMapping::from_names)
            .transpose()?;

        let prepared = pipeline::prepare(&table, overrides.as_ref(), &self.config)?;
        let out = frames::transactions_frame(&prepared.transactions)?;
        self.prepared = Some(prepared);
        Ok(PyDataFrame(out))
    }

    /// Suggest a mapping for a list of headers without loading anything.
    #[staticmethod]
    #[pyo3(signature = (headers, allow_shared_headers=false))]
    fn detect_columns(headers: Vec<String>, allow_shared_headers: bool) -> HashMap<String, String> {
        mapping_to_names(&SchemaDetector::new(allow_shared_headers).detect(&headers))
    }

    // ── Metrics ─────────────────────────────────────────────────────────────

    #[pyo3(signature = (top_n=None))]
    fn best_selling_products(&self, top_n: Option<usize>) -> PyResult<PyDataFrame> {
        let prepared = self.prepared()?;
        let n = top_n.unwrap_or(self.config.top_n);
        let ranking = self.engine(prepared).best_selling_products(n);
        Ok(PyDataFrame(frames::ranking_frame(&ranking)?))
    }

    #[pyo3(signature = (top_n=None))]
    fn revenue_by_product(&self, top_n: Option<usize>) -> PyResult<PyDataFrame> {
        let prepared = self.prepared()?;
        let n = top_n.unwrap_or(self.config.top_n);
        let ranking = self.engine(prepared).revenue_by_product(n);
        Ok(PyDataFrame(frames::ranking_frame(&ranking)?))
    }

    /// `granularity`: "day", "week" or "month".
    #[pyo3(signature = (granularity="day"))]
    fn sales_trend(&self, granularity: &str) -> PyResult<PyDataFrame> {
        let prepared = self.prepared()?;
        let granularity: Granularity = granularity.parse()?;
        let series = self.engine(prepared).sales_trend(granularity);
        Ok(PyDataFrame(frames::trend_frame(&series)?))
    }

    /// Returns (direction, change_percentage, coefficient_of_variation).
    #[pyo3(signature = (window=None))]
    fn trend_direction(&self, window: Option<usize>) -> PyResult<(String, f64, f64)> {
        let prepared = self.prepared()?;
        let trend = self
            .engine(prepared)
            .trend_direction(window.unwrap_or(self.config.trend_window));
        Ok((
            trend.direction.to_string(),
            trend.change_percentage,
            trend.coefficient_of_variation,
        ))
    }

    fn day_of_week_analysis(&self) -> PyResult<PyDataFrame> {
        let prepared = self.prepared()?;
        let profile = self.engine(prepared).day_of_week_profile();
        Ok(PyDataFrame(frames::day_of_week_frame(&profile)?))
    }

    /// Returns (pareto products, percentage of all products).
    #[pyo3(signature = (threshold=None))]
    fn pareto_analysis(&self, threshold: Option<f64>) -> PyResult<(PyDataFrame, f64)> {
        let prepared = self.prepared()?;
        let pareto = self
            .engine(prepared)
            .pareto_analysis(threshold.unwrap_or(self.config.pareto_threshold));
        let df = frames::pareto_frame(&pareto)?;
        Ok((PyDataFrame(df), pareto.percentage_of_products))
    }

    #[pyo3(signature = (days_threshold=None))]
    fn slow_moving_products(&self, days_threshold: Option<i64>) -> PyResult<PyDataFrame> {
        let prepared = self.prepared()?;
        let slow = self
            .engine(prepared)
            .slow_moving_products(days_threshold.unwrap_or(self.config.slow_moving_days));
        Ok(PyDataFrame(frames::slow_moving_frame(&slow)?))
    }

    /// Full report (metrics, insights, recommendations) as JSON.
    fn report_json(&self) -> PyResult<String> {
        let prepared = self.prepared()?;
        let report = pipeline::build_report(&prepared.transactions, &self.config);
        Ok(report.to_json()?)
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn mapping(&self) -> Option<HashMap<String, String>> {
        self.prepared.as_ref().map(|p| mapping_to_names(&p.mapping))
    }

    #[getter]
    fn transactions_df(&self) -> PyResult<Option<PyDataFrame>> {
        self.prepared
            .as_ref()
            .map(|p| Ok(PyDataFrame(frames::transactions_frame(&p.transactions)?)))
            .transpose()
    }

    #[getter]
    fn dropped_rows(&self) -> usize {
        self.prepared.as_ref().map_or(0, |p| p.dropped_rows)
    }

    #[getter]
    fn duplicates_removed(&self) -> usize {
        self.prepared.as_ref().map_or(0, |p| p.duplicates_removed)
    }

    /// (score, level) of the last upload.
    #[getter]
    fn quality(&self) -> Option<(f64, String)> {
        self.prepared
            .as_ref()
            .map(|p| (p.quality.score, format!("{:?}", p.quality.level)))
    }

    #[getter]
    fn data_issues(&self) -> Vec<String> {
        self.prepared
            .as_ref()
            .map(|p| p.data_issues.clone())
            .unwrap_or_default()
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl SalesAnalyzer {
    fn prepared(&self) -> Result<&PreparedData, JituError> {
        self.prepared
            .as_ref()
            .ok_or_else(|| JituError::NotLoaded("transactions".into()))
    }

    fn engine<'a>(&self, prepared: &'a PreparedData) -> MetricsEngine<'a> {
        MetricsEngine::new(&prepared.transactions).with_trend_thresholds(
            self.config.trend_change_threshold,
            self.config.volatility_cv_threshold,
        )
    }
}

fn mapping_to_names(mapping: &ColumnMapping) -> HashMap<String, String> {
    mapping
        .iter()
        .map(|(field, header)| (field.as_str().to_string(), header.to_string()))
        .collect()
}

/// Python scalar → raw cell. Strings stay text so the cleaners see them as typed.
fn raw_value(value: &Bound<'_, PyAny>) -> PyResult<RawValue> {
    if value.is_none() {
        return Ok(RawValue::Blank);
    }
    if let Ok(s) = value.downcast::<PyString>() {
        return Ok(RawValue::Text(s.to_str()?.to_string()));
    }
    if let Ok(d) = value.extract::<NaiveDate>() {
        return Ok(RawValue::Date(d));
    }
    if let Ok(n) = value.extract::<f64>() {
        return Ok(RawValue::Number(n));
    }
    Ok(RawValue::Text(value.str()?.to_str()?.to_string()))
}

// ── Module functions ────────────────────────────────────────────────────────

/// Parse a rupiah amount ("Rp 15.000", "15rb", 15000). Unparsable → 0.0.
#[pyfunction]
fn clean_currency(value: &Bound<'_, PyAny>) -> PyResult<f64> {
    Ok(normalizer::clean_currency(&raw_value(value)?))
}

/// Parse a date, day-first. Unparsable → None.
#[pyfunction]
fn clean_date(value: &Bound<'_, PyAny>) -> PyResult<Option<NaiveDate>> {
    Ok(normalizer::clean_date(&raw_value(value)?))
}

#[pyfunction]
#[pyo3(name = "init_logging")]
fn py_init_logging() -> bool {
    crate::logging::init_logging()
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Canonical columns
    let columns = PyModule::new(m.py(), "columns")?;
    for field in CanonicalField::ALL {
        columns.add(&field.as_str().to_uppercase(), field.as_str())?;
    }
    columns.add("REQUIRED", schema::columns::REQUIRED.to_vec())?;
    m.add_submodule(&columns)?;

    // Metric output columns
    let metrics = PyModule::new(m.py(), "metrics")?;
    metrics.add("TOTAL_QTY", schema::metrics::TOTAL_QTY)?;
    metrics.add("TOTAL_REVENUE", schema::metrics::TOTAL_REVENUE)?;
    metrics.add("REVENUE", schema::metrics::REVENUE)?;
    metrics.add("PERIOD_START", schema::metrics::PERIOD_START)?;
    metrics.add("PERIOD_END", schema::metrics::PERIOD_END)?;
    metrics.add("CUMULATIVE_REVENUE", schema::metrics::CUMULATIVE_REVENUE)?;
    metrics.add("CUMULATIVE_SHARE", schema::metrics::CUMULATIVE_SHARE)?;
    metrics.add("DAY_OF_WEEK", schema::metrics::DAY_OF_WEEK)?;
    metrics.add("MEAN", schema::metrics::MEAN)?;
    metrics.add("SUM", schema::metrics::SUM)?;
    metrics.add("COUNT", schema::metrics::COUNT)?;
    metrics.add("LAST_SALE_DATE", schema::metrics::LAST_SALE_DATE)?;
    metrics.add(
        "DAYS_SINCE_LAST_SALE",
        schema::metrics::DAYS_SINCE_LAST_SALE,
    )?;
    m.add_submodule(&metrics)?;

    Ok(())
}

#[pymodule]
fn jitu_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<SalesAnalyzer>()?;
    m.add_function(wrap_pyfunction!(clean_currency, m)?)?;
    m.add_function(wrap_pyfunction!(clean_date, m)?)?;
    m.add_function(wrap_pyfunction!(py_init_logging, m)?)?;
    add_schema_exports(m)?;
    Ok(())
}
