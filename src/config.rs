//! Analysis tunables, loaded with Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Optional TOML file
//! 3. Environment variables (`JITU_*`, e.g. `JITU_TOP_N=10`)

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{JituError, Result};
use crate::insights::{DEFAULT_PARETO_INFO_MAX_PCT, DEFAULT_PARETO_SUCCESS_MAX_PCT};
use crate::metrics::{DEFAULT_TREND_CHANGE_THRESHOLD, DEFAULT_VOLATILITY_CV_THRESHOLD};
use crate::quality::DEFAULT_MIN_ROWS;
use crate::recommendations::DEFAULT_MAX_RECOMMENDATIONS;

pub const ENV_PREFIX: &str = "JITU_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Entries kept in product rankings.
    pub top_n: usize,
    /// Daily buckets per side of the trend comparison.
    pub trend_window: usize,
    pub trend_change_threshold: f64,
    pub volatility_cv_threshold: f64,
    /// Cumulative revenue share defining the Pareto set, in (0, 1].
    pub pareto_threshold: f64,
    pub pareto_success_max_pct: f64,
    pub pareto_info_max_pct: f64,
    pub slow_moving_days: i64,
    pub min_rows: usize,
    pub max_recommendations: usize,
    pub allow_shared_headers: bool,
    pub standardize_product_names: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            trend_window: 3,
            trend_change_threshold: DEFAULT_TREND_CHANGE_THRESHOLD,
            volatility_cv_threshold: DEFAULT_VOLATILITY_CV_THRESHOLD,
            pareto_threshold: 0.8,
            pareto_success_max_pct: DEFAULT_PARETO_SUCCESS_MAX_PCT,
            pareto_info_max_pct: DEFAULT_PARETO_INFO_MAX_PCT,
            slow_moving_days: 14,
            min_rows: DEFAULT_MIN_ROWS,
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            allow_shared_headers: false,
            standardize_product_names: false,
        }
    }
}

impl AnalysisConfig {
    /// Defaults, then `path` if given, then `JITU_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            tracing::debug!("Loading analysis config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with a single TOML file, ignoring the environment.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trend_window == 0 {
            return Err(JituError::Validation(
                "trend_window must be at least 1".to_string(),
            ));
        }
        if !(self.pareto_threshold > 0.0 && self.pareto_threshold <= 1.0) {
            return Err(JituError::Validation(format!(
                "pareto_threshold must be in (0, 1], got {}",
                self.pareto_threshold
            )));
        }
        if self.max_recommendations == 0 {
            return Err(JituError::Validation(
                "max_recommendations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_n, 5);
        assert_eq!(config.slow_moving_days, 14);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "top_n = 10\npareto_threshold = 0.7").unwrap();

        let config = AnalysisConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.top_n, 10);
        assert_eq!(config.pareto_threshold, 0.7);
        assert_eq!(config.trend_window, 3);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pareto_threshold = 1.5").unwrap();
        assert!(matches!(
            AnalysisConfig::load_from_file(file.path()),
            Err(JituError::Validation(_))
        ));

        let config = AnalysisConfig {
            trend_window: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "top_n = \"many\"").unwrap();
        assert!(matches!(
            AnalysisConfig::load_from_file(file.path()),
            Err(JituError::Config(_))
        ));
    }
}
