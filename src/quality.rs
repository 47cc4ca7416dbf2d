//! Upload-level data quality checks over the raw table.

use std::collections::HashSet;

use serde::Serialize;

use crate::table::RawTable;

pub const DEFAULT_MIN_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLevel {
    fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            QualityLevel::Excellent
        } else if score >= 75.0 {
            QualityLevel::Good
        } else if score >= 60.0 {
            QualityLevel::Fair
        } else {
            QualityLevel::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub score: f64,
    pub level: QualityLevel,
    pub completeness: f64,
    pub uniqueness: f64,
    pub null_cells: usize,
    pub duplicate_rows: usize,
}

/// Problems that make the table unfit for analysis. Empty means usable.
pub fn validate_minimum_data(table: &RawTable, min_rows: usize) -> Vec<String> {
    let mut issues = Vec::new();

    if table.height() < min_rows {
        issues.push(format!(
            "Data terlalu sedikit. Minimal {min_rows} baris transaksi diperlukan, Anda memiliki {} baris.",
            table.height()
        ));
    }

    if table.is_empty() {
        issues.push("File tidak berisi data apapun.".to_string());
    } else if table.rows().iter().flatten().all(|v| v.is_blank()) {
        issues.push("Semua kolom kosong. Pastikan file berisi data yang valid.".to_string());
    }

    if !issues.is_empty() {
        tracing::warn!(issues = %issues.join("; "), "Minimum data validation failed");
    }
    issues
}

/// Weighted completeness (0.6) and row uniqueness (0.4), both in percent.
pub fn quality_score(table: &RawTable) -> QualityReport {
    let total_cells = table.height() * table.width();
    let null_cells = table
        .rows()
        .iter()
        .flatten()
        .filter(|v| v.is_blank())
        .count();

    let completeness = if total_cells == 0 {
        0.0
    } else {
        (total_cells - null_cells) as f64 / total_cells as f64 * 100.0
    };

    let mut seen = HashSet::with_capacity(table.height());
    let distinct = table
        .rows()
        .iter()
        .filter(|row| seen.insert(row.iter().map(|v| v.key()).collect::<Vec<_>>()))
        .count();
    let duplicate_rows = table.height() - distinct;

    let uniqueness = if table.height() == 0 {
        0.0
    } else {
        distinct as f64 / table.height() as f64 * 100.0
    };

    let score = 0.6 * completeness + 0.4 * uniqueness;

    QualityReport {
        score,
        level: QualityLevel::from_score(score),
        completeness,
        uniqueness,
        null_cells,
        duplicate_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawValue;

    fn table(rows: Vec<Vec<RawValue>>) -> RawTable {
        let mut t = RawTable::new(vec!["a".into(), "b".into()]);
        for row in rows {
            t.push_row(row);
        }
        t
    }

    #[test]
    fn flags_small_and_blank_tables() {
        let empty = table(vec![]);
        let issues = validate_minimum_data(&empty, DEFAULT_MIN_ROWS);
        assert_eq!(issues.len(), 2);

        let blank = table(vec![vec![RawValue::Blank, RawValue::Blank]]);
        let issues = validate_minimum_data(&blank, 1);
        assert_eq!(issues, vec!["Semua kolom kosong. Pastikan file berisi data yang valid."]);
    }

    #[test]
    fn enough_rows_pass() {
        let rows = (0..5)
            .map(|i| vec![RawValue::from(i as f64), RawValue::from("x")])
            .collect();
        assert!(validate_minimum_data(&table(rows), 5).is_empty());
    }

    #[test]
    fn score_weights_completeness_and_uniqueness() {
        let t = table(vec![
            vec![RawValue::from("x"), RawValue::from(1.0)],
            vec![RawValue::from("x"), RawValue::from(1.0)],
            vec![RawValue::from("y"), RawValue::Blank],
            vec![RawValue::from("z"), RawValue::from(2.0)],
        ]);
        let report = quality_score(&t);
        assert_eq!(report.null_cells, 1);
        assert_eq!(report.duplicate_rows, 1);
        assert_eq!(report.completeness, 87.5);
        assert_eq!(report.uniqueness, 75.0);
        assert!((report.score - 82.5).abs() < 1e-9);
        assert_eq!(report.level, QualityLevel::Good);
    }

    #[test]
    fn empty_table_is_poor() {
        let report = quality_score(&table(vec![]));
        assert_eq!(report.score, 0.0);
        assert_eq!(report.level, QualityLevel::Poor);
    }
}
