//! Priority-ordered recommendations drawn from classified insights.

use serde::Serialize;

use crate::insights::{Insight, InsightCategory, Severity};

pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 5;

/// High-priority triggers, checked in this order.
const PRIORITY_RULES: [(InsightCategory, Severity, &str); 3] = [
    (
        InsightCategory::Trend,
        Severity::Danger,
        "PRIORITAS TINGGI: Segera evaluasi strategi penjualan karena tren menurun.",
    ),
    (
        InsightCategory::Pareto,
        Severity::Warning,
        "Kurangi variasi produk dan fokus pada produk yang benar-benar menguntungkan.",
    ),
    (
        InsightCategory::SlowProducts,
        Severity::Warning,
        "Buat program clearance sale untuk produk yang tidak laku.",
    ),
];

const GENERIC: [&str; 3] = [
    "Pantau data penjualan secara rutin minimal seminggu sekali.",
    "Pastikan produk terlaris selalu tersedia stoknya.",
    "Gunakan data ini untuk negosiasi dengan supplier.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub text: String,
}

/// Priority items for triggered rules, then the generic list, capped at
/// `max`. Generic items are cut first.
pub fn recommend(insights: &[Insight], max: usize) -> Vec<Recommendation> {
    let triggered = |category: InsightCategory, severity: Severity| {
        insights
            .iter()
            .any(|i| i.category == category && i.severity == severity)
    };

    let priority = PRIORITY_RULES
        .iter()
        .filter(|(category, severity, _)| triggered(*category, *severity))
        .map(|(_, _, text)| Recommendation {
            priority: Priority::High,
            text: text.to_string(),
        });

    let generic = GENERIC.iter().map(|text| Recommendation {
        priority: Priority::General,
        text: text.to_string(),
    });

    priority.chain(generic).take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insight(category: InsightCategory, severity: Severity) -> Insight {
        Insight {
            category,
            severity,
            title: String::new(),
            message: String::new(),
        }
    }

    #[test]
    fn generic_only_when_nothing_triggers() {
        let recs = recommend(
            &[insight(InsightCategory::Trend, Severity::Success)],
            DEFAULT_MAX_RECOMMENDATIONS,
        );
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.priority == Priority::General));
    }

    #[test]
    fn priority_order_is_fixed() {
        let insights = [
            insight(InsightCategory::SlowProducts, Severity::Warning),
            insight(InsightCategory::Pareto, Severity::Warning),
            insight(InsightCategory::Trend, Severity::Danger),
        ];
        let recs = recommend(&insights, DEFAULT_MAX_RECOMMENDATIONS);
        assert_eq!(recs.len(), 5);
        assert!(recs[0].text.starts_with("PRIORITAS TINGGI"));
        assert!(recs[1].text.starts_with("Kurangi variasi"));
        assert!(recs[2].text.starts_with("Buat program clearance"));
        assert_eq!(recs[3].text, GENERIC[0]);
        assert_eq!(recs[4].text, GENERIC[1]);
    }

    #[test]
    fn truncation_keeps_priority_items() {
        let insights = [
            insight(InsightCategory::Trend, Severity::Danger),
            insight(InsightCategory::SlowProducts, Severity::Warning),
        ];
        let recs = recommend(&insights, 2);
        assert!(recs.iter().all(|r| r.priority == Priority::High));
    }
}
