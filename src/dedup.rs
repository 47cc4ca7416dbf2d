//! Exact-duplicate removal over cleaned transactions, first occurrence kept.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::transaction::{Transaction, TransactionSet};

/// Identity of a transaction across every canonical field.
#[derive(Debug, PartialEq, Eq, Hash)]
struct RowKey<'a> {
    date: NaiveDate,
    product: &'a str,
    price: u64,
    qty: u32,
    category: Option<&'a str>,
    customer: Option<&'a str>,
}

impl<'a> From<&'a Transaction> for RowKey<'a> {
    fn from(t: &'a Transaction) -> Self {
        Self {
            date: t.date,
            product: &t.product,
            // -0.0 and 0.0 are the same price
            price: (t.price + 0.0).to_bits(),
            qty: t.qty,
            category: t.category.as_deref(),
            customer: t.customer.as_deref(),
        }
    }
}

/// Result of a deduplication pass.
#[derive(Debug, Clone)]
pub struct Deduplicated {
    pub transactions: TransactionSet,
    pub removed: usize,
}

/// Drop rows identical across all canonical fields, keeping the first
/// occurrence in original order.
pub fn deduplicate(set: &TransactionSet) -> Deduplicated {
    let mut seen: HashSet<RowKey<'_>> = HashSet::with_capacity(set.len());
    let kept: Vec<Transaction> = set
        .iter()
        .filter(|t| seen.insert(RowKey::from(*t)))
        .cloned()
        .collect();

    let removed = set.len() - kept.len();
    if removed > 0 {
        tracing::info!(removed, "Removed duplicate rows");
    }

    Deduplicated {
        transactions: set.with_rows(kept),
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(day: u32, product: &str, price: f64) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            product: product.to_string(),
            price,
            qty: 1,
            category: None,
            customer: None,
        }
    }

    #[test]
    fn keeps_first_occurrence_in_order() {
        let set = TransactionSet::new(
            vec![
                tx(1, "Kopi", 10000.0),
                tx(1, "Teh", 5000.0),
                tx(1, "Kopi", 10000.0),
                tx(2, "Kopi", 10000.0),
            ],
            false,
            false,
            false,
        );

        let out = deduplicate(&set);
        assert_eq!(out.removed, 1);
        let products: Vec<_> = out
            .transactions
            .iter()
            .map(|t| (t.date.format("%d").to_string(), t.product.as_str()))
            .collect();
        assert_eq!(
            products,
            vec![
                ("01".to_string(), "Kopi"),
                ("01".to_string(), "Teh"),
                ("02".to_string(), "Kopi")
            ]
        );
    }

    #[test]
    fn optional_fields_take_part_in_identity() {
        let mut a = tx(1, "Kopi", 10000.0);
        let mut b = a.clone();
        a.customer = Some("Budi".into());
        b.customer = Some("Sari".into());
        let set = TransactionSet::new(vec![a, b], false, false, true);
        assert_eq!(deduplicate(&set).removed, 0);
    }

    #[test]
    fn second_pass_removes_nothing() {
        let set = TransactionSet::new(
            vec![tx(1, "Kopi", 1.0), tx(1, "Kopi", 1.0), tx(1, "Kopi", 1.0)],
            false,
            false,
            false,
        );
        let first = deduplicate(&set);
        assert_eq!(first.removed, 2);
        let second = deduplicate(&first.transactions);
        assert_eq!(second.removed, 0);
        assert_eq!(second.transactions.len(), 1);
    }
}
