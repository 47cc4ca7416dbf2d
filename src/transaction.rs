//! Canonical sale lines and the immutable set the metrics read from.

use chrono::NaiveDate;
use serde::Serialize;

/// One canonical sale line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub product: String,
    pub price: f64,
    pub qty: u32,
    pub category: Option<String>,
    pub customer: Option<String>,
}

/// The deduplicated, fully normalized transactions of one upload.
///
/// Built once and never mutated; a new upload produces a new set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionSet {
    transactions: Vec<Transaction>,
    has_qty: bool,
    has_category: bool,
    has_customer: bool,
}

impl TransactionSet {
    pub fn new(
        transactions: Vec<Transaction>,
        has_qty: bool,
        has_category: bool,
        has_customer: bool,
    ) -> Self {
        Self {
            transactions,
            has_qty,
            has_category,
            has_customer,
        }
    }

    /// Same field layout, different rows.
    pub(crate) fn with_rows(&self, transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            has_qty: self.has_qty,
            has_category: self.has_category,
            has_customer: self.has_customer,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Whether the source carried a quantity column.
    pub fn has_qty(&self) -> bool {
        self.has_qty
    }

    pub fn has_category(&self) -> bool {
        self.has_category
    }

    pub fn has_customer(&self) -> bool {
        self.has_customer
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.iter().map(|t| t.date).min()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.iter().map(|t| t.date).max()
    }

    /// Distinct product names in first-seen order.
    pub fn products(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.iter()
            .map(|t| t.product.as_str())
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

impl<'a> IntoIterator for &'a TransactionSet {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}
