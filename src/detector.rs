//! Heuristic mapping of arbitrary raw headers onto the canonical schema.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{JituError, Result};
use crate::schema::CanonicalField;

/// Canonical field → source header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(BTreeMap<CanonicalField, String>);

impl ColumnMapping {
    pub fn insert(&mut self, field: CanonicalField, header: impl Into<String>) {
        self.0.insert(field, header.into());
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in canonical field order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.0.iter().map(|(f, h)| (*f, h.as_str()))
    }

    /// Required fields this mapping lacks, in canonical order.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .into_iter()
            .filter(|f| !self.contains(*f))
            .collect()
    }

    /// Reject the mapping unless date, product and price are all present.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            tracing::warn!(missing = ?missing, "Missing required columns");
            Err(JituError::MissingRequiredColumns(missing))
        }
    }

    /// Build a mapping from a plain `field name → header` map, as supplied
    /// by a caller overriding detection.
    pub fn from_names(names: &HashMap<String, String>) -> Result<Self> {
        let mut mapping = ColumnMapping::default();
        for (field, header) in names {
            mapping.insert(field.parse()?, header.clone());
        }
        Ok(mapping)
    }

    /// Overlay `overrides` on top of this mapping.
    pub fn merged_with(&self, overrides: &ColumnMapping) -> ColumnMapping {
        let mut merged = self.clone();
        for (field, header) in overrides.iter() {
            merged.insert(field, header);
        }
        merged
    }
}

/// Detects which raw headers carry which canonical fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaDetector {
    /// Let one header satisfy several fields. Off by default: a header
    /// claimed by an earlier field is skipped for later ones.
    pub allow_shared_headers: bool,
}

impl SchemaDetector {
    pub fn new(allow_shared_headers: bool) -> Self {
        Self {
            allow_shared_headers,
        }
    }

    /// Scan fields in canonical order; for each, assign the first header
    /// (in original order) that bidirectionally matches any variation.
    pub fn detect<S: AsRef<str>>(&self, headers: &[S]) -> ColumnMapping {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();

        let mut mapping = ColumnMapping::default();
        let mut claimed: HashSet<usize> = HashSet::new();

        for field in CanonicalField::ALL {
            let hit = normalized.iter().enumerate().find(|(idx, header)| {
                if !self.allow_shared_headers && claimed.contains(idx) {
                    return false;
                }
                matches_any(header, field.variations())
            });

            if let Some((idx, _)) = hit {
                mapping.insert(field, headers[idx].as_ref());
                claimed.insert(idx);
            }
        }

        tracing::info!(mapping = ?mapping, "Detected column mapping");
        mapping
    }
}

/// Header contains a variation, or a variation contains the header.
fn matches_any(header: &str, variations: &[&str]) -> bool {
    if header.is_empty() {
        return false;
    }
    variations
        .iter()
        .any(|v| header.contains(v) || v.contains(header))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_indonesian_headers() {
        let headers = ["Tgl Transaksi", "Nama Produk", "Harga Jual", "Jumlah"];
        let mapping = SchemaDetector::default().detect(&headers);

        assert_eq!(mapping.get(CanonicalField::Date), Some("Tgl Transaksi"));
        assert_eq!(mapping.get(CanonicalField::Product), Some("Nama Produk"));
        assert_eq!(mapping.get(CanonicalField::Price), Some("Harga Jual"));
        assert_eq!(mapping.get(CanonicalField::Qty), Some("Jumlah"));
        assert!(!mapping.contains(CanonicalField::Category));
        assert!(mapping.validate().is_ok());
    }

    #[test]
    fn reverse_containment_matches_short_headers() {
        // "qt" is contained in the "qty" variation.
        let mapping = SchemaDetector::default().detect(&["Tanggal", "Item", "Nilai", "QT"]);
        assert_eq!(mapping.get(CanonicalField::Qty), Some("QT"));
    }

    #[test]
    fn first_header_in_original_order_wins() {
        let mapping = SchemaDetector::default().detect(&["Total", "Harga", "Tanggal", "Menu"]);
        assert_eq!(mapping.get(CanonicalField::Price), Some("Total"));
    }

    #[test]
    fn claimed_headers_are_not_reused_by_default() {
        // "nama pelanggan" matches both product ("nama") and customer.
        let headers = ["Tanggal", "Nama Pelanggan", "Harga"];

        let exclusive = SchemaDetector::default().detect(&headers);
        assert_eq!(exclusive.get(CanonicalField::Product), Some("Nama Pelanggan"));
        assert!(!exclusive.contains(CanonicalField::Customer));

        let shared = SchemaDetector::new(true).detect(&headers);
        assert_eq!(shared.get(CanonicalField::Product), Some("Nama Pelanggan"));
        assert_eq!(shared.get(CanonicalField::Customer), Some("Nama Pelanggan"));
    }

    #[test]
    fn blank_headers_never_match() {
        let mapping = SchemaDetector::default().detect(&["", "   "]);
        assert!(mapping.is_empty());
    }

    #[test]
    fn validation_names_missing_fields() {
        let mapping = SchemaDetector::default().detect(&["Tanggal", "Keterangan"]);
        match mapping.validate() {
            Err(JituError::MissingRequiredColumns(missing)) => {
                assert_eq!(missing, vec![CanonicalField::Product, CanonicalField::Price]);
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn override_names_are_parsed() {
        let names = HashMap::from([
            ("date".to_string(), "Waktu".to_string()),
            ("product".to_string(), "Barang".to_string()),
            ("price".to_string(), "Bayar".to_string()),
        ]);
        let mapping = ColumnMapping::from_names(&names).unwrap();
        assert!(mapping.validate().is_ok());

        let bad = HashMap::from([("harga".to_string(), "Bayar".to_string())]);
        assert!(matches!(
            ColumnMapping::from_names(&bad),
            Err(JituError::UnknownField(_))
        ));
    }
}
