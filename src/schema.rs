//! Canonical schema for jitu-core.
//! Single source of truth for column names, header variations and the
//! fixed narrative tables, exported to Python via PyO3.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::JituError;

// ── Canonical columns ───────────────────────────────────────────────────────
pub mod columns {
    pub const DATE: &str = "date";
    pub const PRODUCT: &str = "product";
    pub const PRICE: &str = "price";
    pub const QTY: &str = "qty";
    pub const CATEGORY: &str = "category";
    pub const CUSTOMER: &str = "customer";

    pub const REQUIRED: [&str; 3] = [DATE, PRODUCT, PRICE];
}

// ── Metric output columns ───────────────────────────────────────────────────
pub mod metrics {
    pub const TOTAL_QTY: &str = "total_qty";
    pub const TOTAL_REVENUE: &str = "total_revenue";
    pub const REVENUE: &str = "revenue";
    pub const PERIOD_START: &str = "period_start";
    pub const PERIOD_END: &str = "period_end";
    pub const CUMULATIVE_REVENUE: &str = "cumulative_revenue";
    pub const CUMULATIVE_SHARE: &str = "cumulative_percentage";
    pub const DAY_OF_WEEK: &str = "day_of_week";
    pub const MEAN: &str = "mean";
    pub const SUM: &str = "sum";
    pub const COUNT: &str = "count";
    pub const LAST_SALE_DATE: &str = "last_sale_date";
    pub const DAYS_SINCE_LAST_SALE: &str = "days_since_last_sale";
}

// ── Canonical fields ────────────────────────────────────────────────────────

/// Standardized transaction attribute a raw header can be mapped onto.
///
/// Declaration order is the detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Date,
    Product,
    Price,
    Qty,
    Category,
    Customer,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::Date,
        CanonicalField::Product,
        CanonicalField::Price,
        CanonicalField::Qty,
        CanonicalField::Category,
        CanonicalField::Customer,
    ];

    pub const REQUIRED: [CanonicalField; 3] = [
        CanonicalField::Date,
        CanonicalField::Product,
        CanonicalField::Price,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Date => columns::DATE,
            CanonicalField::Product => columns::PRODUCT,
            CanonicalField::Price => columns::PRICE,
            CanonicalField::Qty => columns::QTY,
            CanonicalField::Category => columns::CATEGORY,
            CanonicalField::Customer => columns::CUSTOMER,
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    /// Coercion applied to this field during normalization.
    pub fn column_type(self) -> ColumnType {
        match self {
            CanonicalField::Date => ColumnType::Date,
            CanonicalField::Price => ColumnType::Currency,
            CanonicalField::Qty => ColumnType::Numeric,
            CanonicalField::Product | CanonicalField::Category | CanonicalField::Customer => {
                ColumnType::Text
            }
        }
    }

    /// Known lowercase header variations for this field.
    pub fn variations(self) -> &'static [&'static str] {
        match self {
            CanonicalField::Date => variations::DATE,
            CanonicalField::Product => variations::PRODUCT,
            CanonicalField::Price => variations::PRICE,
            CanonicalField::Qty => variations::QTY,
            CanonicalField::Category => variations::CATEGORY,
            CanonicalField::Customer => variations::CUSTOMER,
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = JituError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.as_str() == lowered)
            .ok_or_else(|| JituError::UnknownField(s.to_string()))
    }
}

/// Type tag selecting the coercion for a canonical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Currency,
    Date,
    Numeric,
    Text,
}

// ── Header variations ───────────────────────────────────────────────────────
pub mod variations {
    pub const DATE: &[&str] = &[
        "tgl",
        "tanggal",
        "date",
        "waktu",
        "time",
        "datetime",
        "tgl_transaksi",
        "tanggal_transaksi",
        "transaction_date",
        "tgl_jual",
        "tgl_beli",
        "created_at",
        "order_date",
    ];

    pub const PRODUCT: &[&str] = &[
        "nama",
        "produk",
        "item",
        "menu",
        "barang",
        "product",
        "nama_produk",
        "nama_barang",
        "product_name",
        "item_name",
        "sku",
        "deskripsi",
        "description",
    ];

    pub const PRICE: &[&str] = &[
        "harga",
        "price",
        "total",
        "bayar",
        "nilai",
        "rp",
        "amount",
        "hrg_jual",
        "harga_jual",
        "selling_price",
        "sale_price",
        "nominal",
        "jumlah_bayar",
        "total_harga",
        "subtotal",
    ];

    pub const QTY: &[&str] = &[
        "jumlah",
        "qty",
        "quantity",
        "pcs",
        "unit",
        "banyak",
        "jml",
        "kuantitas",
        "volume",
        "pieces",
    ];

    pub const CATEGORY: &[&str] = &[
        "kategori",
        "category",
        "jenis",
        "type",
        "group",
        "klasifikasi",
        "golongan",
    ];

    pub const CUSTOMER: &[&str] = &[
        "pelanggan",
        "customer",
        "pembeli",
        "buyer",
        "nama_pelanggan",
        "customer_name",
        "client",
    ];
}

// ── Currency magnitude suffixes ─────────────────────────────────────────────

/// Shorthand suffixes in precedence order, with the number of zeros each
/// one stands for. First substring match wins.
pub const MAGNITUDE_SUFFIXES: [(&str, i32); 9] = [
    ("ribu", 3),
    ("rb", 3),
    ("k", 3),
    ("juta", 6),
    ("jt", 6),
    ("million", 6),
    ("miliar", 9),
    ("milyar", 9),
    ("billion", 9),
];

// ── Month names ─────────────────────────────────────────────────────────────

/// Indonesian month tokens and the English name chrono understands.
pub const INDONESIAN_MONTHS: [(&str, &str); 16] = [
    ("januari", "january"),
    ("februari", "february"),
    ("pebruari", "february"),
    ("maret", "march"),
    ("mei", "may"),
    ("juni", "june"),
    ("juli", "july"),
    ("agustus", "august"),
    ("agu", "aug"),
    ("agt", "aug"),
    ("oktober", "october"),
    ("okt", "oct"),
    ("nopember", "november"),
    ("desember", "december"),
    ("des", "dec"),
    ("peb", "feb"),
];

// ── Weekday names ───────────────────────────────────────────────────────────
pub mod weekday {
    pub const ENGLISH: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];

    pub const INDONESIAN: [&str; 7] = [
        "Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip() {
        for field in CanonicalField::ALL {
            assert_eq!(field.as_str().parse::<CanonicalField>().unwrap(), field);
        }
        assert_eq!(" Price ".parse::<CanonicalField>().unwrap(), CanonicalField::Price);
        assert!("harga".parse::<CanonicalField>().is_err());
    }

    #[test]
    fn required_fields_are_date_product_price() {
        let required: Vec<&str> = CanonicalField::ALL
            .into_iter()
            .filter(|f| f.is_required())
            .map(CanonicalField::as_str)
            .collect();
        assert_eq!(required, columns::REQUIRED);
    }
}
