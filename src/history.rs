//! Transaction history: normalization and per-day grouping.
//!
//! History records are the worst offenders of the backend's two naming
//! conventions: `totalPrice`/`totalprice`, `Isreturningcustomer`/
//! `isreturningcustomer`, and item lists that arrive under `items` or
//! `detail_transaction`, sometimes as a JSON array and sometimes as a
//! string containing JSON. [`Transaction::from_value`] flattens all of it
//! into one canonical record; the canonical spelling wins when a record
//! carries both.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::format::format_date_long;
use crate::{value_bool, value_i64, value_id, value_str};

// ---------------------------------------------------------------------------
// Canonical records
// ---------------------------------------------------------------------------

/// One sold line inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    /// Backend product id. `None` when the item predates product ids or
    /// was sold from a sheet-imported product that never got one.
    pub product_id: Option<i64>,
    pub quantity: i64,
    pub item: String,
    pub price: i64,
}

/// One completed sale, in the single shape the rest of the crate uses.
/// Serialization emits the canonical wire spellings, so a serialized
/// record normalizes back to itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<String>,
    #[serde(rename = "branchName")]
    pub branch_name: String,
    #[serde(rename = "totalPrice")]
    pub total_price: i64,
    #[serde(rename = "Isreturningcustomer")]
    pub is_returning_customer: bool,
    /// Raw backend timestamp string, kept verbatim for re-parsing.
    pub timestamp: Option<String>,
    #[serde(rename = "customerName")]
    pub customer_name: Option<String>,
    pub payment_proof: Option<String>,
    pub items: Vec<TransactionItem>,
}

impl Transaction {
    /// Builds a canonical transaction from a raw backend record. The
    /// canonical field name is consulted first, then its legacy spelling.
    pub fn from_value(raw: &Value) -> Self {
        Self {
            id: value_id(raw, &["id", "Id"]),
            branch_name: value_str(raw, &["branchName", "branchname"]).unwrap_or_default(),
            total_price: value_i64(raw, &["totalPrice", "totalprice"]).unwrap_or(0),
            is_returning_customer: value_bool(
                raw,
                &["Isreturningcustomer", "isReturningCustomer", "isreturningcustomer"],
            )
            .unwrap_or(false),
            timestamp: value_str(raw, &["timestamp", "Timestamp"]),
            customer_name: value_str(raw, &["customerName", "customername"]),
            payment_proof: value_str(raw, &["payment_proof", "paymentProof"]),
            items: normalize_items(raw),
        }
    }

    /// Timestamp parsed into calendar components, or `None` when it is
    /// missing or unreadable.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

pub fn normalize_transactions(raw: &Value) -> Vec<Transaction> {
    match raw.as_array() {
        Some(entries) => entries.iter().map(Transaction::from_value).collect(),
        None => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Item containers
// ---------------------------------------------------------------------------

/// Pulls the item list out of whichever container the record uses.
/// `detail_transaction` wins when present and non-null; string containers
/// are parsed as JSON and dropped (empty list) when they do not parse.
fn normalize_items(raw: &Value) -> Vec<TransactionItem> {
    let container = match raw.get("detail_transaction") {
        Some(v) if !v.is_null() => v,
        _ => match raw.get("items") {
            Some(v) => v,
            None => return Vec::new(),
        },
    };

    let entries: Vec<Value> = match container {
        Value::Array(arr) => arr.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(arr)) => arr,
            Ok(_) | Err(_) => {
                debug!("discarding unparseable item container");
                return Vec::new();
            }
        },
        _ => return Vec::new(),
    };

    entries
        .iter()
        .map(|entry| TransactionItem {
            product_id: value_i64(entry, &["product_id", "id"]),
            quantity: value_i64(entry, &["quantity", "Quantity"]).unwrap_or(0),
            item: value_str(entry, &["item", "Item"]).unwrap_or_else(|| "Item".to_string()),
            price: value_i64(entry, &["price", "Price"]).unwrap_or(0),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Transactions whose raw timestamp starts with the given ISO date
/// (`YYYY-MM-DD`). A plain prefix match on the stored string; records
/// without a timestamp never match.
pub fn filter_by_date(transactions: &[Transaction], iso_date: &str) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| {
            t.timestamp
                .as_deref()
                .is_some_and(|ts| ts.starts_with(iso_date))
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Day grouping
// ---------------------------------------------------------------------------

/// All transactions that fell on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    /// Indonesian long date, e.g. "25 Agustus 2026".
    pub label: String,
    pub transactions: Vec<Transaction>,
    /// Sum of `total_price` across the day's transactions.
    pub subtotal: i64,
}

/// Groups transactions by the calendar date written in their timestamp,
/// preserving the first-seen order of both days and the transactions
/// within a day. Transactions with a missing or unreadable timestamp are
/// left out entirely; they have no day to live under.
pub fn group_by_day(transactions: &[Transaction]) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for tx in transactions {
        let Some(parsed) = tx.parsed_timestamp() else {
            debug!(id = ?tx.id, "skipping transaction without a usable timestamp");
            continue;
        };
        let date = parsed.date();
        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => {
                group.subtotal += tx.total_price;
                group.transactions.push(tx.clone());
            }
            None => groups.push(DayGroup {
                date,
                label: format_date_long(date),
                subtotal: tx.total_price,
                transactions: vec![tx.clone()],
            }),
        }
    }
    groups
}

/// Parses the backend's timestamp spellings. Offsets are kept as written,
/// not converted: a sale rung up at 01:00 Jakarta time belongs to that
/// date even though it is still the previous evening in UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    None
}
