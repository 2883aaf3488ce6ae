//! Lele Krispy POS - headless cashier client core.
//!
//! Everything the mobile cashier UI needs behind the glass: the REST API
//! client, the authenticated session, catalog/supplier/history state, the
//! cart engine, the checkout draft state machine, history reconciliation,
//! payment-proof image preparation, and the public-spreadsheet catalog
//! import. No rendering and no navigation live here; hosts drive an
//! [`store::AppStore`] from UI events and read its state back.
//!
//! The backend has shipped two field-naming conventions over its lifetime
//! (`totalPrice` vs `totalprice`, `Isreturningcustomer` vs
//! `isreturningcustomer`, `items` vs `detail_transaction`). Records are
//! normalized into one canonical shape the moment they enter the crate;
//! nothing downstream ever looks at raw payload casing.

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod proof;
pub mod session;
pub mod sheet;
pub mod store;

pub use cart::{Cart, CartLine};
pub use catalog::{Product, Supplier};
pub use checkout::{CheckoutDraft, DraftLine, DraftStage, WireRevision};
pub use config::AppConfig;
pub use error::PosError;
pub use history::{DayGroup, Transaction, TransactionItem};
pub use session::SessionStore;
pub use store::AppStore;

/// First non-empty string under any of `keys`, trimmed.
pub(crate) fn value_str(v: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// First integer under any of `keys`. Accepts JSON numbers and numeric
/// strings; the backend is not consistent about which it sends.
pub(crate) fn value_i64(v: &serde_json::Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        match v.get(*key) {
            Some(serde_json::Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Some(i);
                }
                if let Some(f) = n.as_f64() {
                    return Some(f.round() as i64);
                }
            }
            Some(serde_json::Value::String(s)) => {
                if let Ok(i) = s.trim().parse::<i64>() {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// First boolean under any of `keys`. Accepts real booleans, 0/1 numbers,
/// and the usual string spellings.
pub(crate) fn value_bool(v: &serde_json::Value, keys: &[&str]) -> Option<bool> {
    for key in keys {
        match v.get(*key) {
            Some(serde_json::Value::Bool(b)) => return Some(*b),
            Some(serde_json::Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Some(i == 1);
                }
            }
            Some(serde_json::Value::String(s)) => {
                let lower = s.trim().to_ascii_lowercase();
                match lower.as_str() {
                    "true" | "1" | "yes" | "on" => return Some(true),
                    "false" | "0" | "no" | "off" => return Some(false),
                    _ => {}
                }
            }
            _ => {}
        }
    }
    None
}

/// First identifier under any of `keys`, canonicalised to its string form.
/// Backend ids arrive as JSON numbers or strings depending on the endpoint.
pub(crate) fn value_id(v: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match v.get(*key) {
            Some(serde_json::Value::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Some(serde_json::Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}
