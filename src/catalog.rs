//! Canonical catalog records and their normalization boundary.
//!
//! Products and suppliers arrive from `/products` and `/supplies` as loose
//! JSON; everything is funnelled through [`Product::from_value`] /
//! [`Supplier::from_value`] so the rest of the crate only ever sees one
//! shape. Ids are kept as strings because the backend switches between
//! numeric and string ids, and the sheet import mints its own `prod-N` ids
//! that are not numeric at all.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{value_i64, value_id, value_str};

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// One sellable item. `price` is whole rupiah; the currency has no cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub item: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
}

impl Product {
    /// Builds a product from a raw backend record, defaulting anything
    /// missing rather than failing the whole list.
    pub fn from_value(raw: &Value) -> Self {
        Self {
            id: value_id(raw, &["id", "Id"]),
            item: value_str(raw, &["item", "Item"]).unwrap_or_default(),
            description: value_str(raw, &["description", "Description"]).unwrap_or_default(),
            price: value_i64(raw, &["price", "Price"]).unwrap_or(0),
        }
    }

    /// Request body for create/update. The id rides along on updates only,
    /// restored to a JSON number when it still is one.
    pub fn save_payload(&self) -> Value {
        let mut body = json!({
            "item": self.item,
            "description": self.description,
            "price": self.price,
        });
        if let Some(id) = &self.id {
            body["id"] = id_value(id);
        }
        body
    }
}

/// Turns a raw list response into products, skipping nothing: a malformed
/// entry becomes a defaulted record instead of poisoning the list.
pub fn normalize_products(raw: &Value) -> Vec<Product> {
    match raw.as_array() {
        Some(entries) => entries.iter().map(Product::from_value).collect(),
        None => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

/// One supply source, tracked by name and the unit it sells in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub unit: String,
}

impl Supplier {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            id: value_id(raw, &["id", "Id"]),
            name: value_str(raw, &["name", "Name"]).unwrap_or_default(),
            unit: value_str(raw, &["unit", "Unit"]).unwrap_or_default(),
        }
    }

    pub fn save_payload(&self) -> Value {
        let mut body = json!({
            "name": self.name,
            "unit": self.unit,
        });
        if let Some(id) = &self.id {
            body["id"] = id_value(id);
        }
        body
    }
}

pub fn normalize_suppliers(raw: &Value) -> Vec<Supplier> {
    match raw.as_array() {
        Some(entries) => entries.iter().map(Supplier::from_value).collect(),
        None => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Backend ids are numbers unless they were minted locally; send back the
/// form the backend recognises.
pub(crate) fn id_value(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) => json!(n),
        Err(_) => json!(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_from_value_canonicalises_loose_records() {
        let raw = json!({ "id": 7, "item": " Lele Krispy ", "price": "15000" });
        let p = Product::from_value(&raw);
        assert_eq!(p.id, Some("7".to_string()));
        assert_eq!(p.item, "Lele Krispy");
        assert_eq!(p.description, "");
        assert_eq!(p.price, 15000);
    }

    #[test]
    fn product_from_value_defaults_missing_fields() {
        let p = Product::from_value(&json!({}));
        assert_eq!(p.id, None);
        assert_eq!(p.item, "");
        assert_eq!(p.price, 0);
    }

    #[test]
    fn save_payload_omits_id_on_create() {
        let p = Product {
            id: None,
            item: "Lele Krispy".to_string(),
            description: "Porsi".to_string(),
            price: 15000,
        };
        let body = p.save_payload();
        assert!(body.get("id").is_none());
        assert_eq!(body["item"], "Lele Krispy");
        assert_eq!(body["price"], 15000);
    }

    #[test]
    fn save_payload_restores_numeric_id_on_update() {
        let p = Product {
            id: Some("7".to_string()),
            item: "Lele Krispy".to_string(),
            description: String::new(),
            price: 15000,
        };
        assert_eq!(p.save_payload()["id"], json!(7));

        let sheet_born = Product {
            id: Some("prod-3".to_string()),
            item: "Es Teh".to_string(),
            description: String::new(),
            price: 5000,
        };
        assert_eq!(sheet_born.save_payload()["id"], json!("prod-3"));
    }

    #[test]
    fn normalize_products_tolerates_non_array_payloads() {
        assert!(normalize_products(&json!(null)).is_empty());
        assert!(normalize_products(&json!({ "rows": [] })).is_empty());
        let two = normalize_products(&json!([{ "item": "A", "price": 1 }, {}]));
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn supplier_round_trips_through_payload() {
        let raw = json!({ "Id": "12", "name": "Pak Budi", "unit": "kg" });
        let s = Supplier::from_value(&raw);
        assert_eq!(s.id, Some("12".to_string()));
        assert_eq!(s.name, "Pak Budi");
        assert_eq!(s.unit, "kg");
        assert_eq!(s.save_payload()["id"], json!(12));
    }
}
