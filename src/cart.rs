//! In-memory cart engine.
//!
//! Lines are keyed by product id, and two lines never share one: adding a
//! product that is already in the cart bumps its quantity instead. The
//! total is never stored; it is recomputed from the lines on every read so
//! it cannot drift from them.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// One cart line: a product and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    /// Epoch milliseconds of the first add, kept for display ordering.
    pub added_at: i64,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.product.price * i64::from(self.quantity)
    }
}

/// The active order being rung up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of every line total, in whole rupiah.
    pub fn total(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Adds one unit of `product`. Merges into the existing line when a
    /// line with the same product id is present, otherwise appends a new
    /// line at the end. Two id-less products count as the same product.
    pub fn add_product(&mut self, product: Product) {
        match self.lines.iter_mut().find(|l| l.product.id == product.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine {
                product,
                quantity: 1,
                added_at: now_ms(),
            }),
        }
    }

    /// Applies `delta` to the quantity of the line holding `product_id`.
    /// Dropping to zero or below removes the line. Unknown ids are a no-op.
    pub fn change_quantity(&mut self, product_id: Option<&str>, delta: i64) {
        let Some(idx) = self
            .lines
            .iter()
            .position(|l| l.product.id.as_deref() == product_id)
        else {
            return;
        };
        let next = i64::from(self.lines[idx].quantity).saturating_add(delta);
        if next <= 0 {
            self.lines.remove(idx);
        } else {
            self.lines[idx].quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }
    }

    /// Removes the line holding `product_id` outright.
    pub fn remove_line(&mut self, product_id: Option<&str>) {
        self.lines
            .retain(|l| l.product.id.as_deref() != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
