//! Checkout and edit drafts.
//!
//! A draft is the staging area between the cart and the backend: line
//! items, branch, customer details, and the payment proof, moving through
//! `Building -> Submitting -> Completed | Failed`. A failed submission
//! keeps the draft exactly as it was so the cashier can retry without
//! re-entering anything.

use serde_json::{json, Value};

use crate::cart::Cart;
use crate::catalog::Product;
use crate::error::PosError;
use crate::history::Transaction;

/// Where a draft is in its life. There is no `Empty`; an absent draft is
/// represented by the store holding `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStage {
    Building,
    Submitting,
    Completed,
    Failed,
}

/// Which field-naming convention the outbound payload uses. The backend
/// accepted both across its revisions; `Current` is what production runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireRevision {
    #[default]
    Current,
    Legacy,
}

/// One line item being assembled. The product id is kept as written
/// (sheet-minted `prod-N` ids included) so every product holds its own
/// line; ids are coerced to numbers only when the wire payload is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub product_id: Option<String>,
    pub quantity: i64,
    pub item: String,
    pub price: i64,
}

/// One checkout (or history edit) being assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDraft {
    /// Id of the history record being edited; `None` for a new checkout.
    editing_id: Option<String>,
    pub branch_name: String,
    pub customer_name: String,
    pub is_returning_customer: bool,
    items: Vec<DraftLine>,
    payment_proof: Option<String>,
    stage: DraftStage,
}

impl CheckoutDraft {
    /// Seeds a new checkout from the cart. Lines map one-to-one and keep
    /// the cart's product identity untouched.
    pub fn from_cart(cart: &Cart, branch_name: &str, is_returning_customer: bool) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| DraftLine {
                product_id: line.product.id.clone(),
                quantity: i64::from(line.quantity),
                item: line.product.item.clone(),
                price: line.product.price,
            })
            .collect();
        Self {
            editing_id: None,
            branch_name: branch_name.to_string(),
            customer_name: String::new(),
            is_returning_customer,
            items,
            payment_proof: None,
            stage: DraftStage::Building,
        }
    }

    /// Seeds an edit draft from a canonical history record.
    pub fn from_transaction(tx: &Transaction) -> Self {
        Self {
            editing_id: tx.id.clone(),
            branch_name: tx.branch_name.clone(),
            customer_name: tx.customer_name.clone().unwrap_or_default(),
            is_returning_customer: tx.is_returning_customer,
            items: tx
                .items
                .iter()
                .map(|i| DraftLine {
                    product_id: i.product_id.map(|n| n.to_string()),
                    quantity: i.quantity,
                    item: i.item.clone(),
                    price: i.price,
                })
                .collect(),
            payment_proof: tx.payment_proof.clone(),
            stage: DraftStage::Building,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing_id.is_some()
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn stage(&self) -> DraftStage {
        self.stage
    }

    pub fn items(&self) -> &[DraftLine] {
        &self.items
    }

    pub fn payment_proof(&self) -> Option<&str> {
        self.payment_proof.as_deref()
    }

    /// Recomputed from the items on every call; never stored.
    pub fn total(&self) -> i64 {
        self.items.iter().map(|i| i.price * i.quantity).sum()
    }

    // -----------------------------------------------------------------------
    // Building mutations
    // -----------------------------------------------------------------------

    /// Adds one unit of `product`, merging into the line that carries the
    /// same raw product id.
    pub fn add_product(&mut self, product: &Product) {
        match self.items.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity += 1,
            None => self.items.push(DraftLine {
                product_id: product.id.clone(),
                quantity: 1,
                item: product.item.clone(),
                price: product.price,
            }),
        }
    }

    pub fn increment_item(&mut self, product_id: Option<&str>) {
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|l| l.product_id.as_deref() == product_id)
        {
            line.quantity += 1;
        }
    }

    /// Same decrement-to-removal rule as the cart.
    pub fn decrement_item(&mut self, product_id: Option<&str>) {
        let Some(idx) = self
            .items
            .iter()
            .position(|l| l.product_id.as_deref() == product_id)
        else {
            return;
        };
        if self.items[idx].quantity <= 1 {
            self.items.remove(idx);
        } else {
            self.items[idx].quantity -= 1;
        }
    }

    pub fn set_branch(&mut self, branch_name: &str) {
        self.branch_name = branch_name.to_string();
    }

    pub fn set_customer_name(&mut self, name: &str) {
        self.customer_name = name.to_string();
    }

    pub fn set_returning_customer(&mut self, value: bool) {
        self.is_returning_customer = value;
    }

    /// Attaches a prepared proof data URI. Only ever called with a
    /// successfully prepared proof, so a failed preparation can never
    /// clobber an earlier attachment.
    pub fn attach_proof(&mut self, data_url: String) {
        self.payment_proof = Some(data_url);
    }

    // -----------------------------------------------------------------------
    // Submission gate and stage transitions
    // -----------------------------------------------------------------------

    /// Whether submission is allowed: at least one item, and a payment
    /// proof for a new checkout. Edits keep whatever proof they had.
    pub fn can_submit(&self) -> bool {
        !self.items.is_empty() && (self.is_edit() || self.payment_proof.is_some())
    }

    /// Building/Failed -> Submitting. Refuses a second submit while one
    /// is in flight, and enforces [`can_submit`](Self::can_submit) before
    /// any network attempt is made.
    pub fn begin_submit(&mut self) -> Result<(), PosError> {
        if self.stage == DraftStage::Submitting {
            return Err(PosError::Validation(
                "A submission is already in progress".to_string(),
            ));
        }
        if self.items.is_empty() {
            return Err(PosError::Validation(
                "Add at least one item before submitting".to_string(),
            ));
        }
        if !self.is_edit() && self.payment_proof.is_none() {
            return Err(PosError::Validation(
                "Attach a payment proof before submitting".to_string(),
            ));
        }
        self.stage = DraftStage::Submitting;
        Ok(())
    }

    pub fn mark_completed(&mut self) {
        self.stage = DraftStage::Completed;
    }

    /// Failure keeps everything else untouched so a retry resubmits the
    /// identical draft.
    pub fn mark_failed(&mut self) {
        self.stage = DraftStage::Failed;
    }

    // -----------------------------------------------------------------------
    // Wire payload
    // -----------------------------------------------------------------------

    /// Assembles the outbound transaction body. `user_id` lands under
    /// `createdBy` for new checkouts and `updatedBy` for edits. Product
    /// ids are coerced to integers here; non-numeric ones become `null`.
    pub fn to_payload(&self, rev: WireRevision, user_id: Option<i64>) -> Value {
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|l| {
                json!({
                    "product_id": l.product_id.as_deref().and_then(|s| s.parse::<i64>().ok()),
                    "quantity": l.quantity,
                })
            })
            .collect();

        let mut body = json!({
            "branchName": self.branch_name.trim(),
            "customerName": self.customer_name.trim(),
            "items": items,
        });
        match rev {
            WireRevision::Current => {
                body["totalPrice"] = json!(self.total());
                body["Isreturningcustomer"] = json!(self.is_returning_customer);
            }
            WireRevision::Legacy => {
                body["totalprice"] = json!(self.total());
                body["isreturningcustomer"] = json!(self.is_returning_customer);
            }
        }
        if let Some(proof) = &self.payment_proof {
            body["payment_proof"] = json!(proof);
        }
        if let Some(uid) = user_id {
            let key = if self.is_edit() { "updatedBy" } else { "createdBy" };
            body[key] = json!(uid);
        }
        body
    }
}
