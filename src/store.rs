//! Application state store.
//!
//! One `AppStore` per running app: it owns the API client, the session,
//! the three fetched collections, the cart, and the optional checkout
//! draft, and every UI action funnels through one of its methods. All
//! mutations take `&mut self`, so there is never a concurrent duplicate
//! of an action in flight.

use tracing::{info, warn};

use crate::api::{ApiClient, ProofImage};
use crate::cart::Cart;
use crate::catalog::{normalize_products, normalize_suppliers, Product, Supplier};
use crate::checkout::{CheckoutDraft, WireRevision};
use crate::config::{AppConfig, BRANCH_OPTIONS, DEFAULT_BRANCH};
use crate::error::PosError;
use crate::history::{filter_by_date, group_by_day, normalize_transactions, DayGroup, Transaction};
use crate::proof::prepare_payment_proof;
use crate::session::{SessionData, SessionStore};
use crate::sheet::fetch_sheet_products;

pub struct AppStore {
    config: AppConfig,
    session: SessionStore,
    api: ApiClient,
    products: Vec<Product>,
    suppliers: Vec<Supplier>,
    history: Vec<Transaction>,
    cart: Cart,
    branch: String,
    returning_customer: bool,
    draft: Option<CheckoutDraft>,
}

impl AppStore {
    pub fn new(config: AppConfig) -> Result<Self, PosError> {
        let session = SessionStore::open(config.session_path.clone());
        let api = ApiClient::new(&config)?;
        Ok(Self {
            config,
            session,
            api,
            products: Vec::new(),
            suppliers: Vec::new(),
            history: Vec::new(),
            cart: Cart::new(),
            branch: DEFAULT_BRANCH.to_string(),
            returning_customer: false,
            draft: None,
        })
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn username(&self) -> Option<&str> {
        self.session.username()
    }

    /// Signs in and persists the fresh session. A rejected login gets the
    /// same 401 treatment as every other call: any previously persisted
    /// session is purged rather than left behind with a dead token.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), PosError> {
        let res = self.api.login(username, password).await;
        let login = self.auth_guard(res)?;
        self.session.set_session(SessionData {
            token: login.token,
            username: login.username,
            user_id: login.user_id,
        })?;
        Ok(())
    }

    /// Ends the session and drops anything tied to it: the cart and any
    /// draft in progress.
    pub fn logout(&mut self) -> Result<(), PosError> {
        self.session.clear()?;
        self.cart.clear();
        self.draft = None;
        info!("logged out");
        Ok(())
    }

    /// A 401 means the stored token is dead; purge it so the next
    /// protected action forces a fresh login.
    fn auth_guard<T>(&mut self, result: Result<T, PosError>) -> Result<T, PosError> {
        if matches!(&result, Err(PosError::Auth(_))) {
            warn!("authentication rejected; purging stored session");
            self.session.purge();
        }
        result
    }

    // -----------------------------------------------------------------------
    // Collections
    // -----------------------------------------------------------------------

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    pub fn grouped_history(&self) -> Vec<DayGroup> {
        group_by_day(&self.history)
    }

    pub fn history_for_date(&self, iso_date: &str) -> Vec<Transaction> {
        filter_by_date(&self.history, iso_date)
    }

    /// Case-insensitive substring match on the item name. An empty query
    /// matches everything.
    pub fn search_products(&self, query: &str) -> Vec<&Product> {
        let q = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| p.item.to_lowercase().contains(&q))
            .collect()
    }

    /// Fetches all three collections and replaces them wholesale. Any
    /// failure leaves the previous collections untouched so the UI keeps
    /// showing the last good data next to its retry panel.
    pub async fn reload_all(&mut self) -> Result<(), PosError> {
        let products_raw = {
            let res = self.api.fetch_products(self.session.token()).await;
            self.auth_guard(res)?
        };
        let supplies_raw = {
            let res = self.api.fetch_supplies(self.session.token()).await;
            self.auth_guard(res)?
        };
        let transactions_raw = {
            let res = self.api.fetch_transactions(self.session.token()).await;
            self.auth_guard(res)?
        };

        self.products = normalize_products(&products_raw);
        self.suppliers = normalize_suppliers(&supplies_raw);
        self.history = normalize_transactions(&transactions_raw);
        info!(
            products = self.products.len(),
            suppliers = self.suppliers.len(),
            transactions = self.history.len(),
            "collections reloaded"
        );
        Ok(())
    }

    pub async fn save_product(&mut self, product: &Product) -> Result<(), PosError> {
        let res = self.api.save_product(self.session.token(), product).await;
        self.auth_guard(res)?;
        self.reload_all().await
    }

    pub async fn delete_product(&mut self, id: &str) -> Result<(), PosError> {
        let res = self.api.delete_product(self.session.token(), id).await;
        self.auth_guard(res)?;
        self.reload_all().await
    }

    pub async fn save_supplier(&mut self, supplier: &Supplier) -> Result<(), PosError> {
        let res = self.api.save_supplier(self.session.token(), supplier).await;
        self.auth_guard(res)?;
        self.reload_all().await
    }

    pub async fn delete_supplier(&mut self, id: &str) -> Result<(), PosError> {
        let res = self.api.delete_supplier(self.session.token(), id).await;
        self.auth_guard(res)?;
        self.reload_all().await
    }

    pub async fn delete_transaction(&mut self, id: &str) -> Result<(), PosError> {
        let res = self.api.delete_transaction(self.session.token(), id).await;
        self.auth_guard(res)?;
        self.reload_all().await
    }

    /// Fetches a stored payment proof for display.
    pub async fn payment_proof(&mut self, transaction_id: &str) -> Result<ProofImage, PosError> {
        let res = self
            .api
            .fetch_payment_proof(self.session.token(), transaction_id)
            .await;
        self.auth_guard(res)
    }

    /// Replaces the product list from the public spreadsheet. Purely a
    /// local alternate data source; the backend is not involved.
    pub async fn import_products_from_sheet(&mut self) -> Result<usize, PosError> {
        let products = fetch_sheet_products(&self.config.sheet_csv_url).await?;
        let count = products.len();
        self.products = products;
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Cart and branch
    // -----------------------------------------------------------------------

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn add_to_cart(&mut self, product: Product) {
        self.cart.add_product(product);
    }

    pub fn change_cart_quantity(&mut self, product_id: Option<&str>, delta: i64) {
        self.cart.change_quantity(product_id, delta);
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn branch_options(&self) -> &'static [&'static str] {
        BRANCH_OPTIONS
    }

    pub fn set_branch(&mut self, branch: &str) {
        self.branch = branch.to_string();
    }

    pub fn is_returning_customer(&self) -> bool {
        self.returning_customer
    }

    pub fn set_returning_customer(&mut self, value: bool) {
        self.returning_customer = value;
    }

    // -----------------------------------------------------------------------
    // Checkout orchestration
    // -----------------------------------------------------------------------

    pub fn draft(&self) -> Option<&CheckoutDraft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut CheckoutDraft> {
        self.draft.as_mut()
    }

    /// Opens a new checkout draft seeded from the cart.
    pub fn begin_checkout(&mut self) -> Result<(), PosError> {
        if self.cart.is_empty() {
            return Err(PosError::Validation(
                "The cart is empty; add an item first".to_string(),
            ));
        }
        self.draft = Some(CheckoutDraft::from_cart(
            &self.cart,
            &self.branch,
            self.returning_customer,
        ));
        Ok(())
    }

    /// Opens an edit draft for an existing history record.
    pub fn begin_edit(&mut self, transaction_id: &str) -> Result<(), PosError> {
        let tx = self
            .history
            .iter()
            .find(|t| t.id.as_deref() == Some(transaction_id))
            .ok_or_else(|| {
                PosError::Validation(format!("Transaction {transaction_id} is not in the history"))
            })?;
        self.draft = Some(CheckoutDraft::from_transaction(tx));
        Ok(())
    }

    pub fn discard_draft(&mut self) {
        self.draft = None;
    }

    /// Prepares and attaches a proof image to the active draft. When the
    /// preparation fails, any previously attached proof stays in place.
    pub fn attach_proof(&mut self, image_bytes: &[u8]) -> Result<(), PosError> {
        let draft = self.draft.as_mut().ok_or_else(|| {
            PosError::Validation("No checkout in progress".to_string())
        })?;
        let data_url = prepare_payment_proof(image_bytes)?;
        draft.attach_proof(data_url);
        Ok(())
    }

    /// Submits the active draft. New checkouts POST, edits PUT. On
    /// success the draft is gone, the cart is cleared (new checkouts
    /// only), and the collections reload; the caller should switch to the
    /// history view. On failure the draft stays exactly as it was.
    pub async fn submit_checkout(&mut self) -> Result<(), PosError> {
        let user_id = self.session.user_id().and_then(|s| s.parse::<i64>().ok());
        let (payload, editing_id) = match self.draft.as_mut() {
            Some(draft) => {
                draft.begin_submit()?;
                (
                    draft.to_payload(WireRevision::Current, user_id),
                    draft.editing_id().map(str::to_string),
                )
            }
            None => {
                return Err(PosError::Validation(
                    "No checkout in progress".to_string(),
                ))
            }
        };

        let result = match editing_id.as_deref() {
            Some(id) => {
                self.api
                    .update_transaction(self.session.token(), id, &payload)
                    .await
            }
            None => {
                self.api
                    .insert_transaction(self.session.token(), &payload)
                    .await
            }
        };
        let result = self.auth_guard(result);

        match result {
            Ok(_) => {
                let was_edit = editing_id.is_some();
                if let Some(draft) = self.draft.as_mut() {
                    draft.mark_completed();
                }
                self.draft = None;
                if !was_edit {
                    self.cart.clear();
                }
                info!(edit = was_edit, "checkout submitted");
                self.reload_all().await
            }
            Err(e) => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.mark_failed();
                }
                warn!("checkout submission failed: {e}");
                Err(e)
            }
        }
    }
}
