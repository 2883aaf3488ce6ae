//! POS backend API client.
//!
//! Authenticated HTTP communication with the Lele Krispy backend: login,
//! product/supplier CRUD, transaction history, and payment-proof fetches.
//! Callers get `serde_json::Value` back; the normalization boundary in
//! `catalog` and `history` turns those into canonical records.

use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::{Product, Supplier};
use crate::config::AppConfig;
use crate::error::PosError;
use crate::{value_id, value_str};

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach the POS backend at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid backend URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message. 401 never
/// reaches this; it is handled as an authentication failure upstream.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        403 => "This account is not allowed to do that".to_string(),
        404 => "Backend endpoint not found".to_string(),
        s if s >= 500 => format!("Backend server error (HTTP {s})"),
        s => format!("Unexpected response from backend (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// The backend wraps most payloads in `{"Data": ...}`, but not all of
/// them. Unwrap when the key is there, pass through otherwise.
fn unwrap_data(v: Value) -> Value {
    match v {
        Value::Object(mut map) if map.contains_key("Data") => {
            map.remove("Data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// What a successful login returns, already picked out of the loose
/// response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub token: String,
    pub username: String,
    pub user_id: String,
}

/// A payment-proof image as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, PosError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PosError::Api(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: crate::config::normalize_base_url(&config.api_base_url),
        })
    }

    /// The backend router only matches paths with a trailing slash.
    fn endpoint(&self, path: &str) -> String {
        if path.ends_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}/", self.base_url, path)
        }
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value, PosError> {
        let url = self.endpoint(path);
        let mut req = self
            .http
            .request(method, &url)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let start = Instant::now();
        let resp = req
            .send()
            .await
            .map_err(|e| PosError::Api(friendly_error(&self.base_url, &e)))?;
        let latency = start.elapsed().as_millis() as u64;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!(%url, latency_ms = latency, "request rejected with 401");
            return Err(PosError::Auth(
                "Session expired. Please log in again.".to_string(),
            ));
        }

        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<Value>(&body_text) {
                Ok(json) => json
                    .get("error")
                    .or_else(|| json.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| status_error(status)),
                Err(_) => status_error(status),
            };
            warn!(%url, status = status.as_u16(), latency_ms = latency, "request failed: {detail}");
            return Err(PosError::Api(detail));
        }

        debug!(%url, status = status.as_u16(), latency_ms = latency, "request ok");

        let body_text = resp
            .text()
            .await
            .map_err(|e| PosError::Api(format!("Reading backend response failed: {e}")))?;
        if body_text.is_empty() {
            return Ok(Value::Null);
        }
        let json: Value = serde_json::from_str(&body_text)
            .map_err(|e| PosError::Api(format!("Invalid JSON from backend: {e}")))?;
        Ok(unwrap_data(json))
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Logs in and picks the token, username, and user id out of the
    /// response. The user id has worn four different key spellings over
    /// the backend's lifetime.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, PosError> {
        let body = json!({ "username": username, "password": password });
        let res = self
            .request(Method::POST, "/auth/login", None, Some(&body))
            .await?;
        let token = value_str(&res, &["Token", "token"]).ok_or_else(|| {
            PosError::Auth("Login response did not include a token".to_string())
        })?;
        let resolved_username =
            value_str(&res, &["Username", "username"]).unwrap_or_else(|| username.to_string());
        let user_id = value_id(&res, &["Id", "id", "UserID", "userid"]).unwrap_or_default();
        info!(username = %resolved_username, "login succeeded");
        Ok(LoginSuccess {
            token,
            username: resolved_username,
            user_id,
        })
    }

    // -----------------------------------------------------------------------
    // Products
    // -----------------------------------------------------------------------

    pub async fn fetch_products(&self, token: Option<&str>) -> Result<Value, PosError> {
        self.request(Method::GET, "/products", token, None).await
    }

    /// Create or update depending on whether the product has an id.
    pub async fn save_product(
        &self,
        token: Option<&str>,
        product: &Product,
    ) -> Result<Value, PosError> {
        let payload = product.save_payload();
        match &product.id {
            Some(id) => {
                self.request(Method::PUT, &format!("/products/{id}"), token, Some(&payload))
                    .await
            }
            None => {
                self.request(Method::POST, "/products", token, Some(&payload))
                    .await
            }
        }
    }

    pub async fn delete_product(&self, token: Option<&str>, id: &str) -> Result<Value, PosError> {
        self.request(Method::DELETE, &format!("/products/{id}"), token, None)
            .await
    }

    // -----------------------------------------------------------------------
    // Supplies
    // -----------------------------------------------------------------------

    pub async fn fetch_supplies(&self, token: Option<&str>) -> Result<Value, PosError> {
        self.request(Method::GET, "/supplies", token, None).await
    }

    pub async fn save_supplier(
        &self,
        token: Option<&str>,
        supplier: &Supplier,
    ) -> Result<Value, PosError> {
        let payload = supplier.save_payload();
        match &supplier.id {
            Some(id) => {
                self.request(Method::PUT, &format!("/supplies/{id}"), token, Some(&payload))
                    .await
            }
            None => {
                self.request(Method::POST, "/supplies", token, Some(&payload))
                    .await
            }
        }
    }

    pub async fn delete_supplier(&self, token: Option<&str>, id: &str) -> Result<Value, PosError> {
        self.request(Method::DELETE, &format!("/supplies/{id}"), token, None)
            .await
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    pub async fn fetch_transactions(&self, token: Option<&str>) -> Result<Value, PosError> {
        self.request(Method::GET, "/transactions", token, None).await
    }

    /// New checkouts are always inserted, never upserted.
    pub async fn insert_transaction(
        &self,
        token: Option<&str>,
        payload: &Value,
    ) -> Result<Value, PosError> {
        self.request(Method::POST, "/transactions", token, Some(payload))
            .await
    }

    pub async fn update_transaction(
        &self,
        token: Option<&str>,
        id: &str,
        payload: &Value,
    ) -> Result<Value, PosError> {
        self.request(Method::PUT, &format!("/transactions/{id}"), token, Some(payload))
            .await
    }

    pub async fn delete_transaction(
        &self,
        token: Option<&str>,
        id: &str,
    ) -> Result<Value, PosError> {
        self.request(Method::DELETE, &format!("/transactions/{id}"), token, None)
            .await
    }

    /// Fetches the stored proof image as raw bytes for in-memory display.
    pub async fn fetch_payment_proof(
        &self,
        token: Option<&str>,
        id: &str,
    ) -> Result<ProofImage, PosError> {
        let url = self.endpoint(&format!("/transactions/payment-proof/{id}"));
        let mut req = self.http.get(&url);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let resp = req
            .send()
            .await
            .map_err(|e| PosError::Api(friendly_error(&self.base_url, &e)))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(PosError::Auth(
                "Session expired. Please log in again.".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(PosError::Api(status_error(status)));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| PosError::Api(format!("Reading payment proof failed: {e}")))?;
        Ok(ProofImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let config = AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        };
        ApiClient::new(&config).expect("build client")
    }

    #[tokio::test]
    async fn paths_gain_a_trailing_slash_and_data_is_unwrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Data": [{ "id": 1, "item": "Lele Krispy", "price": 15000 }]
            })))
            .mount(&server)
            .await;

        let res = client_for(&server)
            .fetch_products(None)
            .await
            .expect("fetch products");
        assert!(res.is_array());
        assert_eq!(res[0]["item"], "Lele Krispy");
    }

    #[tokio::test]
    async fn bare_payloads_pass_through_unwrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transactions/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "totalprice": 15000 }])),
            )
            .mount(&server)
            .await;

        let res = client_for(&server)
            .fetch_transactions(None)
            .await
            .expect("fetch transactions");
        assert_eq!(res[0]["totalprice"], 15000);
    }

    #[tokio::test]
    async fn empty_bodies_become_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/products/7/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let res = client_for(&server)
            .delete_product(None, "7")
            .await
            .expect("delete product");
        assert!(res.is_null());
    }

    #[tokio::test]
    async fn bearer_token_rides_on_authenticated_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/supplies/"))
            .and(header("Authorization", "Bearer tok-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .fetch_supplies(Some("tok-abc"))
            .await
            .expect("fetch supplies");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transactions/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_transactions(Some("stale"))
            .await
            .expect_err("must fail");
        assert!(matches!(err, PosError::Auth(_)));
    }

    #[tokio::test]
    async fn backend_error_strings_are_surfaced_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transactions/"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({ "error": "items required" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .insert_transaction(None, &serde_json::json!({}))
            .await
            .expect_err("must fail");
        assert_eq!(String::from(err), "items required");
    }

    #[tokio::test]
    async fn bodyless_failures_fall_back_to_the_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_products(None)
            .await
            .expect_err("must fail");
        assert!(String::from(err).contains("HTTP 500"));
    }

    #[tokio::test]
    async fn login_extracts_token_username_and_any_id_spelling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .and(body_json(serde_json::json!({
                "username": "kasir1", "password": "rahasia"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Token": "tok-abc", "Username": "Kasir Satu", "UserID": 7
            })))
            .mount(&server)
            .await;

        let login = client_for(&server)
            .login("kasir1", "rahasia")
            .await
            .expect("login");
        assert_eq!(login.token, "tok-abc");
        assert_eq!(login.username, "Kasir Satu");
        assert_eq!(login.user_id, "7");
    }

    #[tokio::test]
    async fn login_without_a_token_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Username": "x" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login("kasir1", "pw")
            .await
            .expect_err("must fail");
        assert!(matches!(err, PosError::Auth(_)));
    }

    #[tokio::test]
    async fn save_product_picks_put_or_post_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/products/7/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/products/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let existing = Product {
            id: Some("7".to_string()),
            item: "Lele Krispy".to_string(),
            description: String::new(),
            price: 15000,
        };
        let fresh = Product {
            id: None,
            item: "Es Teh".to_string(),
            description: String::new(),
            price: 5000,
        };
        client.save_product(None, &existing).await.expect("update");
        client.save_product(None, &fresh).await.expect("create");
    }

    #[tokio::test]
    async fn payment_proof_returns_bytes_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transactions/payment-proof/42/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0xFF, 0xD8, 0xFF])
                    .insert_header("content-type", "image/png"),
            )
            .mount(&server)
            .await;

        let proof = client_for(&server)
            .fetch_payment_proof(Some("tok"), "42")
            .await
            .expect("fetch proof");
        assert_eq!(proof.bytes, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(proof.content_type, "image/png");
    }
}
