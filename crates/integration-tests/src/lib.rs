//! End-to-end tests for MIX Catálogo Digital.
//!
//! # Running Tests
//!
//! The tests drive a running storefront, which in turn needs the MIX backend
//! and the session database:
//!
//! ```bash
//! cargo run -p mix-catalogo-storefront &
//! STOREFRONT_TEST_URL=http://localhost:5173 cargo test -p mix-catalogo-integration-tests -- --ignored
//! ```
//!
//! Tests that act as staff also need `MIX_TEST_ADMIN_EMAIL` and
//! `MIX_TEST_ADMIN_PASSWORD` for an existing admin account.

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::{
    Client, Response, StatusCode,
    header::{HeaderMap, HeaderValue, LOCATION},
    redirect::Policy,
};

/// Default storefront address.
pub const DEFAULT_STOREFRONT_URL: &str = "http://localhost:5173";

/// A browser-like client: keeps the session cookie and does not follow
/// redirects, so tests can assert on `Location`.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Fresh context with an empty cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        let base_url = std::env::var("STOREFRONT_TEST_URL")
            .unwrap_or_else(|_| DEFAULT_STOREFRONT_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        // The login rate limit is per client address; give each context its own
        let mut headers = HeaderMap::new();
        let octets = uuid::Uuid::new_v4().into_bytes();
        let [a, b, c, ..] = octets;
        if let Ok(ip) = HeaderValue::from_str(&format!("10.{a}.{b}.{c}")) {
            headers.insert("x-forwarded-for", ip);
        }
        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");
        Self { client, base_url }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET` a path.
    ///
    /// # Panics
    ///
    /// Panics if the storefront is unreachable.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Storefront unreachable")
    }

    /// `POST` a form to a path.
    ///
    /// # Panics
    ///
    /// Panics if the storefront is unreachable.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Storefront unreachable")
    }

    /// Register a customer with a unique email and stay logged in.
    ///
    /// # Panics
    ///
    /// Panics if registration does not redirect.
    pub async fn register_customer(&self) -> String {
        let email = format!("teste-{}@example.com", uuid::Uuid::new_v4().simple());
        let response = self
            .post_form(
                "/cadastro",
                &[
                    ("nome", "Cliente Teste"),
                    ("email", &email),
                    ("telefone", "11999999999"),
                    ("senha", "senha123"),
                    ("confirmar_senha", "senha123"),
                    ("tipo", "cliente"),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "registration failed");
        email
    }

    /// Log in through the back-office form with the configured admin account.
    ///
    /// # Panics
    ///
    /// Panics if the admin credentials are not configured.
    pub async fn login_admin(&self) -> Response {
        let email = std::env::var("MIX_TEST_ADMIN_EMAIL").expect("MIX_TEST_ADMIN_EMAIL not set");
        let password =
            std::env::var("MIX_TEST_ADMIN_PASSWORD").expect("MIX_TEST_ADMIN_PASSWORD not set");
        self.post_form("/admin/login", &[("email", &email), ("senha", &password)])
            .await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The `Location` header of a redirect, or `""`.
#[must_use]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
