//! Typed client for the MIX REST backend.
//!
//! # Architecture
//!
//! - JSON over HTTP with `reqwest`; `Authorization: Bearer <token>` whenever
//!   the caller has a session
//! - Responses may be wrapped as `{"data": T, "message": ...}` or be a bare
//!   `T`; both are accepted
//! - Public listings (categories, home sections) are cached in memory via
//!   `moka` for 60 seconds and invalidated by admin mutations
//!
//! # Example
//!
//! ```rust,ignore
//! use mix_catalogo_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//!
//! let auth = client.login("cliente@mix.com", "segredo").await?;
//! let token = ApiToken::new(auth.token);
//! let cart = client.get_cart(&token).await?;
//! ```

mod auth;
mod cache;
mod cart;
mod categories;
mod orders;
mod products;
pub mod types;
mod vendors;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;

use cache::{CacheKey, CacheValue};

/// Backend error code sent when a request carried no token at all.
pub const TOKEN_NOT_PROVIDED: &str = "TOKEN_NAO_FORNECIDO";

/// How long public listings stay cached.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// How much of an unexpected body to keep in logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// ApiError
// =============================================================================

/// Errors that can occur when talking to the MIX backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL could not be joined with an endpoint path.
    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend rejected the token (or no token was sent).
    #[error("Unauthorized (code: {code:?})")]
    Unauthorized {
        code: Option<String>,
        message: Option<String>,
    },

    /// The resource does not exist.
    #[error("Not found")]
    NotFound { message: Option<String> },

    /// Any other non-success status.
    #[error("Backend returned {status}")]
    Status { status: u16, message: Option<String> },

    /// The body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A body was required but the backend sent none.
    #[error("Empty response body")]
    EmptyBody,
}

impl ApiError {
    /// Whether this is a 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is a 401.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Whether the backend reported that no token was sent.
    #[must_use]
    pub fn is_token_missing(&self) -> bool {
        matches!(self, Self::Unauthorized { code: Some(code), .. } if code == TOKEN_NOT_PROVIDED)
    }

    /// The backend-provided message, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message, .. }
            | Self::NotFound { message }
            | Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Message to show the user: the backend's own, else `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.backend_message().unwrap_or(fallback).to_string()
    }
}

/// Error body shape used by the backend.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    code: Option<String>,
}

/// Map a non-success response to an [`ApiError`].
fn classify(status: StatusCode, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty());

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized {
            code: parsed.code,
            message,
        },
        StatusCode::NOT_FOUND => ApiError::NotFound { message },
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Decode a success body into its payload, unwrapping `{"data": ...}`.
///
/// An empty body, `null`, or `{"data": null}` decode to `None`.
fn decode_body(body: &str) -> Result<Option<Value>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let value = match serde_json::from_str::<Value>(body)? {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    Ok(match value {
        Value::Null => None,
        payload => Some(payload),
    })
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

// =============================================================================
// ApiToken
// =============================================================================

/// Bearer token issued by the backend.
///
/// Kept as a secret so it never shows up in `Debug` output or logs. It does
/// serialize (into the server-side session store only).
#[derive(Clone)]
pub struct ApiToken(SecretString);

impl ApiToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken([REDACTED])")
    }
}

impl PartialEq for ApiToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Serialize for ApiToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for ApiToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the MIX REST backend.
///
/// Cheaply cloneable; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("mix-catalogo-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Full URL for an endpoint path such as `/produtos/3`.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// Start a request, attaching the bearer token when present.
    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&ApiToken>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        let builder = self.inner.client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        })
    }

    /// Send a request and return its unwrapped payload, if any.
    async fn send(&self, builder: RequestBuilder) -> Result<Option<Value>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = classify(status, &body);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %truncate(&body),
                    "MIX backend returned server error"
                );
            } else {
                tracing::debug!(status = %status, error = %err, "MIX backend rejected request");
            }
            return Err(err);
        }

        decode_body(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse MIX backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose response must carry a `T`.
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        self.fetch_optional(builder)
            .await?
            .ok_or(ApiError::EmptyBody)
    }

    /// Send a request whose response may legitimately be empty.
    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        match self.send(builder).await? {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                tracing::error!(error = %e, "MIX backend payload did not match expected shape");
                ApiError::Parse(e)
            }),
            None => Ok(None),
        }
    }

    /// Send a request and ignore any response body.
    async fn execute(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder).await.map(|_| ())
    }

    /// Drop every cached listing.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
        tracing::debug!("Listing cache invalidated");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod fixtures {
    //! Backend payloads and a local stand-in backend shared by tests.

    use std::time::Duration;

    use axum::Router;
    use serde_json::{Value, json};
    use url::Url;

    use super::{ApiClient, Cart, Product};
    use crate::config::ApiConfig;

    /// Serve `routes` under `/api` on a free local port; returns the base URL.
    pub async fn backend(routes: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().nest("/api", routes);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/api")).unwrap()
    }

    pub fn client(base_url: Url) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    pub fn product_json(id: i32, price: f64, promo: Option<f64>, on_promotion: bool, stock: u32) -> Value {
        json!({
            "id": id,
            "nome": format!("Produto {id}"),
            "preco": price,
            "precoPromocional": promo,
            "emPromocao": on_promotion,
            "quantidade": stock,
            "categoriaId": 1,
            "vendedorId": 2
        })
    }

    pub fn product(id: i32, price: f64, promo: Option<f64>, on_promotion: bool) -> Product {
        serde_json::from_value(product_json(id, price, promo, on_promotion, 10)).unwrap()
    }

    /// A cart whose lines are `(item id, product, quantity)`.
    pub fn cart(lines: &[(i32, Product, u32)]) -> Cart {
        let items: Vec<Value> = lines
            .iter()
            .map(|(id, product, quantity)| {
                json!({
                    "id": id,
                    "produtoId": product.id,
                    "quantidade": quantity,
                    "produto": product,
                })
            })
            .collect();
        serde_json::from_value(json!({"id": 1, "itens": items})).unwrap()
    }
}
