//! Cart store.
//!
//! The backend owns the cart. Every operation calls it and then replaces the
//! local copy with whatever it returned: no optimistic updates, no merging.
//! The last copy is kept in the session as a [`CartSnapshot`] tagged with its
//! owner, so the header badge can render without a backend round trip and a
//! change of identity is detected on the next request.

use std::future::Future;

use thiserror::Error;
use tower_sessions::Session;

use mix_catalogo_core::{CartItemId, Price, ProductId};

use crate::api::{ApiClient, ApiError, ApiToken, Cart};
use crate::models::{AuthSession, CartSnapshot, session_keys};

const LOGIN_TO_ADD: &str = "Você precisa estar logado para adicionar itens ao carrinho";
const LOGIN_REQUIRED: &str = "Você precisa estar logado";

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No session; raised before any backend call.
    #[error("{0}")]
    NotAuthenticated(&'static str),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("only {available} in stock")]
    InsufficientStock { available: u32 },

    #[error("cart item {0} not found")]
    ItemNotFound(CartItemId),

    #[error("backend error: {0}")]
    Api(#[from] ApiError),
}

impl CartError {
    /// Message to show the user.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::NotAuthenticated(message) => (*message).to_string(),
            Self::InvalidQuantity(_) => "Quantidade inválida".to_string(),
            Self::InsufficientStock { available } => {
                format!("Apenas {available} unidade(s) em estoque")
            }
            Self::ItemNotFound(_) => "Item não encontrado no carrinho".to_string(),
            Self::Api(err) => err.user_message(fallback),
        }
    }
}

/// Backend operations the cart store depends on.
pub trait CartBackend {
    /// Current cart; `None` when the user has none.
    fn fetch(&self, token: &ApiToken) -> impl Future<Output = Result<Option<Cart>, ApiError>> + Send;

    fn add_item(
        &self,
        token: &ApiToken,
        product_id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    fn update_item(
        &self,
        token: &ApiToken,
        item_id: CartItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// `None` when nothing is left.
    fn remove_item(
        &self,
        token: &ApiToken,
        item_id: CartItemId,
    ) -> impl Future<Output = Result<Option<Cart>, ApiError>> + Send;

    fn clear(&self, token: &ApiToken) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl CartBackend for ApiClient {
    async fn fetch(&self, token: &ApiToken) -> Result<Option<Cart>, ApiError> {
        self.get_cart(token).await
    }

    async fn add_item(
        &self,
        token: &ApiToken,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        self.add_to_cart(token, product_id, quantity).await
    }

    async fn update_item(
        &self,
        token: &ApiToken,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        self.update_cart_item(token, item_id, quantity).await
    }

    async fn remove_item(
        &self,
        token: &ApiToken,
        item_id: CartItemId,
    ) -> Result<Option<Cart>, ApiError> {
        self.remove_cart_item(token, item_id).await
    }

    async fn clear(&self, token: &ApiToken) -> Result<(), ApiError> {
        self.clear_cart(token).await
    }
}

/// The current user's cart for one request.
pub struct CartStore<'a, B> {
    backend: &'a B,
    auth: Option<AuthSession>,
    cart: Option<Cart>,
    synced: bool,
}

impl<'a, B: CartBackend> CartStore<'a, B> {
    /// Build from the session's identity and last snapshot.
    ///
    /// The snapshot is used only if it belongs to the current user; otherwise
    /// it is discarded and the store starts unsynced (authenticated) or empty
    /// (anonymous).
    #[must_use]
    pub fn new(backend: &'a B, auth: Option<AuthSession>, snapshot: Option<CartSnapshot>) -> Self {
        let (cart, synced) = match (&auth, snapshot) {
            (Some(auth), Some(snapshot)) if snapshot.owner == auth.user.id => (snapshot.cart, true),
            (Some(_), _) => (None, false),
            (None, _) => (None, true),
        };

        Self {
            backend,
            auth,
            cart,
            synced,
        }
    }

    /// The cart, `None` when absent.
    #[must_use]
    pub const fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    /// Whether the store has not yet synchronized with the backend.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        !self.synced
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, Cart::item_count)
    }

    /// Sum of effective unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.cart.as_ref().map_or(Price::ZERO, Cart::total)
    }

    /// Fetch the cart from the backend. A missing cart is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Api` on any backend failure other than 404; the
    /// store then stays unsynced.
    pub async fn load(&mut self) -> Result<Option<&Cart>, CartError> {
        let Some(auth) = &self.auth else {
            self.cart = None;
            self.synced = true;
            return Ok(None);
        };

        let cart = self.backend.fetch(&auth.token).await?;
        self.replace(cart);
        Ok(self.cart.as_ref())
    }

    /// [`load`](Self::load) only if not yet synchronized.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn ensure_loaded(&mut self) -> Result<Option<&Cart>, CartError> {
        if self.synced {
            return Ok(self.cart.as_ref());
        }
        self.load().await
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Rejects locally without a session, for a zero quantity, or when an
    /// existing line would exceed stock.
    pub async fn add_item(&mut self, product_id: ProductId, quantity: u32) -> Result<&Cart, CartError> {
        let token = self.token(LOGIN_TO_ADD)?;
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if let Some(line) = self.cart.as_ref().and_then(|c| c.item_for_product(product_id)) {
            let available = line.product.stock_quantity;
            if line.quantity.saturating_add(quantity) > available {
                return Err(CartError::InsufficientStock { available });
            }
        }

        let cart = self.backend.add_item(&token, product_id, quantity).await?;
        Ok(self.replace_with(cart))
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Rejects locally without a session, for a zero quantity, for a line not
    /// in the synchronized cart, or above the product's stock.
    pub async fn update_quantity(
        &mut self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<&Cart, CartError> {
        let token = self.token(LOGIN_REQUIRED)?;
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if self.synced {
            let line = self
                .cart
                .as_ref()
                .and_then(|c| c.item(item_id))
                .ok_or(CartError::ItemNotFound(item_id))?;
            let available = line.product.stock_quantity;
            if quantity > available {
                return Err(CartError::InsufficientStock { available });
            }
        }

        let cart = self.backend.update_item(&token, item_id, quantity).await?;
        Ok(self.replace_with(cart))
    }

    /// Remove a line. Removing the last one leaves the cart absent.
    ///
    /// # Errors
    ///
    /// Rejects locally without a session; otherwise see `CartError::Api`.
    pub async fn remove_item(&mut self, item_id: CartItemId) -> Result<Option<&Cart>, CartError> {
        let token = self.token(LOGIN_REQUIRED)?;
        let cart = self.backend.remove_item(&token, item_id).await?;
        self.replace(cart);
        Ok(self.cart.as_ref())
    }

    /// Empty the cart. The local cart becomes absent.
    ///
    /// # Errors
    ///
    /// Rejects locally without a session; otherwise see `CartError::Api`.
    pub async fn clear(&mut self) -> Result<(), CartError> {
        let token = self.token(LOGIN_REQUIRED)?;
        self.backend.clear(&token).await?;
        self.replace(None);
        Ok(())
    }

    /// What to store in the session, if anything.
    #[must_use]
    pub fn snapshot(&self) -> Option<CartSnapshot> {
        match &self.auth {
            Some(auth) if self.synced => Some(CartSnapshot {
                owner: auth.user.id,
                cart: self.cart.clone(),
            }),
            _ => None,
        }
    }

    fn token(&self, message: &'static str) -> Result<ApiToken, CartError> {
        self.auth
            .as_ref()
            .map(|auth| auth.token.clone())
            .ok_or(CartError::NotAuthenticated(message))
    }

    fn replace(&mut self, cart: Option<Cart>) {
        self.cart = cart;
        self.synced = true;
    }

    fn replace_with(&mut self, cart: Cart) -> &Cart {
        self.synced = true;
        self.cart.insert(cart)
    }
}

/// Build the store for this request from the session.
pub async fn open<'a>(
    session: &Session,
    api: &'a ApiClient,
    auth: Option<AuthSession>,
) -> CartStore<'a, ApiClient> {
    let snapshot = session
        .get::<CartSnapshot>(session_keys::CART)
        .await
        .ok()
        .flatten();
    CartStore::new(api, auth, snapshot)
}

/// Write the store's snapshot back to the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save<B: CartBackend>(
    session: &Session,
    store: &CartStore<'_, B>,
) -> Result<(), tower_sessions::session::Error> {
    match store.snapshot() {
        Some(snapshot) => session.insert(session_keys::CART, snapshot).await,
        None => session.remove_value(session_keys::CART).await.map(|_| ()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mix_catalogo_core::{Email, UserId, UserRole};

    use super::*;
    use crate::api::fixtures;
    use crate::models::SessionUser;

    /// Answers every call with the next configured cart and counts calls.
    #[derive(Default)]
    struct FakeBackend {
        calls: AtomicUsize,
        next: Mutex<Option<Cart>>,
        fail: bool,
    }

    impl FakeBackend {
        fn returning(cart: Option<Cart>) -> Self {
            Self {
                next: Mutex::new(cart),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn respond(&self) -> Result<Option<Cart>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Status {
                    status: 500,
                    message: None,
                });
            }
            Ok(self.next.lock().unwrap().clone())
        }
    }

    impl CartBackend for FakeBackend {
        async fn fetch(&self, _token: &ApiToken) -> Result<Option<Cart>, ApiError> {
            self.respond()
        }

        async fn add_item(
            &self,
            _token: &ApiToken,
            _product_id: ProductId,
            _quantity: u32,
        ) -> Result<Cart, ApiError> {
            self.respond()?.ok_or(ApiError::EmptyBody)
        }

        async fn update_item(
            &self,
            _token: &ApiToken,
            _item_id: CartItemId,
            _quantity: u32,
        ) -> Result<Cart, ApiError> {
            self.respond()?.ok_or(ApiError::EmptyBody)
        }

        async fn remove_item(
            &self,
            _token: &ApiToken,
            _item_id: CartItemId,
        ) -> Result<Option<Cart>, ApiError> {
            self.respond()
        }

        async fn clear(&self, _token: &ApiToken) -> Result<(), ApiError> {
            self.respond().map(|_| ())
        }
    }

    fn auth(user_id: i32) -> AuthSession {
        AuthSession {
            token: ApiToken::new(format!("tok-{user_id}")),
            user: SessionUser {
                id: UserId::new(user_id),
                email: Email::parse("cliente@mix.com").unwrap(),
                name: "Cliente".to_string(),
                role: UserRole::Customer,
                phone: None,
            },
        }
    }

    fn discounted_cart(quantity: u32) -> Cart {
        fixtures::cart(&[(1, fixtures::product(1, 100.0, Some(80.0), true), quantity)])
    }

    #[tokio::test]
    async fn test_anonymous_mutations_never_reach_backend() {
        let backend = FakeBackend::returning(Some(discounted_cart(1)));
        let mut store = CartStore::new(&backend, None, None);

        let err = store.add_item(ProductId::new(1), 1).await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_TO_ADD);

        let err = store.update_quantity(CartItemId::new(1), 2).await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_REQUIRED);
        assert!(matches!(
            store.remove_item(CartItemId::new(1)).await,
            Err(CartError::NotAuthenticated(LOGIN_REQUIRED))
        ));
        assert!(matches!(
            store.clear().await,
            Err(CartError::NotAuthenticated(LOGIN_REQUIRED))
        ));

        assert_eq!(backend.calls(), 0);
        assert!(!store.is_loading());
        assert!(store.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_missing_cart_is_empty_not_error() {
        let backend = FakeBackend::returning(None);
        let mut store = CartStore::new(&backend, Some(auth(1)), None);
        assert!(store.is_loading());

        assert!(store.load().await.unwrap().is_none());
        assert!(!store.is_loading());
        assert_eq!(store.item_count(), 0);
        assert_eq!(store.total(), Price::ZERO);
    }

    #[tokio::test]
    async fn test_failed_load_stays_unsynced() {
        let backend = FakeBackend::failing();
        let mut store = CartStore::new(&backend, Some(auth(1)), None);

        assert!(matches!(store.load().await, Err(CartError::Api(_))));
        assert!(store.is_loading());
        assert!(store.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_add_replaces_cart_with_server_copy() {
        let backend = FakeBackend::returning(Some(discounted_cart(2)));
        let mut store = CartStore::new(&backend, Some(auth(1)), None);

        let cart = store.add_item(ProductId::new(1), 2).await.unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(store.total(), Price::from_cents(16_000));
        assert_eq!(store.snapshot().unwrap().owner, UserId::new(1));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_removing_last_item_leaves_cart_absent() {
        let backend = FakeBackend::returning(None);
        let snapshot = CartSnapshot {
            owner: UserId::new(1),
            cart: Some(discounted_cart(1)),
        };
        let mut store = CartStore::new(&backend, Some(auth(1)), Some(snapshot));

        assert!(store.remove_item(CartItemId::new(1)).await.unwrap().is_none());
        assert!(store.cart().is_none());
        assert!(store.snapshot().unwrap().cart.is_none());
    }

    #[tokio::test]
    async fn test_clear_leaves_cart_absent() {
        let backend = FakeBackend::returning(None);
        let snapshot = CartSnapshot {
            owner: UserId::new(1),
            cart: Some(discounted_cart(3)),
        };
        let mut store = CartStore::new(&backend, Some(auth(1)), Some(snapshot));

        store.clear().await.unwrap();
        assert!(store.cart().is_none());
        assert_eq!(store.item_count(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_of_same_owner_is_reused() {
        let backend = FakeBackend::returning(None);
        let snapshot = CartSnapshot {
            owner: UserId::new(1),
            cart: Some(discounted_cart(3)),
        };
        let mut store = CartStore::new(&backend, Some(auth(1)), Some(snapshot));

        assert_eq!(store.ensure_loaded().await.unwrap().unwrap().item_count(), 3);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_of_other_owner_is_discarded() {
        let backend = FakeBackend::returning(None);
        let snapshot = CartSnapshot {
            owner: UserId::new(1),
            cart: Some(discounted_cart(3)),
        };
        let mut store = CartStore::new(&backend, Some(auth(2)), Some(snapshot.clone()));
        assert!(store.is_loading());
        assert!(store.cart().is_none());

        assert!(store.ensure_loaded().await.unwrap().is_none());
        assert_eq!(backend.calls(), 1);

        let anonymous = CartStore::new(&backend, None, Some(snapshot));
        assert!(anonymous.cart().is_none());
        assert!(!anonymous.is_loading());
    }

    #[tokio::test]
    async fn test_quantity_prechecks_are_local() {
        let backend = FakeBackend::returning(Some(discounted_cart(9)));
        let snapshot = CartSnapshot {
            owner: UserId::new(1),
            cart: Some(discounted_cart(9)),
        };
        let mut store = CartStore::new(&backend, Some(auth(1)), Some(snapshot));

        // fixture stock is 10
        assert!(matches!(
            store.update_quantity(CartItemId::new(1), 11).await,
            Err(CartError::InsufficientStock { available: 10 })
        ));
        assert!(matches!(
            store.update_quantity(CartItemId::new(1), 0).await,
            Err(CartError::InvalidQuantity(0))
        ));
        assert!(matches!(
            store.update_quantity(CartItemId::new(99), 1).await,
            Err(CartError::ItemNotFound(_))
        ));
        assert!(matches!(
            store.add_item(ProductId::new(1), 2).await,
            Err(CartError::InsufficientStock { available: 10 })
        ));
        assert_eq!(backend.calls(), 0);

        store.update_quantity(CartItemId::new(1), 10).await.unwrap();
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CartError::InsufficientStock { available: 2 }.user_message("Erro"),
            "Apenas 2 unidade(s) em estoque"
        );
        assert_eq!(
            CartError::Api(ApiError::EmptyBody).user_message("Erro ao atualizar quantidade"),
            "Erro ao atualizar quantidade"
        );
    }
}
