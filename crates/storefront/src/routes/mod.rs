//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Home page
//! GET  /health                      - Health check
//! GET  /health/ready                - Readiness check (session database)
//!
//! # Catalog
//! GET  /produtos                    - Catalog (q, categoria, precoMin, precoMax)
//! GET  /produto/{id}                - Product detail with similar products
//!
//! # Cart
//! GET  /carrinho                    - Cart page
//! POST /carrinho/adicionar          - Add item (HTMX: count fragment + cartUpdated)
//! POST /carrinho/itens/{id}         - Update quantity
//! POST /carrinho/itens/{id}/remover - Remove item
//! POST /carrinho/limpar             - Clear cart
//! GET  /carrinho/contagem           - Cart count badge (fragment)
//!
//! # Checkout and tracking
//! GET  /checkout                    - Checkout form
//! POST /checkout                    - Create order
//! GET  /rastreamento                - Order tracking (?numero=)
//!
//! # Auth (POSTs rate limited)
//! GET  /login, POST /login          - Customer login
//! GET  /cadastro, POST /cadastro    - Registration
//! POST /logout                      - Logout
//!
//! # Back-office (staff; vendors admin only)
//! GET  /admin                       - Redirect to dashboard
//! GET  /admin/login, POST /admin/login
//! GET  /admin/dashboard
//! GET  /admin/categorias            POST /admin/categorias[/{id}[/excluir]]
//! GET  /admin/produtos[/novo|/{id}/editar]  POST /admin/produtos[/{id}[/excluir]]
//! GET  /admin/promocoes             POST /admin/promocoes/{id}[/remover]
//! GET  /admin/pedidos[/{id}]        POST /admin/pedidos/{id}/status|cancelar
//! GET  /admin/vendedores            POST /admin/vendedores[/{id}/excluir]
//! GET  /admin/perfil                POST /admin/perfil
//!
//! *    anything else                - Redirect to /
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod tracking;

use axum::{
    Router,
    handler::Handler,
    response::Redirect,
    routing::{MethodRouter, get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// `POST` route behind the per-IP login rate limiter.
fn rate_limited<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler).route_layer(auth_rate_limiter())
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/produtos", get(products::index))
        .route("/produto/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/adicionar", post(cart::add))
        .route("/itens/{id}", post(cart::update))
        .route("/itens/{id}/remover", post(cart::remove))
        .route("/limpar", post(cart::clear))
        .route("/contagem", get(cart::count))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(rate_limited(auth::login)),
        )
        .route(
            "/cadastro",
            get(auth::register_page).merge(rate_limited(auth::register)),
        )
        .route("/logout", post(auth::logout))
}

/// Create the back-office routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route(
            "/login",
            get(auth::admin_login_page).merge(rate_limited(auth::admin_login)),
        )
        .route("/dashboard", get(admin::dashboard::show))
        .route(
            "/categorias",
            get(admin::categories::index).post(admin::categories::create),
        )
        .route("/categorias/{id}", post(admin::categories::update))
        .route("/categorias/{id}/excluir", post(admin::categories::delete))
        .route(
            "/produtos",
            get(admin::products::index).post(admin::products::create),
        )
        .route("/produtos/novo", get(admin::products::new))
        .route("/produtos/{id}", post(admin::products::update))
        .route("/produtos/{id}/editar", get(admin::products::edit))
        .route("/produtos/{id}/excluir", post(admin::products::delete))
        .route("/promocoes", get(admin::promotions::index))
        .route("/promocoes/{id}", post(admin::promotions::set))
        .route("/promocoes/{id}/remover", post(admin::promotions::remove))
        .route("/pedidos", get(admin::orders::index))
        .route("/pedidos/{id}", get(admin::orders::show))
        .route("/pedidos/{id}/status", post(admin::orders::update_status))
        .route("/pedidos/{id}/cancelar", post(admin::orders::cancel))
        .route(
            "/vendedores",
            get(admin::vendors::index).post(admin::vendors::create),
        )
        .route("/vendedores/{id}/excluir", post(admin::vendors::delete))
        .route(
            "/perfil",
            get(admin::profile::show).post(admin::profile::update),
        )
}

/// Unknown paths go back to the home page.
async fn fallback() -> Redirect {
    Redirect::to("/")
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .nest("/carrinho", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/rastreamento", get(tracking::track))
        .merge(auth_routes())
        .nest("/admin", admin_routes())
        .fallback(fallback)
}
