//! Wire types for the MIX REST backend.
//!
//! Field names follow the backend's JSON (`nome`, `preco`, `itens`, ...);
//! Rust names are English. Response types also derive `Serialize` because
//! carts are kept in the session between requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mix_catalogo_core::{
    CartId, CartItemId, CategoryId, Email, OrderId, OrderItemId, OrderStatus, Price,
    PriceBreakdown, ProductId, UserId, UserRole, pricing,
};

// =============================================================================
// Users & Auth
// =============================================================================

/// A MIX user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "tipo")]
    pub role: UserRole,
    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response of `/auth/login` and `/auth/register`.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "usuario")]
    pub user: User,
}

/// Login credentials.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    #[serde(rename = "senha")]
    pub password: &'a str,
}

/// Account registration payload.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    #[serde(rename = "senha")]
    pub password: &'a str,
    #[serde(rename = "nome")]
    pub name: &'a str,
    #[serde(rename = "tipo")]
    pub role: UserRole,
    #[serde(rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

/// Profile edit payload.
#[derive(Debug, Serialize)]
pub struct ProfileUpdate<'a> {
    #[serde(rename = "nome")]
    pub name: &'a str,
    #[serde(rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Category create/update payload.
#[derive(Debug, Serialize)]
pub struct CategoryInput {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "preco")]
    pub price: Price,
    #[serde(rename = "precoPromocional", default)]
    pub promotional_price: Option<Price>,
    #[serde(rename = "emPromocao", default)]
    pub on_promotion: bool,
    #[serde(rename = "quantidade", default)]
    pub stock_quantity: u32,
    #[serde(rename = "categoriaId", default)]
    pub category_id: Option<CategoryId>,
    #[serde(rename = "categoria", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(rename = "vendedorId", default)]
    pub vendor_id: Option<UserId>,
    #[serde(rename = "cor", default)]
    pub color: Option<String>,
    #[serde(rename = "tamanho", default)]
    pub size: Option<String>,
    #[serde(rename = "imagem", default)]
    pub image_url: Option<String>,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
}

impl Product {
    /// Effective price and discount for this product.
    #[must_use]
    pub fn pricing(&self) -> PriceBreakdown {
        pricing::derive(self.price, self.promotional_price, self.on_promotion)
    }

    /// Whether any unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Category name when the backend embedded it.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

/// Product create/update payload.
///
/// Money goes out as JSON numbers.
#[derive(Debug, Clone, Serialize)]
pub struct ProductInput {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "preco", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imagem", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "quantidade")]
    pub stock_quantity: u32,
    #[serde(rename = "categoriaId", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(rename = "cor", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "tamanho", skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// Payload of `PUT /produtos/{id}/promocao`.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionInput {
    #[serde(rename = "emPromocao")]
    pub on_promotion: bool,
    #[serde(
        rename = "precoPromocional",
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub promotional_price: Option<Decimal>,
}

impl PromotionInput {
    /// Turn a promotion on at the given price.
    #[must_use]
    pub const fn enable(price: Decimal) -> Self {
        Self {
            on_promotion: true,
            promotional_price: Some(price),
        }
    }

    /// Turn a promotion off.
    #[must_use]
    pub const fn disable() -> Self {
        Self {
            on_promotion: false,
            promotional_price: None,
        }
    }
}

/// Query parameters of the advanced product filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductFilters {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(rename = "precoMin", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(rename = "precoMax", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(rename = "cor", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "tamanho", skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(rename = "categoriaId", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl ProductFilters {
    /// Whether no filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The search text, when it is the only filter set.
    #[must_use]
    pub fn only_query(&self) -> Option<&str> {
        let q = self.q.as_deref()?;
        let alone = Self {
            q: self.q.clone(),
            ..Self::default()
        };
        (*self == alone).then_some(q)
    }

    /// The category, when it is the only filter set.
    #[must_use]
    pub fn only_category(&self) -> Option<CategoryId> {
        let id = self.category_id?;
        let alone = Self {
            category_id: Some(id),
            ..Self::default()
        };
        (*self == alone).then_some(id)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A line in the user's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    #[serde(rename = "produtoId")]
    pub product_id: ProductId,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "produto")]
    pub product: Product,
}

impl CartItem {
    /// Effective line total.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.pricing().line_total(self.quantity)
    }
}

/// The authenticated user's cart as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    #[serde(rename = "itens", default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of effective unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by id.
    #[must_use]
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Find the line holding a product.
    #[must_use]
    pub fn item_for_product(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

/// Payload of `POST /carrinho/adicionar`.
#[derive(Debug, Serialize)]
pub struct AddToCartInput {
    #[serde(rename = "produtoId")]
    pub product_id: ProductId,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
}

/// Payload of `PUT /carrinho/itens/{id}`.
#[derive(Debug, Serialize)]
pub struct UpdateCartItemInput {
    #[serde(rename = "quantidade")]
    pub quantity: u32,
}

// =============================================================================
// Orders
// =============================================================================

/// A line of a placed order, priced at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    #[serde(rename = "produtoId")]
    pub product_id: ProductId,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "precoUnitario")]
    pub unit_price: Price,
    #[serde(rename = "produto", default)]
    pub product: Option<Product>,
}

impl OrderItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    /// Product name, or a placeholder when the backend did not embed it.
    #[must_use]
    pub fn product_name(&self) -> String {
        self.product
            .as_ref()
            .map_or_else(|| format!("Produto #{}", self.product_id), |p| p.name.clone())
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "numero")]
    pub number: String,
    pub status: OrderStatus,
    pub total: Price,
    #[serde(rename = "clienteNome")]
    pub customer_name: String,
    #[serde(rename = "clienteEmail")]
    pub customer_email: String,
    #[serde(rename = "clienteTelefone", default)]
    pub customer_phone: String,
    #[serde(rename = "clienteEndereco", default)]
    pub customer_address: String,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
    #[serde(rename = "itens", default)]
    pub items: Vec<OrderItem>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A line of a new order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineInput {
    #[serde(rename = "produtoId")]
    pub product_id: ProductId,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "precoUnitario", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Payload of `POST /pedidos`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderInput {
    #[serde(rename = "clienteNome")]
    pub customer_name: String,
    #[serde(rename = "clienteEmail")]
    pub customer_email: String,
    #[serde(rename = "clienteTelefone")]
    pub customer_phone: String,
    #[serde(rename = "clienteEndereco")]
    pub customer_address: String,
    #[serde(rename = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "itens")]
    pub items: Vec<OrderLineInput>,
}

impl CreateOrderInput {
    /// Order lines for a cart, each priced at the effective unit price.
    #[must_use]
    pub fn lines_from_cart(cart: &Cart) -> Vec<OrderLineInput> {
        cart.items
            .iter()
            .map(|item| OrderLineInput {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.product.pricing().effective.amount(),
            })
            .collect()
    }
}

/// Payload of `PUT /pedidos/{id}/status`.
#[derive(Debug, Serialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product_json(id: i32, price: f64, promo: Option<f64>, flag: bool) -> serde_json::Value {
        json!({
            "id": id,
            "nome": format!("Produto {id}"),
            "preco": price,
            "precoPromocional": promo,
            "emPromocao": flag,
            "quantidade": 10,
            "categoriaId": 1,
            "vendedorId": 2,
            "imagem": null
        })
    }

    #[test]
    fn test_product_decodes_numbers_and_strings() {
        let product: Product = serde_json::from_value(json!({
            "id": 1,
            "nome": "Vestido",
            "preco": "100.00",
            "precoPromocional": 80,
            "emPromocao": true,
            "quantidade": 3,
            "vendedorId": 2
        }))
        .unwrap();
        assert_eq!(product.price, Price::from_cents(10_000));
        assert_eq!(product.promotional_price, Some(Price::from_cents(8_000)));
        assert_eq!(product.pricing().badge().as_deref(), Some("-20%"));
        assert_eq!(product.category_id, None);
    }

    #[test]
    fn test_cart_totals_use_effective_price() {
        let cart: Cart = serde_json::from_value(json!({
            "id": 5,
            "itens": [
                {"id": 1, "produtoId": 1, "quantidade": 2, "produto": product_json(1, 100.0, Some(80.0), true)},
                {"id": 2, "produtoId": 2, "quantidade": 1, "produto": product_json(2, 50.0, Some(40.0), false)}
            ]
        }))
        .unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total(), Price::from_cents(21_000));
    }

    #[test]
    fn test_cart_survives_session_round_trip() {
        let cart: Cart = serde_json::from_value(json!({
            "id": 5,
            "itens": [{"id": 1, "produtoId": 1, "quantidade": 2, "produto": product_json(1, 19.99, None, false)}]
        }))
        .unwrap();
        let stored = serde_json::to_value(&cart).unwrap();
        let restored: Cart = serde_json::from_value(stored).unwrap();
        assert_eq!(restored.total(), cart.total());
        assert_eq!(restored.items.len(), 1);
    }

    #[test]
    fn test_order_lines_carry_effective_price() {
        let cart: Cart = serde_json::from_value(json!({
            "id": 5,
            "itens": [{"id": 1, "produtoId": 7, "quantidade": 2, "produto": product_json(7, 100.0, Some(80.0), true)}]
        }))
        .unwrap();
        let lines = CreateOrderInput::lines_from_cart(&cart);
        let body = serde_json::to_value(&lines).unwrap();
        assert_eq!(body, json!([{"produtoId": 7, "quantidade": 2, "precoUnitario": 80.0}]));
    }

    #[test]
    fn test_promotion_input_wire_format() {
        let on = serde_json::to_value(PromotionInput::enable(Decimal::new(7990, 2))).unwrap();
        assert_eq!(on, json!({"emPromocao": true, "precoPromocional": 79.9}));
        let off = serde_json::to_value(PromotionInput::disable()).unwrap();
        assert_eq!(off, json!({"emPromocao": false}));
    }

    #[test]
    fn test_order_decodes_status() {
        let order: Order = serde_json::from_value(json!({
            "id": 3,
            "numero": "PED-0003",
            "status": "enviado",
            "total": 160.5,
            "clienteNome": "Ana",
            "clienteEmail": "ana@mix.com",
            "clienteTelefone": "11999990000",
            "clienteEndereco": "Rua A, 1",
            "itens": []
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.total.plain(), "160.50");
    }

    #[test]
    fn test_filters_is_empty() {
        assert!(ProductFilters::default().is_empty());
        let filters = ProductFilters {
            q: Some("vestido".to_string()),
            ..ProductFilters::default()
        };
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_single_filter_shortcuts() {
        let search = ProductFilters {
            q: Some("vestido".to_string()),
            ..ProductFilters::default()
        };
        assert_eq!(search.only_query(), Some("vestido"));
        assert_eq!(search.only_category(), None);

        let category = ProductFilters {
            category_id: Some(CategoryId::new(3)),
            ..ProductFilters::default()
        };
        assert_eq!(category.only_category(), Some(CategoryId::new(3)));

        let both = ProductFilters {
            category_id: Some(CategoryId::new(3)),
            ..search
        };
        assert_eq!(both.only_query(), None);
        assert_eq!(both.only_category(), None);
    }
}
