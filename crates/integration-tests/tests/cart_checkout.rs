//! Cart and checkout against a running storefront and backend.
//!
//! Needs at least one product in stock; the first product on the catalog
//! page is used.

use mix_catalogo_core::OrderStatus;
use mix_catalogo_integration_tests::{TestContext, location};
use reqwest::StatusCode;

/// First `/produto/{id}` link on the catalog page.
async fn first_product_id(ctx: &TestContext) -> String {
    let body = ctx
        .get("/produtos")
        .await
        .text()
        .await
        .expect("Failed to read body");
    let start = body.find("/produto/").expect("Catalog has no products") + "/produto/".len();
    body.get(start..)
        .and_then(|rest| rest.split('"').next())
        .expect("Malformed product link")
        .to_string()
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_anonymous_add_is_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .post_form("/carrinho/adicionar", &[("produto_id", "1"), ("quantidade", "1")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = ctx
        .get("/carrinho")
        .await
        .text()
        .await
        .expect("Failed to read body");
    assert!(body.contains("Faça login"));
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_htmx_add_returns_badge() {
    let ctx = TestContext::new();
    ctx.register_customer().await;
    let product_id = first_product_id(&ctx).await;

    let response = ctx
        .client
        .post(ctx.url("/carrinho/adicionar"))
        .header("hx-request", "true")
        .form(&[("produto_id", product_id.as_str()), ("quantidade", "1")])
        .send()
        .await
        .expect("Storefront unreachable");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("hx-trigger").and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("id=\"cart-count\""));
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_checkout_creates_trackable_order() {
    let ctx = TestContext::new();
    ctx.register_customer().await;
    let product_id = first_product_id(&ctx).await;

    ctx.post_form(
        "/carrinho/adicionar",
        &[("produto_id", product_id.as_str()), ("quantidade", "1")],
    )
    .await;

    let form = ctx.get("/checkout").await;
    assert_eq!(form.status(), StatusCode::OK);

    let response = ctx
        .post_form(
            "/checkout",
            &[
                ("cliente_nome", "Cliente Teste"),
                ("cliente_email", "cliente@example.com"),
                ("cliente_telefone", "11999999999"),
                ("cliente_endereco", "Rua das Flores, 100"),
                ("observacoes", ""),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("Failed to read body");
    let start = body
        .find("class=\"order-number\">")
        .expect("No order number on success page")
        + "class=\"order-number\">".len();
    let number = body
        .get(start..)
        .and_then(|rest| rest.split('<').next())
        .expect("Malformed order number")
        .trim()
        .to_string();

    // The cart is empty afterwards, so checkout sends the shopper back
    let checkout = ctx.get("/checkout").await;
    assert_eq!(location(&checkout), "/carrinho");

    let tracking = ctx.get(&format!("/rastreamento?numero={number}")).await;
    let body = tracking.text().await.expect("Failed to read body");
    assert!(body.contains(OrderStatus::Pending.label()));
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_empty_cart_checkout_redirects() {
    let ctx = TestContext::new();
    ctx.register_customer().await;

    let response = ctx.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/carrinho");
}
