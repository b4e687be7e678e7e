//! Product management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mix_catalogo_core::{CategoryId, ProductId};

use crate::api::{ApiToken, Product, ProductInput};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::models::Toast;
use crate::routes::admin::{finish, optional};
use crate::routes::products::{CategoryOption, ProductView};
use crate::services::flash;
use crate::state::AppState;

const BACK: &str = "/admin/produtos";

/// Product form contents, kept as text so a rejected form can be shown again.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub preco: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub imagem: String,
    #[serde(default)]
    pub quantidade: String,
    #[serde(default)]
    pub categoria_id: String,
    #[serde(default)]
    pub cor: String,
    #[serde(default)]
    pub tamanho: String,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            nome: product.name.clone(),
            preco: product.price.plain(),
            descricao: product.description.clone().unwrap_or_default(),
            imagem: product.image_url.clone().unwrap_or_default(),
            quantidade: product.stock_quantity.to_string(),
            categoria_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            cor: product.color.clone().unwrap_or_default(),
            tamanho: product.size.clone().unwrap_or_default(),
        }
    }
}

impl ProductForm {
    fn category_id(&self) -> Option<CategoryId> {
        self.categoria_id.trim().parse().ok()
    }

    /// Validate and convert.
    ///
    /// # Errors
    ///
    /// Returns the message to show for the first invalid field.
    pub fn input(&self) -> std::result::Result<ProductInput, &'static str> {
        let name = optional(&self.nome).ok_or("Informe o nome do produto")?;
        let price: Decimal = self
            .preco
            .trim()
            .replace(',', ".")
            .parse()
            .ok()
            .filter(|price: &Decimal| *price > Decimal::ZERO)
            .ok_or("Informe um preço válido")?;
        let quantity = match self.quantidade.trim() {
            "" => 0,
            value => value.parse().map_err(|_| "Informe uma quantidade válida")?,
        };

        Ok(ProductInput {
            name,
            price,
            description: optional(&self.descricao),
            image_url: optional(&self.imagem),
            stock_quantity: quantity,
            category_id: self.category_id(),
            color: optional(&self.cor),
            size: optional(&self.tamanho),
        })
    }
}

/// Listing query.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub busca: Option<String>,
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ProductsTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductView>,
    pub search: String,
}

/// New/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    /// `None` when creating.
    pub product_id: Option<i32>,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
}

impl ProductFormTemplate {
    fn action(&self) -> String {
        self.product_id
            .map_or_else(|| BACK.to_string(), |id| format!("{BACK}/{id}"))
    }
}

/// Render the form with the category select filled in.
async fn form_page(
    state: &AppState,
    ctx: PageContext,
    product_id: Option<i32>,
    form: ProductForm,
) -> Response {
    let categories = match state.api().categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories for product form");
            Vec::new()
        }
    };
    let categories = CategoryOption::list(&categories, form.category_id());
    ProductFormTemplate {
        ctx,
        product_id,
        form,
        categories,
    }
    .into_response()
}

/// List products, optionally searching by name.
#[instrument(skip(auth, state, ctx))]
pub async fn index(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    mut ctx: PageContext,
    Query(query): Query<ProductsQuery>,
) -> Result<impl IntoResponse> {
    let search = query.busca.as_deref().map(str::trim).unwrap_or_default();
    let listing = if search.is_empty() {
        state.api().products(Some(&auth.token)).await
    } else {
        state
            .api()
            .search_products_by_name(Some(&auth.token), search)
            .await
    };

    let products = match listing {
        Ok(products) => products.iter().map(ProductView::from).collect(),
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products");
            ctx.toast = Some(Toast::error("Erro ao carregar produtos"));
            Vec::new()
        }
    };

    Ok(ProductsTemplate {
        ctx,
        products,
        search: search.to_string(),
    })
}

/// Empty form for a new product.
#[instrument(skip(_auth, state, ctx))]
pub async fn new(
    RequireStaff(_auth): RequireStaff,
    State(state): State<AppState>,
    ctx: PageContext,
) -> Response {
    form_page(&state, ctx, None, ProductForm::default()).await
}

/// Form prefilled with an existing product.
#[instrument(skip(auth, state, session, ctx))]
pub async fn edit(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<Response> {
    match state.api().product(Some(&auth.token), ProductId::new(id)).await {
        Ok(product) => Ok(form_page(&state, ctx, Some(id), ProductForm::from(&product)).await),
        Err(e) => {
            flash::report_api_error(&session, e, "Erro ao carregar produto").await?;
            Ok(ctx.redirect(BACK).await.into_response())
        }
    }
}

/// Save a new or existing product; invalid or refused forms are shown again.
async fn save(
    state: &AppState,
    session: &Session,
    token: &ApiToken,
    mut ctx: PageContext,
    product_id: Option<i32>,
    form: ProductForm,
) -> Result<Response> {
    let input = match form.input() {
        Ok(input) => input,
        Err(message) => {
            ctx.toast = Some(Toast::error(message));
            return Ok(form_page(state, ctx, product_id, form).await);
        }
    };

    let (result, success) = match product_id {
        Some(id) => (
            state
                .api()
                .update_product(token, ProductId::new(id), &input)
                .await,
            "Produto atualizado com sucesso!",
        ),
        None => (
            state.api().create_product(token, &input).await.map(|_| ()),
            "Produto criado com sucesso!",
        ),
    };

    match result {
        Ok(()) => {
            tracing::info!(product_id = ?product_id, name = %input.name, "Product saved");
            flash::success(session, success).await;
            Ok(Redirect::to(BACK).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(AppError::from(e)),
        Err(e) => {
            tracing::warn!(error = %e, "Product save failed");
            ctx.toast = Some(Toast::error(e.user_message("Erro ao salvar produto")));
            Ok(form_page(state, ctx, product_id, form).await)
        }
    }
}

/// Create a product.
#[instrument(skip(auth, state, session, ctx))]
pub async fn create(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    save(&state, &session, &auth.token, ctx, None, form).await
}

/// Update a product.
#[instrument(skip(auth, state, session, ctx))]
pub async fn update(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    save(&state, &session, &auth.token, ctx, Some(id), form).await
}

/// Delete a product.
#[instrument(skip(auth, state, session))]
pub async fn delete(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let result = state
        .api()
        .delete_product(&auth.token, ProductId::new(id))
        .await;
    finish(
        &session,
        result,
        "Produto deletado com sucesso!",
        "Erro ao deletar produto",
        BACK,
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::fixtures;

    fn form() -> ProductForm {
        ProductForm {
            nome: "Vestido".to_string(),
            preco: "129,90".to_string(),
            quantidade: "5".to_string(),
            categoria_id: "2".to_string(),
            cor: " ".to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_product_form_input() {
        let input = form().input().unwrap();

        assert_eq!(input.price, Decimal::new(12990, 2));
        assert_eq!(input.stock_quantity, 5);
        assert_eq!(input.category_id, Some(CategoryId::new(2)));
        assert_eq!(input.color, None);
    }

    #[test]
    fn test_product_form_rejects_bad_values() {
        let mut bad_price = form();
        bad_price.preco = "0".to_string();
        assert_eq!(bad_price.input().unwrap_err(), "Informe um preço válido");

        let mut bad_quantity = form();
        bad_quantity.quantidade = "-1".to_string();
        assert_eq!(
            bad_quantity.input().unwrap_err(),
            "Informe uma quantidade válida"
        );

        let mut no_name = form();
        no_name.nome = String::new();
        assert_eq!(no_name.input().unwrap_err(), "Informe o nome do produto");
    }

    #[test]
    fn test_edit_form_prefills_from_product() {
        let product = fixtures::product(4, 59.9, None, false);
        let form = ProductForm::from(&product);

        assert_eq!(form.preco, "59.90");
        assert_eq!(form.quantidade, "10");
        assert_eq!(form.categoria_id, "1");
        assert!(form.input().is_ok());
    }

    #[test]
    fn test_form_action() {
        let template = ProductFormTemplate {
            ctx: PageContext::default(),
            product_id: Some(4),
            form: ProductForm::default(),
            categories: Vec::new(),
        };
        assert_eq!(template.action(), "/admin/produtos/4");
    }
}
