//! Category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mix_catalogo_core::CategoryId;

use crate::api::CategoryInput;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::models::Toast;
use crate::routes::admin::{finish, optional};
use crate::routes::home::CategoryView;
use crate::services::flash;
use crate::state::AppState;

const BACK: &str = "/admin/categorias";

/// Category form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub descricao: String,
}

impl CategoryForm {
    fn input(&self) -> Option<CategoryInput> {
        let name = optional(&self.nome)?;
        Some(CategoryInput {
            name,
            description: optional(&self.descricao),
        })
    }
}

/// Listing query; `editar` opens the edit form for one category.
#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    pub editar: Option<i32>,
}

/// Category listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
    pub categories: Vec<CategoryView>,
    pub editing: Option<CategoryView>,
}

/// List categories.
#[instrument(skip(_auth, state, ctx))]
pub async fn index(
    RequireStaff(_auth): RequireStaff,
    State(state): State<AppState>,
    mut ctx: PageContext,
    Query(query): Query<CategoriesQuery>,
) -> Result<impl IntoResponse> {
    let categories: Vec<CategoryView> = match state.api().categories().await {
        Ok(categories) => categories.iter().map(CategoryView::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories");
            ctx.toast = Some(Toast::error("Erro ao carregar categorias"));
            Vec::new()
        }
    };

    let editing = query
        .editar
        .and_then(|id| categories.iter().find(|c| c.id == id).cloned());

    Ok(CategoriesTemplate {
        ctx,
        categories,
        editing,
    })
}

/// Create a category.
#[instrument(skip(auth, state, session))]
pub async fn create(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let Some(input) = form.input() else {
        flash::error(&session, "Informe o nome da categoria").await;
        return Ok(Redirect::to(BACK));
    };
    let result = state.api().create_category(&auth.token, &input).await;
    finish(
        &session,
        result,
        "Categoria criada com sucesso!",
        "Erro ao salvar categoria",
        BACK,
    )
    .await
}

/// Update a category.
#[instrument(skip(auth, state, session))]
pub async fn update(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let Some(input) = form.input() else {
        flash::error(&session, "Informe o nome da categoria").await;
        return Ok(Redirect::to(&format!("{BACK}?editar={id}")));
    };
    let result = state
        .api()
        .update_category(&auth.token, CategoryId::new(id), &input)
        .await;
    finish(
        &session,
        result,
        "Categoria atualizada com sucesso!",
        "Erro ao salvar categoria",
        BACK,
    )
    .await
}

/// Delete a category.
#[instrument(skip(auth, state, session))]
pub async fn delete(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let result = state
        .api()
        .delete_category(&auth.token, CategoryId::new(id))
        .await;
    finish(
        &session,
        result,
        "Categoria deletada com sucesso!",
        "Erro ao deletar categoria",
        BACK,
    )
    .await
}
