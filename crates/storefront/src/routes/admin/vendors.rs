//! Vendor accounts, managed by administrators only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mix_catalogo_core::{Email, UserId};

use crate::api::User;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::models::Toast;
use crate::routes::admin::{finish, optional};
use crate::services::flash;
use crate::services::session::MIN_PASSWORD_LENGTH;
use crate::state::AppState;

const BACK: &str = "/admin/vendedores";

/// Vendor row data for templates.
#[derive(Clone)]
pub struct VendorView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: Option<String>,
}

impl From<&User> for VendorView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i32(),
            name: user.name.clone(),
            email: user.email.as_str().to_string(),
            phone: user.phone.clone().unwrap_or_default(),
            created_at: user.created_at.map(|at| at.format("%d/%m/%Y").to_string()),
        }
    }
}

/// New vendor form data.
#[derive(Deserialize)]
pub struct VendorForm {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub senha: String,
}

impl std::fmt::Debug for VendorForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorForm")
            .field("nome", &self.nome)
            .field("email", &self.email)
            .field("senha", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl VendorForm {
    /// Check the fields the backend would otherwise reject.
    ///
    /// # Errors
    ///
    /// Returns the message to show for the first invalid field.
    pub fn validate(&self) -> std::result::Result<Email, String> {
        if optional(&self.nome).is_none() || self.email.trim().is_empty() {
            return Err("Preencha todos os campos obrigatórios".to_string());
        }
        let email = Email::parse(self.email.trim()).map_err(|e| e.to_string())?;
        if self.senha.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "A senha deve ter no mínimo {MIN_PASSWORD_LENGTH} caracteres"
            ));
        }
        Ok(email)
    }
}

/// Vendor listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/vendors.html")]
pub struct VendorsTemplate {
    pub ctx: PageContext,
    pub vendors: Vec<VendorView>,
    pub min_password: usize,
}

/// List vendors.
#[instrument(skip(auth, state, ctx))]
pub async fn index(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    mut ctx: PageContext,
) -> Result<impl IntoResponse> {
    let vendors = match state.api().vendors(&auth.token).await {
        Ok(vendors) => vendors.iter().map(VendorView::from).collect(),
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load vendors");
            ctx.toast = Some(Toast::error("Erro ao carregar vendedores"));
            Vec::new()
        }
    };

    Ok(VendorsTemplate {
        ctx,
        vendors,
        min_password: MIN_PASSWORD_LENGTH,
    })
}

/// Create a vendor account.
#[instrument(skip(auth, state, session))]
pub async fn create(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<VendorForm>,
) -> Result<Redirect> {
    let email = match form.validate() {
        Ok(email) => email,
        Err(message) => {
            flash::error(&session, message).await;
            return Ok(Redirect::to(BACK));
        }
    };
    let phone = optional(&form.telefone);
    let result = state
        .api()
        .create_vendor(
            &auth.token,
            email.as_str(),
            &form.senha,
            form.nome.trim(),
            phone.as_deref(),
        )
        .await;
    if let Ok(user) = &result {
        tracing::info!(vendor_id = %user.id, "Vendor created");
    }
    finish(
        &session,
        result,
        "Vendedor criado com sucesso!",
        "Erro ao criar vendedor",
        BACK,
    )
    .await
}

/// Delete a vendor account.
#[instrument(skip(auth, state, session))]
pub async fn delete(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let result = state.api().delete_vendor(&auth.token, UserId::new(id)).await;
    finish(
        &session,
        result,
        "Vendedor excluído com sucesso",
        "Erro ao excluir vendedor",
        BACK,
    )
    .await
}
