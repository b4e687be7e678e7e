//! Authentication route handlers.
//!
//! Login and registration go through the MIX backend; the returned token and
//! user are kept together in the server-side session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mix_catalogo_core::UserRole;

use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::Toast;
use crate::services::session::post_login_path;
use crate::services::{AuthError, Registration, SessionStore, flash};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub senha: String,
    pub redirect: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("senha", &"[REDACTED]")
            .field("redirect", &self.redirect)
            .finish()
    }
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub senha: String,
    #[serde(default)]
    pub confirmar_senha: String,
    pub tipo: Option<String>,
}

impl RegisterForm {
    /// Requested account type; anything unrecognised means customer.
    fn role(&self) -> UserRole {
        self.tipo
            .as_deref()
            .and_then(|tipo| tipo.parse().ok())
            .unwrap_or(UserRole::Customer)
    }

    fn registration(&self) -> Registration<'_> {
        Registration {
            name: &self.nome,
            email: &self.email,
            password: &self.senha,
            password_confirmation: &self.confirmar_senha,
            phone: Some(self.telefone.as_str()),
            role: self.role(),
        }
    }
}

/// Query parameters for the login pages.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template, shared by the shop and the back-office.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub action: &'static str,
    pub title: &'static str,
    pub email: String,
    pub redirect: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub vendor: bool,
}

impl LoginTemplate {
    fn shop(ctx: PageContext, email: String, redirect: Option<String>) -> Self {
        Self {
            ctx,
            action: "/login",
            title: "Bem-vindo de volta",
            email,
            redirect: redirect.unwrap_or_default(),
        }
    }

    fn admin(ctx: PageContext, email: String, redirect: Option<String>) -> Self {
        Self {
            ctx,
            action: "/admin/login",
            title: "Painel Administrativo",
            email,
            redirect: redirect.unwrap_or_default(),
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page; signed-in users are sent on.
pub async fn login_page(ctx: PageContext, Query(query): Query<LoginQuery>) -> Response {
    let signed_in = ctx
        .user
        .as_ref()
        .map(|user| post_login_path(user, query.redirect.as_deref()));
    if let Some(target) = signed_in {
        return ctx.redirect(&target).await.into_response();
    }
    LoginTemplate::shop(ctx, String::new(), query.redirect).into_response()
}

/// Display the back-office login page.
pub async fn admin_login_page(ctx: PageContext, Query(query): Query<LoginQuery>) -> Response {
    let signed_in = ctx
        .user
        .as_ref()
        .filter(|user| user.is_staff())
        .map(|user| post_login_path(user, query.redirect.as_deref()));
    if let Some(target) = signed_in {
        return ctx.redirect(&target).await.into_response();
    }
    LoginTemplate::admin(ctx, String::new(), query.redirect).into_response()
}

/// Authenticate; on failure the form is shown again with the backend's message.
async fn authenticate(
    state: &AppState,
    session: &Session,
    form: &LoginForm,
) -> Result<std::result::Result<String, String>> {
    let store = SessionStore::new(session, state.api());
    match store.login(&form.email, &form.senha).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
            flash::success(session, "Login realizado com sucesso!").await;
            Ok(Ok(post_login_path(&user, form.redirect.as_deref())))
        }
        Err(AuthError::Session(e)) => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Ok(Err(e.user_message("Erro ao fazer login")))
        }
    }
}

/// Handle shop login.
#[instrument(skip(state, session, ctx))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match authenticate(&state, &session, &form).await? {
        Ok(target) => Ok(Redirect::to(&target).into_response()),
        Err(message) => {
            ctx.toast = Some(Toast::error(message));
            Ok(LoginTemplate::shop(ctx, form.email, form.redirect).into_response())
        }
    }
}

/// Handle back-office login.
#[instrument(skip(state, session, ctx))]
pub async fn admin_login(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match authenticate(&state, &session, &form).await? {
        Ok(target) => Ok(Redirect::to(&target).into_response()),
        Err(message) => {
            ctx.toast = Some(Toast::error(message));
            Ok(LoginTemplate::admin(ctx, form.email, form.redirect).into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(ctx: PageContext) -> Response {
    if let Some(home) = ctx.user.as_ref().map(|user| user.role.home_path()) {
        return ctx.redirect(home).await.into_response();
    }
    RegisterTemplate {
        ctx,
        name: String::new(),
        email: String::new(),
        phone: String::new(),
        vendor: false,
    }
    .into_response()
}

/// Handle registration as a customer or vendor.
#[instrument(skip(state, session, ctx, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let store = SessionStore::new(&session, state.api());
    match store.register(&form.registration()).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %user.role, "Account created");
            flash::success(&session, "Cadastro realizado com sucesso!").await;
            Ok(Redirect::to(user.role.home_path()).into_response())
        }
        Err(AuthError::Session(e)) => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            ctx.toast = Some(Toast::error(e.user_message("Erro ao fazer cadastro")));
            let vendor = form.role() == UserRole::Vendor;
            Ok(RegisterTemplate {
                ctx,
                name: form.nome,
                email: form.email,
                phone: form.telefone,
                vendor,
            }
            .into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    SessionStore::new(&session, state.api()).logout().await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(tipo: Option<&str>) -> RegisterForm {
        RegisterForm {
            nome: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            telefone: String::new(),
            senha: "segredo".to_string(),
            confirmar_senha: "segredo".to_string(),
            tipo: tipo.map(str::to_string),
        }
    }

    #[test]
    fn test_register_form_role() {
        assert_eq!(form(None).role(), UserRole::Customer);
        assert_eq!(form(Some("vendedor")).role(), UserRole::Vendor);
        assert_eq!(form(Some("qualquer")).role(), UserRole::Customer);
    }

    #[test]
    fn test_admin_self_registration_is_rejected() {
        let form = form(Some("admin"));
        assert!(matches!(
            form.registration().validate(),
            Err(AuthError::RoleNotAllowed(UserRole::Admin))
        ));
    }

    #[test]
    fn test_login_form_debug_hides_password() {
        let form = LoginForm {
            email: "ana@example.com".to_string(),
            senha: "segredo".to_string(),
            redirect: None,
        };
        assert!(!format!("{form:?}").contains("segredo"));
    }
}
