//! The signed-in staff member's own profile.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::models::SessionUser;
use crate::services::{AuthError, SessionStore, flash};
use crate::state::AppState;

const BACK: &str = "/admin/perfil";

/// Profile form data. The email address cannot be changed.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub telefone: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: &'static str,
}

impl ProfileTemplate {
    fn new(ctx: PageContext, user: &SessionUser) -> Self {
        Self {
            ctx,
            name: user.name.clone(),
            email: user.email.as_str().to_string(),
            phone: user.phone.clone().unwrap_or_default(),
            role: user.role.label(),
        }
    }
}

/// Show the profile form.
#[instrument(skip(auth, ctx))]
pub async fn show(RequireStaff(auth): RequireStaff, ctx: PageContext) -> impl IntoResponse {
    ProfileTemplate::new(ctx, &auth.user)
}

/// Save name and phone, refreshing the cached user.
#[instrument(skip(_auth, state, session))]
pub async fn update(
    RequireStaff(_auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect> {
    let result = SessionStore::new(&session, state.api())
        .update_profile(&form.nome, Some(form.telefone.as_str()))
        .await;

    match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Profile updated");
            flash::success(&session, "Perfil atualizado com sucesso!").await;
        }
        Err(AuthError::Api(e)) if e.is_unauthorized() => return Err(AppError::from(e)),
        Err(e) => {
            tracing::warn!(error = %e, "Profile update failed");
            flash::error(&session, e.user_message("Erro ao atualizar perfil")).await;
        }
    }
    Ok(Redirect::to(BACK))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mix_catalogo_core::{Email, UserId, UserRole};

    use super::*;

    #[test]
    fn test_profile_shows_role_label() {
        let user = SessionUser {
            id: UserId::new(3),
            email: Email::parse("vendedor@mix.com.br").unwrap(),
            name: "Carla".to_string(),
            role: UserRole::Vendor,
            phone: None,
        };
        let template = ProfileTemplate::new(PageContext::default(), &user);

        assert_eq!(template.role, UserRole::Vendor.label());
        assert_eq!(template.phone, "");
        assert_eq!(template.email, "vendedor@mix.com.br");
    }
}
