//! Vendor account management (admin only).

use mix_catalogo_core::{UserId, UserRole};
use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError, ApiToken, RegisterRequest, User};

impl ApiClient {
    /// `GET /auth/usuarios`, keeping only vendor accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn vendors(&self, token: &ApiToken) -> Result<Vec<User>, ApiError> {
        let builder = self.request(Method::GET, "/auth/usuarios", Some(token))?;
        let users: Vec<User> = self.fetch_optional(builder).await?.unwrap_or_default();
        Ok(users
            .into_iter()
            .filter(|user| user.role == UserRole::Vendor)
            .collect())
    }

    /// Create a vendor account through `POST /auth/register`.
    ///
    /// The token the backend issues for the new account is discarded; the
    /// admin's own session is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    pub async fn create_vendor(
        &self,
        token: &ApiToken,
        email: &str,
        password: &str,
        name: &str,
        phone: Option<&str>,
    ) -> Result<User, ApiError> {
        let request = RegisterRequest {
            email,
            password,
            name,
            role: UserRole::Vendor,
            phone,
        };
        self.register(Some(token), &request)
            .await
            .map(|auth| auth.user)
    }

    /// `DELETE /auth/usuarios/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn delete_vendor(&self, token: &ApiToken, id: UserId) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/auth/usuarios/{id}"), Some(token))?;
        self.execute(builder).await
    }
}
