//! Authentication and profile endpoints.

use reqwest::Method;

use super::{ApiClient, ApiError, ApiToken, AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, User};

impl ApiClient {
    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest { email, password };
        let builder = self.request(Method::POST, "/auth/login", None)?.json(&body);
        self.fetch(builder).await
    }

    /// `POST /auth/register`.
    ///
    /// When `token` is given the account is created on behalf of that user
    /// (admins creating vendors).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the registration.
    #[tracing::instrument(skip(self, token, request), fields(email = %request.email, role = %request.role))]
    pub async fn register(
        &self,
        token: Option<&ApiToken>,
        request: &RegisterRequest<'_>,
    ) -> Result<AuthResponse, ApiError> {
        let builder = self
            .request(Method::POST, "/auth/register", token)?
            .json(request);
        self.fetch(builder).await
    }

    /// `GET /auth/perfil`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    pub async fn profile(&self, token: &ApiToken) -> Result<User, ApiError> {
        let builder = self.request(Method::GET, "/auth/perfil", Some(token))?;
        self.fetch(builder).await
    }

    /// `PUT /auth/perfil`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the backend rejects the update.
    #[tracing::instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &ApiToken,
        update: &ProfileUpdate<'_>,
    ) -> Result<User, ApiError> {
        let builder = self
            .request(Method::PUT, "/auth/perfil", Some(token))?
            .json(update);
        self.fetch(builder).await
    }
}
