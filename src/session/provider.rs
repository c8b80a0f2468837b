//! The seam between the session store and the identity service

use async_trait::async_trait;
use supabase_todo_auth::{Auth, AuthError, AuthStateChange};
use tokio::sync::broadcast;

use super::types::Identity;

/// An external service that signs users in and issues access tokens
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Create an account. Returns the identity when the account is usable
    /// right away, `None` when the email still has to be confirmed.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<Identity>, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The identity of an existing session, if any
    async fn current_session(&self) -> Result<Option<Identity>, AuthError>;

    /// A currently valid access token, if signed in
    async fn access_token(&self) -> Result<Option<String>, AuthError>;

    /// Sign in, sign out and token refresh events from now on
    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange>;
}

#[async_trait]
impl SessionProvider for Auth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<Identity>, AuthError> {
        let response = Auth::sign_up(self, email, password, Some(display_name)).await?;
        Ok(response.session.map(|s| Identity::from(&s.user)))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let session = self.sign_in_with_password(email, password).await?;
        Ok(Identity::from(&session.user))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Auth::sign_out(self).await
    }

    async fn current_session(&self) -> Result<Option<Identity>, AuthError> {
        Ok(self.get_session().await?.map(|s| Identity::from(&s.user)))
    }

    async fn access_token(&self) -> Result<Option<String>, AuthError> {
        self.get_access_token().await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.on_auth_state_change()
    }
}
