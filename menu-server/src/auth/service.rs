//! Login page and session logic on top of an [`IdentityProvider`]

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::provider::{AuthError, IdentityProvider, Session};
use crate::confirm::ConfirmationProvider;
use crate::storage::{KEY_LAST_ACCESS, KEY_SAVED_EMAIL, LocalStorage};

pub const SIGN_OUT_CONFIRM: &str = "Tem certeza que deseja sair da sua conta?";

#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    storage: Arc<dyn LocalStorage>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>, storage: Arc<dyn LocalStorage>) -> Self {
        Self { provider, storage }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// E-mail to prefill on the login form
    pub fn saved_email(&self) -> Option<String> {
        self.storage.get_item(KEY_SAVED_EMAIL).ok().flatten()
    }

    /// Last successful admin sign-in
    pub fn last_access(&self) -> Option<DateTime<Utc>> {
        self.storage
            .get_item(KEY_LAST_ACCESS)
            .ok()
            .flatten()
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Signs in; with `remember` the e-mail is kept for the next visit,
    /// otherwise any remembered e-mail is forgotten.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let session = self.provider.sign_in(email, password).await?;

        // Storage failures must not undo a successful sign-in
        let remembered = if remember {
            self.storage.set_item(KEY_SAVED_EMAIL, email)
        } else {
            self.storage.remove_item(KEY_SAVED_EMAIL)
        };
        if let Err(e) = remembered {
            tracing::warn!(error = %e, "Failed to update remembered e-mail");
        }
        if let Err(e) = self
            .storage
            .set_item(KEY_LAST_ACCESS, &Utc::now().to_rfc3339())
        {
            tracing::warn!(error = %e, "Failed to record last access");
        }

        Ok(session)
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::EmailRequired);
        }
        self.provider.send_password_reset(email).await
    }

    /// Returns `Ok(false)` when the operator declined
    pub async fn sign_out(
        &self,
        token: &str,
        confirm: &dyn ConfirmationProvider,
    ) -> Result<bool, AuthError> {
        if !confirm.confirm(SIGN_OUT_CONFIRM) {
            return Ok(false);
        }
        self.provider.sign_out(token).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryIdentityProvider;
    use crate::confirm::{AlwaysConfirm, NeverConfirm};
    use crate::storage::MemoryStorage;

    fn service() -> (AuthService, Arc<MemoryStorage>) {
        let provider = MemoryIdentityProvider::new();
        provider.add_user("admin@restaurante.com", "segredo123").unwrap();
        let storage = Arc::new(MemoryStorage::new());
        (
            AuthService::new(Arc::new(provider), storage.clone()),
            storage,
        )
    }

    #[tokio::test]
    async fn test_blank_fields_rejected_before_provider() {
        let (svc, _) = service();
        assert_eq!(
            svc.sign_in("  ", "x", false).await.unwrap_err(),
            AuthError::MissingFields
        );
        assert_eq!(
            svc.sign_in("admin@restaurante.com", "", false).await.unwrap_err(),
            AuthError::MissingFields
        );
    }

    #[tokio::test]
    async fn test_remember_me_and_last_access() {
        let (svc, storage) = service();

        svc.sign_in("admin@restaurante.com", "segredo123", true)
            .await
            .unwrap();
        assert_eq!(svc.saved_email().as_deref(), Some("admin@restaurante.com"));
        assert!(svc.last_access().is_some());

        svc.sign_in("admin@restaurante.com", "segredo123", false)
            .await
            .unwrap();
        assert!(svc.saved_email().is_none());
        assert!(storage.get_item(KEY_SAVED_EMAIL).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_reset_requires_email() {
        let (svc, _) = service();
        assert_eq!(
            svc.request_password_reset(" ").await.unwrap_err(),
            AuthError::EmailRequired
        );
        svc.request_password_reset("admin@restaurante.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sign_out_needs_confirmation() {
        let (svc, _) = service();
        let session = svc
            .sign_in("admin@restaurante.com", "segredo123", false)
            .await
            .unwrap();

        assert!(!svc.sign_out(&session.token, &NeverConfirm).await.unwrap());
        assert!(svc.provider().current_user(&session.token).await.is_some());

        assert!(svc.sign_out(&session.token, &AlwaysConfirm).await.unwrap());
        assert!(svc.provider().current_user(&session.token).await.is_none());
    }
}
