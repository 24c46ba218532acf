//! Identity provider abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use shared::error::{AppError, ErrorCode};

/// Signed-in operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub uid: String,
    pub email: String,
}

/// Result of a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: CurrentUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(CurrentUser),
    SignedOut(CurrentUser),
}

/// Identity failures, displayed as the login page shows them
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Por favor, preencha todos os campos.")]
    MissingFields,

    #[error("Digite seu e-mail para recuperar a senha.")]
    EmailRequired,

    #[error("E-mail inválido.")]
    InvalidEmail,

    #[error("Esta conta foi desativada.")]
    UserDisabled,

    #[error("Não há usuário cadastrado com este e-mail.")]
    UserNotFound,

    #[error("Senha incorreta.")]
    WrongPassword,

    #[error("Muitas tentativas de login. Tente novamente mais tarde.")]
    TooManyRequests,

    #[error("Erro de conexão. Verifique sua internet.")]
    Network,

    #[error("Sessão inválida.")]
    InvalidSession,

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingFields | Self::EmailRequired => ErrorCode::RequiredField,
            Self::InvalidEmail => ErrorCode::InvalidEmail,
            Self::UserDisabled => ErrorCode::AccountDisabled,
            Self::UserNotFound => ErrorCode::UserNotFound,
            Self::WrongPassword => ErrorCode::WrongPassword,
            Self::TooManyRequests => ErrorCode::TooManyAttempts,
            Self::Network => ErrorCode::NetworkError,
            Self::InvalidSession => ErrorCode::TokenInvalid,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::with_message(err.code(), err.to_string())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Sends the reset e-mail through the provider
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// `None` for unknown or signed-out tokens
    async fn current_user(&self, token: &str) -> Option<CurrentUser>;

    /// Session change notifications
    fn session_events(&self) -> broadcast::Receiver<SessionEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_messages_and_codes() {
        assert_eq!(AuthError::WrongPassword.to_string(), "Senha incorreta.");
        let app: AppError = AuthError::UserNotFound.into();
        assert_eq!(app.code, ErrorCode::UserNotFound);
        assert_eq!(app.message, "Não há usuário cadastrado com este e-mail.");
        assert_eq!(AuthError::Network.code(), ErrorCode::NetworkError);
    }
}
