//! In-process identity provider
//!
//! Password hashes are Argon2 PHC strings. Repeated wrong passwords lock the
//! account for a short window.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use validator::ValidateEmail;

use super::provider::{AuthError, CurrentUser, IdentityProvider, Session, SessionEvent};

const MAX_FAILED_ATTEMPTS: u32 = 5;
const LOCKOUT_MS: i64 = 5 * 60 * 1000;
const SESSION_EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
struct UserRecord {
    uid: String,
    email: String,
    password_hash: String,
    disabled: bool,
    failed_attempts: u32,
    locked_until: Option<i64>,
}

/// Hash password using argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> Result<bool, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHash, PasswordVerifier},
    };

    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub struct MemoryIdentityProvider {
    /// Keyed by lowercased e-mail
    users: DashMap<String, UserRecord>,
    sessions: DashMap<String, CurrentUser>,
    /// E-mails a reset link was sent to
    reset_outbox: Mutex<Vec<String>>,
    events: broadcast::Sender<SessionEvent>,
    offline: AtomicBool,
}

impl std::fmt::Debug for MemoryIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIdentityProvider")
            .field("users", &self.users.len())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            users: DashMap::new(),
            sessions: DashMap::new(),
            reset_outbox: Mutex::new(Vec::new()),
            events,
            offline: AtomicBool::new(false),
        }
    }

    /// Registers an account from an existing Argon2 hash
    pub fn add_user_with_hash(&self, email: &str, password_hash: impl Into<String>) -> String {
        let uid = uuid::Uuid::new_v4().simple().to_string();
        self.users.insert(
            email.trim().to_lowercase(),
            UserRecord {
                uid: uid.clone(),
                email: email.trim().to_string(),
                password_hash: password_hash.into(),
                disabled: false,
                failed_attempts: 0,
                locked_until: None,
            },
        );
        uid
    }

    /// Registers an account, hashing the password
    pub fn add_user(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let hash = hash_password(password).map_err(|e| AuthError::Other(e.to_string()))?;
        Ok(self.add_user_with_hash(email, hash))
    }

    pub fn set_disabled(&self, email: &str, disabled: bool) {
        if let Some(mut user) = self.users.get_mut(&email.trim().to_lowercase()) {
            user.disabled = disabled;
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn reset_outbox(&self) -> Vec<String> {
        self.reset_outbox.lock().clone()
    }

    fn ensure_online(&self) -> Result<(), AuthError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AuthError::Network);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.ensure_online()?;
        if !email.trim().validate_email() {
            return Err(AuthError::InvalidEmail);
        }

        let key = email.trim().to_lowercase();
        let now = shared::util::now_millis();

        let user = {
            let mut record = self.users.get_mut(&key).ok_or(AuthError::UserNotFound)?;
            if record.disabled {
                return Err(AuthError::UserDisabled);
            }
            if record.locked_until.is_some_and(|until| until > now) {
                return Err(AuthError::TooManyRequests);
            }

            let valid = verify_password(&record.password_hash, password)
                .map_err(|e| AuthError::Other(format!("Password verification failed: {e}")))?;
            if !valid {
                record.failed_attempts += 1;
                if record.failed_attempts >= MAX_FAILED_ATTEMPTS {
                    record.failed_attempts = 0;
                    record.locked_until = Some(now + LOCKOUT_MS);
                    tracing::warn!(email = %record.email, "Too many failed sign-in attempts, locking");
                }
                return Err(AuthError::WrongPassword);
            }

            record.failed_attempts = 0;
            record.locked_until = None;
            CurrentUser {
                uid: record.uid.clone(),
                email: record.email.clone(),
            }
        };

        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), user.clone());
        let _ = self.events.send(SessionEvent::SignedIn(user.clone()));

        tracing::info!(uid = %user.uid, email = %user.email, "User signed in");
        Ok(Session { token, user })
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.ensure_online()?;
        if !email.trim().validate_email() {
            return Err(AuthError::InvalidEmail);
        }
        let key = email.trim().to_lowercase();
        if !self.users.contains_key(&key) {
            return Err(AuthError::UserNotFound);
        }
        self.reset_outbox.lock().push(key);
        tracing::info!(email = %email.trim(), "Password reset e-mail queued");
        Ok(())
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.ensure_online()?;
        let (_, user) = self
            .sessions
            .remove(token)
            .ok_or(AuthError::InvalidSession)?;
        let _ = self.events.send(SessionEvent::SignedOut(user.clone()));
        tracing::info!(uid = %user.uid, "User signed out");
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Option<CurrentUser> {
        self.sessions.get(token).map(|u| u.clone())
    }

    fn session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MemoryIdentityProvider {
        let p = MemoryIdentityProvider::new();
        p.add_user("admin@restaurante.com", "segredo123").unwrap();
        p
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let p = provider();
        let mut events = p.session_events();

        let session = p.sign_in("Admin@Restaurante.com", "segredo123").await.unwrap();
        assert_eq!(session.user.email, "admin@restaurante.com");
        assert!(p.current_user(&session.token).await.is_some());
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedIn(_)));

        p.sign_out(&session.token).await.unwrap();
        assert!(p.current_user(&session.token).await.is_none());
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedOut(_)));
    }

    #[tokio::test]
    async fn test_sign_in_errors() {
        let p = provider();
        for bad in ["admin", "a b@restaurante.com", "@restaurante.com"] {
            assert_eq!(p.sign_in(bad, "x").await.unwrap_err(), AuthError::InvalidEmail);
        }
        assert_eq!(
            p.send_password_reset("admin@").await.unwrap_err(),
            AuthError::InvalidEmail
        );
        assert_eq!(
            p.sign_in("outro@restaurante.com", "x").await.unwrap_err(),
            AuthError::UserNotFound
        );
        assert_eq!(
            p.sign_in("admin@restaurante.com", "errada").await.unwrap_err(),
            AuthError::WrongPassword
        );

        p.set_disabled("admin@restaurante.com", true);
        assert_eq!(
            p.sign_in("admin@restaurante.com", "segredo123").await.unwrap_err(),
            AuthError::UserDisabled
        );

        p.set_offline(true);
        assert_eq!(
            p.sign_in("admin@restaurante.com", "segredo123").await.unwrap_err(),
            AuthError::Network
        );
    }

    #[tokio::test]
    async fn test_lockout_after_repeated_failures() {
        let p = provider();
        for _ in 0..MAX_FAILED_ATTEMPTS {
            let _ = p.sign_in("admin@restaurante.com", "errada").await;
        }
        assert_eq!(
            p.sign_in("admin@restaurante.com", "segredo123").await.unwrap_err(),
            AuthError::TooManyRequests
        );
    }

    #[tokio::test]
    async fn test_password_reset() {
        let p = provider();
        p.send_password_reset("admin@restaurante.com").await.unwrap();
        assert_eq!(p.reset_outbox(), vec!["admin@restaurante.com".to_string()]);
        assert_eq!(
            p.send_password_reset("ninguem@restaurante.com").await.unwrap_err(),
            AuthError::UserNotFound
        );
    }
}
