//! Session lifecycle orchestration.

use std::sync::Arc;

use crate::db::repository::{CredentialRepository, RefreshTokenStore};

use super::errors::{AuthError, AuthResult};
use super::models::{Credential, TokenPair, UserId};
use super::password::PasswordHasher;
use super::tokens::TokenCodec;

/// Orchestrates credential checks, token issuance, rotation, and revocation.
///
/// Holds no per-session state: every operation is a single pass over the
/// injected storage handles, so any number of requests may run concurrently
/// against one manager. Construction happens once at process startup.
#[derive(Clone)]
pub struct AuthManager {
    credentials: Arc<dyn CredentialRepository>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hasher: PasswordHasher,
    codec: TokenCodec,
}

impl AuthManager {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        hasher: PasswordHasher,
        codec: TokenCodec,
    ) -> Self {
        Self {
            credentials,
            refresh_tokens,
            hasher,
            codec,
        }
    }

    /// Register a new user and log them in.
    ///
    /// # Errors
    ///
    /// * [`AuthError::UserAlreadyExists`] - email already registered
    /// * [`AuthError::InvalidEmail`] / [`AuthError::InvalidName`] /
    ///   [`AuthError::WeakPassword`] - input validation failures
    pub async fn register(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> AuthResult<(Credential, TokenPair)> {
        self.validate_email(email)?;
        self.validate_display_name(display_name)?;
        self.validate_password(password)?;

        if self.credentials.find_by_email(email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = self.hasher.hash(password)?;
        let credential = self
            .credentials
            .create(email, &password_hash, display_name)
            .await?;

        let pair = self.issue_pair(&credential).await?;
        Ok((credential, pair))
    }

    /// Authenticate by email and password, issuing a fresh token pair.
    ///
    /// Unknown email and wrong password return the same
    /// [`AuthError::InvalidCredentials`] rejection, so callers cannot
    /// enumerate registered addresses.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<(Credential, TokenPair)> {
        let credential = match self.credentials.find_by_email(email).await? {
            Some(credential) => credential,
            None => return Err(AuthError::InvalidCredentials),
        };

        if !self.hasher.verify(password, &credential.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_pair(&credential).await?;
        Ok((credential, pair))
    }

    /// Exchange a refresh token for a new token pair, rotating it.
    ///
    /// Any failure here means the caller's session is over; clients are
    /// expected to drop local state and re-authenticate rather than retry.
    pub async fn refresh(&self, old_refresh_token: &str) -> AuthResult<(Credential, TokenPair)> {
        let record = self.refresh_tokens.validate(old_refresh_token).await?;

        // Single-use enforcement: the delete must observe a row. If it does
        // not, a concurrent refresh already consumed this token and this
        // caller lost the race.
        if !self.refresh_tokens.revoke(old_refresh_token).await? {
            log::warn!("refresh token for user {} consumed concurrently", record.user_id);
            return Err(AuthError::TokenRevokedOrUnknown);
        }

        let credential = self
            .credentials
            .find_by_id(record.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let pair = self.issue_pair(&credential).await?;
        Ok((credential, pair))
    }

    /// Log out one device (specific token) or everywhere (no token).
    ///
    /// Never fails the caller over rows that are already gone.
    pub async fn logout(&self, user_id: UserId, refresh_token: Option<&str>) -> AuthResult<()> {
        match refresh_token {
            Some(token) => {
                self.refresh_tokens.revoke(token).await?;
            }
            None => self.refresh_tokens.revoke_all(user_id).await?,
        }
        Ok(())
    }

    /// Change the user's password and revoke every refresh token.
    ///
    /// Revocation is not optional: every device holding a session from the
    /// old password must re-authenticate.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        self.validate_password(new_password)?;

        let credential = self
            .credentials
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.hasher.verify(current_password, &credential.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.hasher.hash(new_password)?;
        self.credentials
            .update_password(user_id, &password_hash)
            .await?;

        self.refresh_tokens.revoke_all(user_id).await?;
        Ok(())
    }

    /// Fetch the credential record behind an authenticated principal.
    pub async fn current_user(&self, user_id: UserId) -> AuthResult<Credential> {
        self.credentials
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Delete all expired refresh tokens; returns the number swept.
    pub async fn sweep_expired_tokens(&self) -> AuthResult<u64> {
        self.refresh_tokens.sweep_expired().await
    }

    async fn issue_pair(&self, credential: &Credential) -> AuthResult<TokenPair> {
        let access_token = self.codec.issue_access(credential.id, &credential.email)?;
        let refresh_token = self.codec.issue_refresh();
        self.refresh_tokens
            .store(credential.id, &refresh_token)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn validate_email(&self, email: &str) -> AuthResult<()> {
        let mut parts = email.split('@');
        let (local, domain) = (parts.next().unwrap_or(""), parts.next().unwrap_or(""));

        if local.is_empty() || domain.is_empty() || parts.next().is_some() || !domain.contains('.')
        {
            return Err(AuthError::InvalidEmail(
                "Invalid email address".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_display_name(&self, display_name: &str) -> AuthResult<()> {
        if display_name.trim().chars().count() < 2 {
            return Err(AuthError::InvalidName(
                "Name must be at least 2 characters".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> AuthResult<()> {
        if password.len() < 6 {
            return Err(AuthError::WeakPassword(
                "Password must be at least 6 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::mock::{MockCredentialRepository, MockRefreshTokenStore};
    use chrono::{Duration, Utc};

    const EMAIL: &str = "alice@example.com";
    const NAME: &str = "Alice";
    const PASSWORD: &str = "hunter2x";

    struct Fixture {
        manager: AuthManager,
        store: Arc<MockRefreshTokenStore>,
        codec: TokenCodec,
    }

    fn fixture() -> Fixture {
        let credentials = Arc::new(MockCredentialRepository::new());
        let store = Arc::new(MockRefreshTokenStore::new(credentials.clone()));
        let codec = TokenCodec::new("test_secret_key_for_sessions");
        let manager = AuthManager::new(
            credentials,
            store.clone(),
            PasswordHasher::new("test_pepper"),
            codec.clone(),
        );
        Fixture {
            manager,
            store,
            codec,
        }
    }

    #[tokio::test]
    async fn register_issues_a_working_token_pair() {
        let fx = fixture();

        let (user, pair) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();
        assert_eq!(user.email, EMAIL);

        // Access token verifies and names the new user.
        let claims = fx.codec.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, EMAIL);

        // Refresh token landed in the store.
        let record = fx.store.validate(&pair.refresh_token).await.unwrap();
        assert_eq!(record.user_id, user.id);
        assert_eq!(record.email, EMAIL);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let fx = fixture();
        fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        let result = fx.manager.register(EMAIL, "Other", "different6").await;
        assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn register_validates_inputs() {
        let fx = fixture();

        assert!(matches!(
            fx.manager.register("not-an-email", NAME, PASSWORD).await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            fx.manager.register("a@b", NAME, PASSWORD).await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            fx.manager.register(EMAIL, "A", PASSWORD).await,
            Err(AuthError::InvalidName(_))
        ));
        assert!(matches!(
            fx.manager.register(EMAIL, NAME, "short").await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn login_rejects_unknown_email_and_wrong_password_identically() {
        let fx = fixture();
        fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        let unknown = fx.manager.login("nobody@example.com", PASSWORD).await;
        let wrong = fx.manager.login(EMAIL, "wrong-password").await;

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_issues_a_distinct_refresh_token_per_session() {
        let fx = fixture();
        let (_, registration_pair) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        let (user, login_pair) = fx.manager.login(EMAIL, PASSWORD).await.unwrap();
        assert_ne!(registration_pair.refresh_token, login_pair.refresh_token);

        // Both sessions stay valid concurrently (multi-device).
        assert_eq!(fx.store.count_for_user(user.id), 2);
    }

    #[tokio::test]
    async fn refresh_rotates_and_old_token_is_single_use() {
        let fx = fixture();
        let (user, pair) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        let (refreshed_user, new_pair) = fx.manager.refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(refreshed_user.id, user.id);
        assert_ne!(new_pair.refresh_token, pair.refresh_token);

        // The consumed token is gone for good.
        let replay = fx.manager.refresh(&pair.refresh_token).await;
        assert!(matches!(replay, Err(AuthError::TokenRevokedOrUnknown)));

        // The rotated token works exactly once more.
        assert!(fx.manager.refresh(&new_pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_unknown_token() {
        let fx = fixture();
        let result = fx.manager.refresh("never-issued").await;
        assert!(matches!(result, Err(AuthError::TokenRevokedOrUnknown)));
    }

    #[tokio::test]
    async fn refresh_rejects_expired_token_and_lazily_deletes_it() {
        let fx = fixture();
        let (user, _) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        fx.store
            .store_with_expiry(user.id, "stale-token", Utc::now() - Duration::hours(1));

        let result = fx.manager.refresh("stale-token").await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
        assert!(!fx.store.contains("stale-token"));
    }

    #[tokio::test]
    async fn logout_of_one_device_leaves_other_sessions_alive() {
        let fx = fixture();
        let (user, first) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();
        let (_, second) = fx.manager.login(EMAIL, PASSWORD).await.unwrap();

        fx.manager
            .logout(user.id, Some(&first.refresh_token))
            .await
            .unwrap();

        assert!(!fx.store.contains(&first.refresh_token));
        assert!(fx.store.contains(&second.refresh_token));
    }

    #[tokio::test]
    async fn logout_everywhere_revokes_all_tokens_but_spares_other_users() {
        let fx = fixture();
        let (alice, alice_pair) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();
        fx.manager.login(EMAIL, PASSWORD).await.unwrap();
        let (_, bob_pair) = fx
            .manager
            .register("bob@example.com", "Bob", "bobsecret")
            .await
            .unwrap();

        fx.manager.logout(alice.id, None).await.unwrap();

        assert_eq!(fx.store.count_for_user(alice.id), 0);
        assert!(matches!(
            fx.manager.refresh(&alice_pair.refresh_token).await,
            Err(AuthError::TokenRevokedOrUnknown)
        ));
        assert!(fx.store.contains(&bob_pair.refresh_token));
    }

    #[tokio::test]
    async fn logout_with_already_revoked_token_still_succeeds() {
        let fx = fixture();
        let (user, pair) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        fx.manager
            .logout(user.id, Some(&pair.refresh_token))
            .await
            .unwrap();
        // Second logout finds nothing to delete; the caller never sees that.
        fx.manager
            .logout(user.id, Some(&pair.refresh_token))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn change_password_rejects_wrong_current_password() {
        let fx = fixture();
        let (user, _) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        let result = fx
            .manager
            .change_password(user.id, "wrong-password", "fresh-secret")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        // Nothing was revoked on the failed attempt.
        assert_eq!(fx.store.count_for_user(user.id), 1);
    }

    #[tokio::test]
    async fn change_password_revokes_all_sessions_and_rebinds_login() {
        let fx = fixture();
        let (user, pair) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();
        fx.manager.login(EMAIL, PASSWORD).await.unwrap();

        fx.manager
            .change_password(user.id, PASSWORD, "fresh-secret")
            .await
            .unwrap();

        // Every prior session is dead.
        assert_eq!(fx.store.count_for_user(user.id), 0);
        assert!(matches!(
            fx.manager.refresh(&pair.refresh_token).await,
            Err(AuthError::TokenRevokedOrUnknown)
        ));

        // Old password no longer authenticates; the new one does.
        assert!(matches!(
            fx.manager.login(EMAIL, PASSWORD).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(fx.manager.login(EMAIL, "fresh-secret").await.is_ok());
    }

    #[tokio::test]
    async fn current_user_returns_record_or_not_found() {
        let fx = fixture();
        let (user, _) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        let fetched = fx.manager.current_user(user.id).await.unwrap();
        assert_eq!(fetched.email, EMAIL);

        assert!(matches!(
            fx.manager.current_user(9999).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn sweep_reports_the_number_of_expired_tokens_removed() {
        let fx = fixture();
        let (user, pair) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        fx.store
            .store_with_expiry(user.id, "stale-1", Utc::now() - Duration::days(1));
        fx.store
            .store_with_expiry(user.id, "stale-2", Utc::now() - Duration::minutes(5));

        assert_eq!(fx.manager.sweep_expired_tokens().await.unwrap(), 2);
        assert!(fx.store.contains(&pair.refresh_token));
    }

    /// End-to-end scenario: registration, failed login, fresh login, and a
    /// rotation attempt with the registration-era refresh token.
    #[tokio::test]
    async fn full_session_lifecycle_scenario() {
        let fx = fixture();

        let (_, registration_pair) = fx.manager.register(EMAIL, NAME, PASSWORD).await.unwrap();

        assert!(matches!(
            fx.manager.login(EMAIL, "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));

        let (_, login_pair) = fx.manager.login(EMAIL, PASSWORD).await.unwrap();
        assert_ne!(login_pair.refresh_token, registration_pair.refresh_token);

        // The registration token was never rotated, so it still works once.
        let (_, rotated) = fx.manager.refresh(&registration_pair.refresh_token).await.unwrap();

        // ...and is dead after that single use.
        assert!(matches!(
            fx.manager.refresh(&registration_pair.refresh_token).await,
            Err(AuthError::TokenRevokedOrUnknown)
        ));
        assert!(fx.manager.refresh(&rotated.refresh_token).await.is_ok());
    }
}
