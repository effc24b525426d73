//! Credential service
//!
//! Composes the password hasher, the token manager and the user store into
//! the sign-up / sign-in / refresh flows. Argon2 work is CPU-bound and runs on
//! the blocking pool so request executors stay responsive.

use ident_auth::{CredentialError, PasswordHasher, TokenManager, TokenPair};
use ident_db::{Database, NewUser, User};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// Registration data, already validated by the caller
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub cpf: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Result of a successful sign-in
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

/// Sign-up, sign-in and token refresh on top of the credential core
pub struct CredentialService {
    db: Database,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenManager>,
    /// Verified against when the CPF is unknown so both paths cost one hash
    dummy_secret: String,
}

impl CredentialService {
    pub fn new(
        db: Database,
        hasher: PasswordHasher,
        tokens: Arc<TokenManager>,
    ) -> Result<Self, CredentialError> {
        let dummy_secret = hasher.hash(&Uuid::new_v4().to_string())?;

        Ok(Self {
            db,
            hasher: Arc::new(hasher),
            tokens,
            dummy_secret,
        })
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Register a new user
    pub async fn sign_up(&self, account: NewAccount) -> Result<User, ApiError> {
        // Cheap duplicate check before paying for a hash
        if self.db.get_user_by_cpf(&account.cpf).await?.is_some() {
            return Err(ApiError::Conflict("CPF already registered".to_string()));
        }

        let password_hash = self.hash_password(account.password).await?;

        let user = self
            .db
            .insert_user(NewUser {
                cpf: account.cpf,
                first_name: account.first_name,
                last_name: account.last_name,
                password_hash,
            })
            .await?;

        metrics::counter!("ident_sign_ups_total").increment(1);
        info!(user_id = %user.id, "User created");

        Ok(user)
    }

    /// Authenticate by CPF and password, issuing a token pair
    ///
    /// Unknown CPF and wrong password are indistinguishable to the caller.
    pub async fn sign_in(&self, cpf: &str, password: &str) -> Result<SignInOutcome, ApiError> {
        let user = self.db.get_user_by_cpf(cpf).await?;

        let secret = match &user {
            Some(u) => u.password_hash.clone(),
            None => self.dummy_secret.clone(),
        };

        let matched = match self.verify_password(password.to_string(), secret).await {
            Ok(matched) => matched,
            Err(ApiError::Credential(e)) if e.is_verification_failure() => {
                warn!("Stored credential secret is unreadable: {}", e);
                false
            }
            Err(e) => return Err(e),
        };

        let user = match (user, matched) {
            (Some(u), true) => u,
            _ => {
                metrics::counter!("ident_sign_ins_total", "outcome" => "rejected").increment(1);
                debug!("Sign-in rejected");
                return Err(ApiError::Unauthorized);
            }
        };

        let tokens = self.tokens.issue(user.id)?;

        metrics::counter!("ident_sign_ins_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, "User signed in");

        Ok(SignInOutcome { user, tokens })
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let id = self.tokens.verify_refresh(refresh_token)?;

        if self.db.get_user_by_id(id).await?.is_none() {
            debug!(user_id = %id, "Refresh for a user that no longer exists");
            return Err(ApiError::Unauthorized);
        }

        let pair = self.tokens.issue(id)?;
        metrics::counter!("ident_token_refreshes_total").increment(1);
        debug!(user_id = %id, "Token pair refreshed");
        Ok(pair)
    }

    /// Replace a user's password after checking the current one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: String,
    ) -> Result<(), ApiError> {
        let user = self
            .db
            .get_user_by_id(user_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if !self
            .verify_password(current_password.to_string(), user.password_hash)
            .await?
        {
            return Err(ApiError::Unauthorized);
        }

        let password_hash = self.hash_password(new_password).await?;
        if !self.db.update_user_password(user_id, &password_hash).await? {
            return Err(ApiError::Unauthorized);
        }

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Remove the caller's account after checking their password
    ///
    /// Outstanding refresh tokens stop working because refresh requires the
    /// user to exist.
    pub async fn delete_account(&self, user_id: Uuid, password: &str) -> Result<(), ApiError> {
        let user = self
            .db
            .get_user_by_id(user_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if !self
            .verify_password(password.to_string(), user.password_hash)
            .await?
        {
            return Err(ApiError::Unauthorized);
        }

        if !self.db.delete_user(user_id).await? {
            return Err(ApiError::Unauthorized);
        }

        metrics::counter!("ident_account_deletions_total").increment(1);
        info!(user_id = %user_id, "Account deleted");
        Ok(())
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.db.get_user_by_id(id).await?)
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, ApiError> {
        Ok(self.db.list_users(limit, offset).await?)
    }

    pub async fn count_users(&self) -> Result<i64, ApiError> {
        Ok(self.db.count_users().await?)
    }

    /// Whether the user store answers queries
    pub async fn check_store(&self) -> Result<(), ApiError> {
        Ok(self.db.ping().await?)
    }

    async fn hash_password(&self, password: String) -> Result<String, ApiError> {
        let hasher = self.hasher.clone();
        let secret = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {}", e)))??;
        Ok(secret)
    }

    async fn verify_password(&self, password: String, secret: String) -> Result<bool, ApiError> {
        let hasher = self.hasher.clone();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &secret))
            .await
            .map_err(|e| ApiError::Internal(format!("verification task failed: {}", e)))??;
        Ok(matched)
    }
}
