//! JWT token management

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::CredentialError;

/// The only accepted signing scheme
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Payload of a short-lived access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Payload of a long-lived refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Token payload, discriminated by the `typ` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "lowercase")]
pub enum Claims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl Claims {
    pub fn subject(&self) -> Uuid {
        match self {
            Claims::Access(c) => c.sub,
            Claims::Refresh(c) => c.sub,
        }
    }
}

/// Lifetimes of the two token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::hours(24),
            refresh: Duration::days(7),
        }
    }
}

impl TokenLifetimes {
    /// Reject lifetimes that are not positive or that push `exp` past the
    /// representable date range.
    pub fn check(&self) -> Result<(), CredentialError> {
        let now = Utc::now();
        for (kind, lifetime) in [("access", self.access), ("refresh", self.refresh)] {
            if lifetime <= Duration::zero() {
                return Err(CredentialError::LifetimeOutOfRange(format!(
                    "{} lifetime must be positive",
                    kind
                )));
            }
            expiry(now, lifetime)?;
        }
        Ok(())
    }
}

fn expiry(now: DateTime<Utc>, lifetime: Duration) -> Result<i64, CredentialError> {
    now.checked_add_signed(lifetime)
        .map(|exp| exp.timestamp())
        .ok_or_else(|| {
            CredentialError::LifetimeOutOfRange(format!("{} seconds", lifetime.num_seconds()))
        })
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub access_expires_in: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

/// JWT manager for token issuance and validation
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifetimes: TokenLifetimes,
}

impl TokenManager {
    /// Create a new token manager from the process signing secret
    pub fn new(secret: &str, issuer: &str, lifetimes: TokenLifetimes) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            lifetimes,
        }
    }

    /// Issue an access and a refresh token bound to `identity`
    pub fn issue(&self, identity: Uuid) -> Result<TokenPair, CredentialError> {
        self.issue_at(identity, Utc::now())
    }

    fn issue_at(&self, identity: Uuid, now: DateTime<Utc>) -> Result<TokenPair, CredentialError> {
        let access = Claims::Access(AccessClaims {
            sub: identity,
            iat: now.timestamp(),
            exp: expiry(now, self.lifetimes.access)?,
            iss: self.issuer.clone(),
        });
        let refresh = Claims::Refresh(RefreshClaims {
            sub: identity,
            iat: now.timestamp(),
            exp: expiry(now, self.lifetimes.refresh)?,
            iss: self.issuer.clone(),
        });

        debug!("Issuing token pair for subject: {}", identity);

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            access_expires_in: self.lifetimes.access.num_seconds(),
            refresh_expires_in: self.lifetimes.refresh.num_seconds(),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, CredentialError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key).map_err(CredentialError::Signing)
    }

    /// Validate an access token and return the bound identity
    pub fn verify_access(&self, token: &str) -> Result<Uuid, CredentialError> {
        match self.validate_token(token)? {
            Claims::Access(claims) => Ok(claims.sub),
            Claims::Refresh(_) => Err(CredentialError::ClaimTypeMismatch),
        }
    }

    /// Validate a refresh token and return the bound identity
    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, CredentialError> {
        match self.validate_token(token)? {
            Claims::Refresh(claims) => Ok(claims.sub),
            Claims::Access(_) => Err(CredentialError::ClaimTypeMismatch),
        }
    }

    /// Check algorithm, signature, expiry and issuer, then decode the claims
    fn validate_token(&self, token: &str) -> Result<Claims, CredentialError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            let err = match e.kind() {
                ErrorKind::InvalidAlgorithm => CredentialError::AlgorithmMismatch,
                ErrorKind::InvalidSignature => CredentialError::SignatureInvalid,
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                ErrorKind::InvalidIssuer => CredentialError::InvalidIssuer,
                _ => CredentialError::Format(e.to_string()),
            };
            debug!("Token rejected: {}", err);
            err
        })?;

        Ok(token_data.claims)
    }
}
