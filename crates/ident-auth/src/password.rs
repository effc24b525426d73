//! Password hashing and verification
//!
//! Secrets are stored as `base64(salt)$base64(key)` where `key` is an
//! Argon2id derivation of the password under the configured cost parameters.
//! The cost parameters are not part of the stored secret, so every secret in
//! a deployment must be produced and checked with the same [`HasherParams`].

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::CredentialError;

/// Separator between the encoded salt and the encoded key.
/// Never produced by the standard base64 alphabet.
const SEPARATOR: char = '$';

/// Argon2id cost parameters and sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherParams {
    /// Number of passes over memory
    pub time_cost: u32,
    /// Memory cost in KiB
    pub memory_cost_kib: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
    /// Derived key length in bytes
    pub output_len: usize,
    /// Random salt length in bytes
    pub salt_len: usize,
}

impl Default for HasherParams {
    fn default() -> Self {
        Self {
            time_cost: 1,
            memory_cost_kib: 64 * 1024,
            parallelism: 4,
            output_len: 32,
            salt_len: 16,
        }
    }
}

/// Salted Argon2id password hasher.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    params: HasherParams,
}

impl PasswordHasher {
    /// Create a hasher, validating the cost parameters up front.
    pub fn new(params: HasherParams) -> Result<Self, CredentialError> {
        if params.salt_len < argon2::MIN_SALT_LEN {
            return Err(CredentialError::Hashing(format!(
                "salt length {} is below the minimum of {}",
                params.salt_len,
                argon2::MIN_SALT_LEN
            )));
        }

        let argon2_params = Params::new(
            params.memory_cost_kib,
            params.time_cost,
            params.parallelism,
            Some(params.output_len),
        )
        .map_err(|e| CredentialError::Hashing(format!("invalid argon2 params: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params),
            params,
        })
    }

    /// Parameters this hasher was built with
    pub fn params(&self) -> &HasherParams {
        &self.params
    }

    /// Hash a password into a storable secret with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let mut salt = vec![0u8; self.params.salt_len];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| CredentialError::Randomness(e.to_string()))?;

        let key = self.derive(password, &salt)?;

        Ok(format!(
            "{}{}{}",
            STANDARD_NO_PAD.encode(&salt),
            SEPARATOR,
            STANDARD_NO_PAD.encode(key.as_slice())
        ))
    }

    /// Check a password against a stored secret.
    ///
    /// A secret that cannot be parsed is an error, never a match.
    pub fn verify(&self, password: &str, secret: &str) -> Result<bool, CredentialError> {
        let parts: Vec<&str> = secret.split(SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(CredentialError::Format(format!(
                "expected 2 secret segments, found {}",
                parts.len()
            )));
        }

        let salt = STANDARD_NO_PAD
            .decode(parts[0])
            .map_err(|e| CredentialError::Format(format!("failed to decode salt: {}", e)))?;
        let expected = Zeroizing::new(
            STANDARD_NO_PAD
                .decode(parts[1])
                .map_err(|e| CredentialError::Format(format!("failed to decode key: {}", e)))?,
        );

        if salt.len() < argon2::MIN_SALT_LEN {
            return Err(CredentialError::Format(format!(
                "salt too short: {} bytes",
                salt.len()
            )));
        }

        let computed = self.derive(password, &salt)?;
        let matched = constant_time_eq(computed.as_slice(), expected.as_slice());
        if !matched {
            debug!("Password verification did not match");
        }
        Ok(matched)
    }

    fn derive(&self, password: &str, salt: &[u8]) -> Result<Zeroizing<Vec<u8>>, CredentialError> {
        let mut output = Zeroizing::new(vec![0u8; self.params.output_len]);
        self.argon2
            .hash_password_into(password.as_bytes(), salt, &mut output)
            .map_err(|e| CredentialError::Hashing(format!("argon2id derivation failed: {}", e)))?;
        Ok(output)
    }
}

/// Timing-safe equality over the full length of both inputs.
///
/// Key length is a public property of the configured params, so a length
/// mismatch may return early.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
