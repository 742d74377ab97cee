// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token service: credential registration and login, access/refresh token
//! issuance, refresh rotation, and revocation on logout.
//!
//! Access tokens are short-lived and stateless. Refresh tokens are
//! long-lived and cross-checked against the `refresh_tokens` set on the
//! user document, which is what makes logout and rotation meaningful even
//! though the tokens themselves are self-contained signed strings.

use crate::db::DocumentDb;
use crate::error::{AppError, Result};
use crate::models::user::DEFAULT_USER_IMAGE;
use crate::models::User;
use crate::services::google_identity::GoogleIdentityVerifier;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use password_hash::SaltString;
use ring::rand::SecureRandom;
use serde::{Deserialize, Serialize};

/// JWT claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Random nonce so two tokens issued in the same second are not
    /// bit-identical
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a Google sign-in.
pub struct GoogleSigninResult {
    pub user: User,
    pub tokens: TokenPair,
    /// True when this sign-in provisioned the local account
    pub first_time_login: bool,
}

/// Parameters accepted by `register`.
pub struct RegisterParams {
    pub name: String,
    pub email: String,
    pub password: String,
    pub city: Option<String>,
    pub profile_image: Option<String>,
}

/// Outcome of the atomic refresh-token set mutation.
enum RotateOutcome {
    Accepted,
    /// Token not in the set: all sessions were invalidated
    Mismatch,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    db: DocumentDb,
    token_secret: Vec<u8>,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl AuthService {
    pub fn new(
        db: DocumentDb,
        token_secret: Vec<u8>,
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
    ) -> Self {
        Self {
            db,
            token_secret,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// The signing secret, or `ServerMisconfigured` if none is set.
    /// Checked before any signing attempt, never discovered via a signing
    /// library error.
    fn signing_secret(&self) -> Result<&[u8]> {
        if self.token_secret.is_empty() {
            return Err(AppError::ServerMisconfigured("TOKEN_SECRET"));
        }
        Ok(&self.token_secret)
    }

    /// Issue a signed access/refresh token pair for a user.
    pub fn generate_token_pair(&self, user_id: &str) -> Result<TokenPair> {
        let secret = self.signing_secret()?;
        let jti = random_hex(8)?;
        let now = chrono::Utc::now().timestamp() as usize;

        let access_token = sign_token(user_id, &jti, now, self.access_ttl_secs, secret)?;
        let refresh_token = sign_token(user_id, &jti, now, self.refresh_ttl_secs, secret)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    // ─── Registration & Login ────────────────────────────────────

    /// Register a new user with a password.
    ///
    /// A duplicate email surfaces as the store's conflict signal, not a
    /// pre-check, so two concurrent registrations cannot both win.
    pub async fn register(&self, params: RegisterParams) -> Result<(User, TokenPair)> {
        // Fail on missing secret before doing any expensive hashing.
        self.signing_secret()?;

        let password = params.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash task failed: {}", e)))??;

        let user_id = random_hex(16)?;
        let tokens = self.generate_token_pair(&user_id)?;

        let user = User {
            id: user_id,
            name: params.name,
            email: params.email,
            password_hash: Some(password_hash),
            profile_image: params
                .profile_image
                .unwrap_or_else(|| DEFAULT_USER_IMAGE.to_string()),
            city: params.city,
            gender: None,
            dogs: vec![],
            refresh_tokens: vec![tokens.refresh_token.clone()],
            is_google_user: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        self.db.create_user(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok((user, tokens))
    }

    /// Log in with email and password.
    ///
    /// Unknown email and wrong password fail identically. On success the
    /// whole refresh-token set is replaced with the one new token, so prior
    /// sessions on other devices are invalidated by a plain login.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair)> {
        let user = self
            .db
            .find_user_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Google-only accounts have no usable password hash.
        let hash = user
            .password_hash
            .clone()
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("verify task failed: {}", e)))?;
        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.generate_token_pair(&user.id)?;
        let refresh = tokens.refresh_token.clone();

        self.db
            .update_user_atomic(&user.id, move |u| {
                u.refresh_tokens = vec![refresh];
            })
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, tokens))
    }

    // ─── Refresh Token Lifecycle ─────────────────────────────────

    /// Exchange a refresh token for a new pair (one-time-use rotation).
    ///
    /// The old token is consumed whether or not the new one is ever used.
    /// Of two concurrent refreshes with the same token, exactly one can
    /// observe it still in the set; the other fails and, as the replay
    /// fail-safe, clears every session for the identity.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.verify_refresh_claims(refresh_token)?;

        let tokens = self.generate_token_pair(&claims.sub)?;
        let new_refresh = tokens.refresh_token.clone();

        self.rotate(refresh_token, &claims.sub, Some(new_refresh))
            .await?;

        Ok(tokens)
    }

    /// Invalidate one refresh token (logout of a single session).
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let claims = self.verify_refresh_claims(refresh_token)?;
        self.rotate(refresh_token, &claims.sub, None).await?;
        tracing::info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }

    /// Signature-level validation of a presented refresh token.
    ///
    /// Any verification failure (expired, tampered, wrong secret) folds
    /// into `InvalidRefreshToken`; the expired/invalid distinction only
    /// matters for access tokens at the gateway.
    fn verify_refresh_claims(&self, refresh_token: &str) -> Result<Claims> {
        if refresh_token.is_empty() {
            return Err(AppError::MissingRefreshToken);
        }
        let secret = self.signing_secret()?;

        verify_token(refresh_token, secret).map_err(|e| match e {
            AppError::ServerMisconfigured(name) => AppError::ServerMisconfigured(name),
            _ => AppError::InvalidRefreshToken,
        })
    }

    /// Atomically consume `old_token` from the user's refresh-token set,
    /// optionally appending a replacement.
    ///
    /// Presenting a token that is not in the set clears the entire set:
    /// a rotated-out (possibly stolen) token invalidates every session for
    /// the identity. Deliberate fail-safe.
    async fn rotate(
        &self,
        old_token: &str,
        user_id: &str,
        replacement: Option<String>,
    ) -> Result<()> {
        let old = old_token.to_string();
        let outcome = self
            .db
            .update_user_atomic(user_id, move |u| {
                if !u.refresh_tokens.iter().any(|t| t == &old) {
                    u.refresh_tokens.clear();
                    return RotateOutcome::Mismatch;
                }
                u.refresh_tokens.retain(|t| t != &old);
                if let Some(new_token) = replacement {
                    u.refresh_tokens.push(new_token);
                }
                RotateOutcome::Accepted
            })
            .await?
            .ok_or(AppError::UserNotFound)?;

        match outcome {
            RotateOutcome::Accepted => Ok(()),
            RotateOutcome::Mismatch => {
                tracing::warn!(user_id, "Unrecognized refresh token, all sessions cleared");
                Err(AppError::InvalidRefreshToken)
            }
        }
    }

    // ─── Google Sign-in ──────────────────────────────────────────

    /// Sign in with a Google ID token, provisioning a local account on
    /// first sight. Token issuance follows `login` semantics (set
    /// replacement).
    pub async fn google_signin(
        &self,
        verifier: &GoogleIdentityVerifier,
        credential: &str,
    ) -> Result<GoogleSigninResult> {
        let identity = verifier.verify_credential(credential).await?;

        let email = identity.email.ok_or(AppError::InvalidGoogleToken)?;

        let mut first_time_login = false;
        let user = match self.db.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                let user = User {
                    id: random_hex(16)?,
                    name: identity.name.unwrap_or_else(|| "Google User".to_string()),
                    email: email.clone(),
                    // No password hash: the account can never be used for
                    // direct password login.
                    password_hash: None,
                    profile_image: identity
                        .picture
                        .unwrap_or_else(|| DEFAULT_USER_IMAGE.to_string()),
                    city: None,
                    gender: None,
                    dogs: vec![],
                    refresh_tokens: vec![],
                    is_google_user: true,
                    created_at: chrono::Utc::now().to_rfc3339(),
                };

                match self.db.create_user(&user).await {
                    Ok(()) => {
                        first_time_login = true;
                        user
                    }
                    // Lost a provisioning race; the account exists now.
                    Err(AppError::DuplicateEmail) => self
                        .db
                        .find_user_by_email(&email)
                        .await?
                        .ok_or(AppError::UserNotFound)?,
                    Err(e) => return Err(e),
                }
            }
        };

        let tokens = self.generate_token_pair(&user.id)?;
        let refresh = tokens.refresh_token.clone();

        self.db
            .update_user_atomic(&user.id, move |u| {
                u.refresh_tokens = vec![refresh];
            })
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(user_id = %user.id, first_time_login, "Google sign-in");
        Ok(GoogleSigninResult {
            user,
            tokens,
            first_time_login,
        })
    }
}

/// Decode and verify a token, distinguishing expiry from every other
/// verification failure so clients know whether a refresh can help.
pub fn verify_token(token: &str, secret: &[u8]) -> Result<Claims> {
    if secret.is_empty() {
        return Err(AppError::ServerMisconfigured("TOKEN_SECRET"));
    }

    let key = DecodingKey::from_secret(secret);
    let validation = Validation::new(Algorithm::HS256);

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(AppError::TokenExpired),
            _ => Err(AppError::InvalidToken),
        },
    }
}

fn sign_token(
    user_id: &str,
    jti: &str,
    now: usize,
    ttl_secs: u64,
    secret: &[u8],
) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        jti: jti.to_string(),
        iat: now,
        exp: now + ttl_secs as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT signing failed: {}", e)))
}

/// Hex-encoded random bytes (document IDs, token nonces).
pub fn random_hex(len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    ring::rand::SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failed")))?;
    Ok(hex::encode(bytes))
}

/// Hash a password with Argon2id and a fresh random salt.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut password_hash::rand_core::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

/// Verify a password against a stored Argon2 hash (constant-time).
fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_token_secret_32_bytes_min!!";

    fn service() -> AuthService {
        AuthService::new(DocumentDb::in_memory(), SECRET.to_vec(), 900, 604800)
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_pair_roundtrip() {
        let svc = service();
        let pair = svc.generate_token_pair("u1").unwrap();

        let access = verify_token(&pair.access_token, SECRET).unwrap();
        let refresh = verify_token(&pair.refresh_token, SECRET).unwrap();

        assert_eq!(access.sub, "u1");
        assert_eq!(refresh.sub, "u1");
        // Access expires well before refresh.
        assert!(access.exp < refresh.exp);
        // Same-instant pairs are never bit-identical.
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[test]
    fn missing_secret_is_misconfiguration_not_invalid_token() {
        let svc = AuthService::new(DocumentDb::in_memory(), Vec::new(), 900, 604800);
        assert!(matches!(
            svc.generate_token_pair("u1"),
            Err(AppError::ServerMisconfigured("TOKEN_SECRET"))
        ));
        assert!(matches!(
            verify_token("whatever", b""),
            Err(AppError::ServerMisconfigured("TOKEN_SECRET"))
        ));
    }

    #[test]
    fn wrong_secret_is_invalid_not_expired() {
        let svc = service();
        let pair = svc.generate_token_pair("u1").unwrap();
        assert!(matches!(
            verify_token(&pair.access_token, b"a_completely_different_secret!!!"),
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn refresh_with_empty_token_is_missing() {
        let svc = service();
        assert!(matches!(
            svc.refresh("").await,
            Err(AppError::MissingRefreshToken)
        ));
    }

    #[tokio::test]
    async fn refresh_for_deleted_user_fails_lookup() {
        let svc = service();
        // Token verifies fine but the subject never existed in the store.
        let pair = svc.generate_token_pair("ghost").unwrap();
        assert!(matches!(
            svc.refresh(&pair.refresh_token).await,
            Err(AppError::UserNotFound)
        ));
    }
}
