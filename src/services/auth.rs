use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::UserSettings;
use crate::models::User;

/// Errors that can occur during login or token checks
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Invalid authentication credentials")]
    InvalidToken,

    #[error("Inactive user")]
    Inactive,

    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),
}

/// A user with its stored password digest
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Lookup of known users
pub trait CredentialStore: Send + Sync {
    fn find(&self, username: &str) -> Option<UserRecord>;
}

/// Credential store seeded once at startup
pub struct InMemoryCredentialStore {
    users: HashMap<String, UserRecord>,
}

impl InMemoryCredentialStore {
    pub fn new(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|record| (record.user.username.clone(), record))
            .collect();

        Self { users }
    }

    pub fn from_settings(users: &[UserSettings]) -> Self {
        Self::new(users.iter().map(|u| UserRecord {
            user: User {
                username: u.username.clone(),
                email: u.email.clone(),
                full_name: u.full_name.clone(),
                disabled: u.disabled,
            },
            password_hash: u.password_hash.to_lowercase(),
        }))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn find(&self, username: &str) -> Option<UserRecord> {
        self.users.get(username).cloned()
    }
}

/// Hex BLAKE3 digest of a password, the format stored in configuration
pub fn hash_password(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: usize,
    exp: usize,
}

/// Issues and checks bearer tokens
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: u64,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, secret: &str, token_ttl_secs: u64) -> Self {
        Self {
            store,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
        }
    }

    /// Check a username/password pair and issue a token
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let record = self.store.find(username).ok_or(AuthError::InvalidCredentials)?;

        if record.password_hash != hash_password(password) {
            tracing::info!("Rejected login for {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let now = chrono::Utc::now().timestamp().max(0) as usize;
        let claims = Claims {
            sub: record.user.username,
            iat: now,
            exp: now + self.token_ttl_secs as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Resolve a bearer token to an active user
    pub fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;

        let record = self.store.find(&data.claims.sub).ok_or(AuthError::InvalidToken)?;

        if record.user.disabled {
            return Err(AuthError::Inactive);
        }

        Ok(record.user)
    }
}
