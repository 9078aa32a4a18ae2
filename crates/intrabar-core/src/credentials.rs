//! Bearer token acquisition.
//!
//! A [`CredentialProvider`] knows how to obtain an access token; a
//! [`TokenCache`] asks it at most once successfully and then hands out the
//! cached value. Failed attempts leave the cache empty.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;

use tokio::sync::OnceCell;
use tracing::info;

use crate::AuthError;

/// Environment variable read by [`EnvCredentialProvider::default`].
pub const ACCESS_TOKEN_ENV: &str = "INTRABAR_ACCESS_TOKEN";

pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AuthError>> + Send + 'a>>;

pub trait CredentialProvider: Send + Sync {
    fn access_token(&self) -> TokenFuture<'_>;
}

/// Fixed token, for tests and pre-provisioned deployments.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl Debug for StaticToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

impl CredentialProvider for StaticToken {
    fn access_token(&self) -> TokenFuture<'_> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

/// Reads the token from an environment variable on first use.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    key: String,
}

impl EnvCredentialProvider {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new(ACCESS_TOKEN_ENV)
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn access_token(&self) -> TokenFuture<'_> {
        Box::pin(async move {
            match std::env::var(&self.key) {
                Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_owned()),
                Ok(_) => Err(AuthError::new(format!("{} is empty", self.key))),
                Err(_) => Err(AuthError::new(format!("{} is not set", self.key))),
            }
        })
    }
}

/// Populate-once access token shared by every fetch.
#[derive(Default)]
pub struct TokenCache {
    token: OnceCell<String>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_populated(&self) -> bool {
        self.token.initialized()
    }

    /// Returns the cached token, consulting `provider` only while the cache
    /// is empty. Concurrent callers wait on a single provider call.
    pub async fn token(&self, provider: &dyn CredentialProvider) -> Result<String, AuthError> {
        self.token
            .get_or_try_init(|| async {
                let token = provider.access_token().await?;
                info!("obtained access token");
                Ok::<_, AuthError>(token)
            })
            .await
            .cloned()
    }
}

impl Debug for TokenCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("populated", &self.is_populated())
            .finish()
    }
}
