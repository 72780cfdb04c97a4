//! Credential provider implementations

use crate::config::CredentialsConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// A source of API tokens
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Resolve a token, failing with `Error::AuthUnavailable` when none exists
    async fn get_token(&self) -> Result<String>;

    /// Short description used in diagnostics
    fn describe(&self) -> String;
}

/// A fixed token
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider that always returns `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<String> {
        non_empty(&self.token).ok_or_else(|| Error::auth_unavailable("static token is empty"))
    }

    fn describe(&self) -> String {
        "static token".to_string()
    }
}

/// Token read from an environment variable
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    /// Create a provider reading `var`
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvTokenProvider {
    async fn get_token(&self) -> Result<String> {
        std::env::var(&self.var)
            .ok()
            .as_deref()
            .and_then(non_empty)
            .ok_or_else(|| Error::auth_unavailable(format!("${} is not set", self.var)))
    }

    fn describe(&self) -> String {
        format!("env ${}", self.var)
    }
}

/// Token read from a mounted secret file
#[derive(Debug, Clone)]
pub struct SecretFileProvider {
    path: PathBuf,
}

impl SecretFileProvider {
    /// Create a provider reading the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a provider for secret `name` mounted under `dir`
    pub fn in_dir(dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            path: dir.into().join(name),
        }
    }
}

#[async_trait]
impl CredentialProvider for SecretFileProvider {
    async fn get_token(&self) -> Result<String> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::auth_unavailable(format!("cannot read {}: {e}", self.path.display()))
        })?;
        non_empty(&contents).ok_or_else(|| {
            Error::auth_unavailable(format!("secret file {} is empty", self.path.display()))
        })
    }

    fn describe(&self) -> String {
        format!("secret file {}", self.path.display())
    }
}

/// Tries each provider in order, returning the first token found
#[derive(Default)]
pub struct ChainedProvider {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainedProvider {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider
    #[must_use]
    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Number of providers in the chain
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl CredentialProvider for ChainedProvider {
    async fn get_token(&self) -> Result<String> {
        let mut tried = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match provider.get_token().await {
                Ok(token) => {
                    debug!(source = %provider.describe(), "Resolved API token");
                    return Ok(token);
                }
                Err(e) => tried.push(e.to_string()),
            }
        }

        if tried.is_empty() {
            return Err(Error::auth_unavailable("no credential sources configured"));
        }
        Err(Error::auth_unavailable(tried.join("; ")))
    }

    fn describe(&self) -> String {
        let sources: Vec<String> = self.providers.iter().map(|p| p.describe()).collect();
        format!("chain [{}]", sources.join(", "))
    }
}

impl std::fmt::Debug for ChainedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainedProvider")
            .field("sources", &self.describe())
            .finish()
    }
}

/// Build the provider chain described by the config
pub fn provider_from_config(config: &CredentialsConfig) -> ChainedProvider {
    let mut chain = ChainedProvider::new().with(EnvTokenProvider::new(&config.env_var));
    if let Some(dir) = &config.secret_dir {
        chain = chain.with(SecretFileProvider::in_dir(dir, &config.secret_name));
    }
    chain
}

fn non_empty(token: &str) -> Option<String> {
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
