//! Credential module
//!
//! Resolves the bearer token used for every API request.
//!
//! Token sources are tried in order (environment variable, then a mounted
//! secret file) and the first non-empty token wins. When no source yields a
//! token the run cannot proceed and `Error::AuthUnavailable` is returned.

mod providers;

pub use providers::{
    provider_from_config, ChainedProvider, CredentialProvider, EnvTokenProvider,
    SecretFileProvider, StaticTokenProvider,
};
