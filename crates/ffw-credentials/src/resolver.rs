//! Credential resolver seam.

use async_trait::async_trait;

use crate::error::{CredentialError, CredentialResult};

/// Resolves a credential key to its secret value.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, key: &str) -> CredentialResult<String>;
}

/// Resolver used when no backend is configured. Every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentialBackend;

#[async_trait]
impl CredentialResolver for NoCredentialBackend {
    async fn resolve(&self, key: &str) -> CredentialResult<String> {
        Err(CredentialError::NotConfigured(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_backend_fails_every_lookup() {
        let err = NoCredentialBackend.resolve("FTP_PASSWORD").await.unwrap_err();
        assert!(matches!(err, CredentialError::NotConfigured(ref key) if key == "FTP_PASSWORD"));
    }
}
