//! Credential error types.

use thiserror::Error;

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Errors that can occur while resolving a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("No credential backend configured to resolve {0}")]
    NotConfigured(String),

    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl CredentialError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, context: impl Into<String>) -> Self {
        let context = context.into();
        match status {
            401 | 403 => Self::AuthError(format!("{} ({})", context, status)),
            404 => Self::NotFound(context),
            _ => Self::RequestFailed(format!("{} ({})", context, status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert!(matches!(
            CredentialError::from_http_status(401, "login"),
            CredentialError::AuthError(_)
        ));
        assert!(matches!(
            CredentialError::from_http_status(404, "FTP_PASSWORD"),
            CredentialError::NotFound(ref key) if key == "FTP_PASSWORD"
        ));
        assert!(matches!(
            CredentialError::from_http_status(500, "lookup"),
            CredentialError::RequestFailed(_)
        ));
    }
}
