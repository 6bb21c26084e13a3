//! Credential resolution.
//!
//! Credential-typed job parameters carry a lookup key instead of a value.
//! A [`CredentialResolver`] turns that key into the secret before the
//! parameter is used.

pub mod error;
pub mod http;
pub mod resolver;

pub use error::{CredentialError, CredentialResult};
pub use http::{BackendConfig, HttpCredentialResolver};
pub use resolver::{CredentialResolver, NoCredentialBackend};
