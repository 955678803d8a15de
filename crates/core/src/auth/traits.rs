use async_trait::async_trait;
use thiserror::Error;

use super::types::AuthRequest;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Check that a request really comes from the chat platform
    async fn authenticate(&self, request: &AuthRequest) -> Result<(), AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}
