use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator};

/// Authenticator that accepts all requests
/// Must be explicitly configured - the system won't default to this
pub struct NoneAuthenticator;

impl NoneAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoneAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<(), AuthError> {
        Ok(())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}
