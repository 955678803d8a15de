//! Ed25519 interaction signature verification.

use async_trait::async_trait;
use ring::signature::{UnparsedPublicKey, ED25519};

use super::{AuthError, AuthRequest, Authenticator, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Verifies that a request was signed by the platform.
///
/// The signature covers the timestamp header followed by the raw body.
pub struct Ed25519Authenticator {
    public_key: Vec<u8>,
}

impl Ed25519Authenticator {
    pub fn new(public_key: Vec<u8>) -> Result<Self, AuthError> {
        if public_key.len() != 32 {
            return Err(AuthError::ConfigurationError(format!(
                "ed25519 public key must be 32 bytes, got {}",
                public_key.len()
            )));
        }
        Ok(Self { public_key })
    }

    /// Build from the hex-encoded application public key.
    pub fn from_hex(public_key: &str) -> Result<Self, AuthError> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| AuthError::ConfigurationError(format!("invalid public key: {}", e)))?;
        Self::new(bytes)
    }
}

#[async_trait]
impl Authenticator for Ed25519Authenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<(), AuthError> {
        let signature = request
            .header(SIGNATURE_HEADER)
            .ok_or(AuthError::NotAuthenticated)?;
        let timestamp = request
            .header(TIMESTAMP_HEADER)
            .ok_or(AuthError::NotAuthenticated)?;

        let signature = hex::decode(signature)
            .map_err(|_| AuthError::InvalidCredentials("malformed signature".to_string()))?;

        let mut message = Vec::with_capacity(timestamp.len() + request.body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(&request.body);

        UnparsedPublicKey::new(&ED25519, &self.public_key)
            .verify(&message, &signature)
            .map_err(|_| AuthError::InvalidCredentials("signature mismatch".to_string()))
    }

    fn method_name(&self) -> &'static str {
        "ed25519"
    }
}
