//! Verification of incoming interaction requests.

mod ed25519;
mod none;
mod traits;
mod types;

pub use ed25519::*;
pub use none::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    use crate::config::AuthMethod;

    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::Ed25519 => {
            let public_key = config.public_key.as_deref().ok_or_else(|| {
                AuthError::ConfigurationError(
                    "public_key must be set when using ed25519 auth method".to_string(),
                )
            })?;
            Ok(Box::new(Ed25519Authenticator::from_hex(public_key)?))
        }
    }
}
