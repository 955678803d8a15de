use std::collections::HashMap;

/// Header carrying the hex-encoded request signature.
pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
/// Header carrying the signed timestamp.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Request information for authentication
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl AuthRequest {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_are_lowercased() {
        let request = AuthRequest::new("{}").with_header("X-Signature-Timestamp", "123");
        assert_eq!(request.header(TIMESTAMP_HEADER), Some("123"));
        assert_eq!(request.body, b"{}");
    }
}
