//! SASL initial-response encoding.
//!
//! Implements XOAUTH2 (Google/Microsoft proprietary `OAuth2`
//! authentication), the mechanism the connection's `authenticate` uses.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Generates the XOAUTH2 initial response.
///
/// Format: `user=<user>\x01auth=Bearer <token>\x01\x01`, base64 encoded.
#[must_use]
pub fn xoauth2_response(user: &str, token: &str) -> String {
    let auth_string = format!("user={user}\x01auth=Bearer {token}\x01\x01");
    STANDARD.encode(auth_string.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xoauth2_format() {
        let response = xoauth2_response("user@example.com", "token123");
        let decoded = STANDARD.decode(&response).unwrap();
        assert_eq!(
            decoded,
            b"user=user@example.com\x01auth=Bearer token123\x01\x01"
        );
    }

    #[test]
    fn response_is_base64_only() {
        let response = xoauth2_response("user@example.com", "ya29.a0AfH6");
        assert!(
            response
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
        );
    }
}
