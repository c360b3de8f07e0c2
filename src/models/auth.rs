// Authentication models: bearer token claims

use serde::{Deserialize, Serialize};

/// Access token claims carried by every authenticated request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// User ID (subject)
    pub sub: String,

    /// JWT ID (UUID format)
    pub jti: String,

    /// User email address
    pub email: String,

    pub aud: String,

    pub iss: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,

    /// Expires at timestamp (Unix epoch seconds)
    pub exp: u64,
}

impl AccessTokenClaims {
    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        self.exp < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired() {
        let claims = AccessTokenClaims {
            sub: "user".to_string(),
            jti: "jti".to_string(),
            email: "user@example.com".to_string(),
            aud: "classificados".to_string(),
            iss: "classificados".to_string(),
            iat: 0,
            exp: 1,
        };
        assert!(claims.is_expired());

        let fresh = AccessTokenClaims {
            exp: u64::MAX,
            ..claims
        };
        assert!(!fresh.is_expired());
    }
}
