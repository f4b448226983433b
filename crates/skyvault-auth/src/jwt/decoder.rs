//! Session token validation.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use skyvault_core::config::AuthConfig;
use skyvault_core::error::AppError;

use super::claims::{Claims, TokenType};

/// Validates session tokens against the shared secret.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is enforced by the explicit check in `verify` so that a
        // token is rejected exactly at its expiry instant, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes a token string and validates it as the expected kind.
    ///
    /// Fails with `InvalidToken` when:
    /// 1. The signature does not verify
    /// 2. The claims are malformed or the subject is missing
    /// 3. The token kind does not match `expected`
    /// 4. The expiry has elapsed (the expiry instant itself is rejected)
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::invalid_token("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::invalid_token("Invalid token signature")
                    }
                    _ => AppError::invalid_token(format!("Token validation failed: {e}")),
                }
            })?;

        let claims = token_data.claims;

        if claims.sub.is_empty() {
            return Err(AppError::invalid_token("Token subject is missing"));
        }

        if claims.token_type != expected {
            return Err(AppError::invalid_token(match expected {
                TokenType::Access => "Invalid token type: expected access token",
                TokenType::Refresh => "Invalid token type: expected refresh token",
            }));
        }

        if Utc::now().timestamp() >= claims.exp {
            return Err(AppError::invalid_token("Token has expired"));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use skyvault_core::error::ErrorKind;
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            ..AuthConfig::default()
        }
    }

    fn sign_with(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issued_access_token_verifies() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);
        let user_id = Uuid::new_v4();

        let (token, _) = encoder.issue_access("alice", user_id).unwrap();
        let claims = decoder.verify(&token, TokenType::Access).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn wrong_kind_is_rejected_both_ways() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);
        let user_id = Uuid::new_v4();

        let (access, _) = encoder.issue_access("alice", user_id).unwrap();
        let (refresh, _) = encoder.issue_refresh("alice", user_id).unwrap();

        let err = decoder.verify(&access, TokenType::Refresh).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
        let err = decoder.verify(&refresh, TokenType::Access).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config();
        let decoder = JwtDecoder::new(&config);

        let claims = Claims {
            sub: "alice".to_string(),
            user_id: Uuid::new_v4(),
            exp: (Utc::now() - Duration::seconds(1)).timestamp(),
            token_type: TokenType::Access,
        };
        let token = sign_with(&config.jwt_secret, &claims);

        let err = decoder.verify(&token, TokenType::Access).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
        assert!(err.message.contains("expired"));
    }

    #[test]
    fn token_at_exact_expiry_instant_is_rejected() {
        let config = config();
        let decoder = JwtDecoder::new(&config);

        let claims = Claims {
            sub: "alice".to_string(),
            user_id: Uuid::new_v4(),
            exp: Utc::now().timestamp(),
            token_type: TokenType::Access,
        };
        let token = sign_with(&config.jwt_secret, &claims);

        let err = decoder.verify(&token, TokenType::Access).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let (token, _) = encoder.issue_access("alice", Uuid::new_v4()).unwrap();

        // Flip the last signature character.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let err = decoder.verify(&tampered, TokenType::Access).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = config();
        let decoder = JwtDecoder::new(&config);

        let claims = Claims {
            sub: "alice".to_string(),
            user_id: Uuid::new_v4(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            token_type: TokenType::Access,
        };
        let token = sign_with("some-other-secret", &claims);

        let err = decoder.verify(&token, TokenType::Access).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let config = config();
        let decoder = JwtDecoder::new(&config);

        let err = decoder
            .verify("not-a-token", TokenType::Access)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn empty_subject_is_rejected() {
        let config = config();
        let decoder = JwtDecoder::new(&config);

        let claims = Claims {
            sub: String::new(),
            user_id: Uuid::new_v4(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            token_type: TokenType::Access,
        };
        let token = sign_with(&config.jwt_secret, &claims);

        let err = decoder.verify(&token, TokenType::Access).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
        assert!(err.message.contains("subject"));
    }
}
