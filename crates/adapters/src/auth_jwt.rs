//! HS256 JSON Web Token issuer and verifier

use birdfeed_domain::{AuthError, Claims, IdentityVerifier, TokenIssuer};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use time::OffsetDateTime;

/// Signs and verifies bearer tokens with a shared secret
pub struct JwtAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuthority {
    pub fn new(secret: &SecretString) -> Result<Self, AuthError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.is_empty() {
            return Err(AuthError::Issue("JWT secret is empty".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        })
    }
}

impl TokenIssuer for JwtAuthority {
    fn issue(&self, user_uuid: &str, account_id: &str, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims {
            user_uuid: user_uuid.to_string(),
            account_id: account_id.to_string(),
            exp: OffsetDateTime::now_utc().unix_timestamp() + ttl.as_secs() as i64,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Issue(e.to_string()))
    }
}

impl IdentityVerifier for JwtAuthority {
    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        if data.claims.user_uuid.is_empty() || data.claims.account_id.is_empty() {
            return Err(AuthError::InvalidToken("token carries no identity".to_string()));
        }
        Ok(data.claims)
    }
}
