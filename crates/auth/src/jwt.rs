//! HS256 session token codec.
//!
//! Used by the in-memory session store to mint and check tokens that look like
//! the ones the hosted service hands out.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::{AUTHENTICATED_AUDIENCE, SessionClaims, TokenValidationError, validate_claims};
use crate::{AccessToken, AuthUser};

#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Mint a token for `user`, valid from `now` for `ttl`.
    pub fn issue(
        &self,
        user: &AuthUser,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(AccessToken, SessionClaims), jsonwebtoken::errors::Error> {
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            iat: now,
            exp: now + ttl,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((AccessToken::new(token), claims))
    }

    /// Verify the signature, then the claim values against `now`.
    pub fn decode(&self, token: &AccessToken, now: DateTime<Utc>) -> Result<SessionClaims, TokenValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run through `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

        let data = jsonwebtoken::decode::<SessionClaims>(token.as_str(), &self.decoding, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
