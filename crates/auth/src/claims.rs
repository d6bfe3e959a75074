use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gradeportal_core::UserId;

/// Audience every user session token carries.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Claims carried by a session token.
///
/// Timestamps are encoded as seconds since the epoch so the tokens are ordinary JWTs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user id.
    pub sub: UserId,

    pub email: String,

    pub aud: String,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("unexpected audience '{0}'")]
    WrongAudience(String),

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Deterministically validate session claims against `now`.
///
/// Signature checks happen in the codec; this only looks at the claim values.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.aud != AUTHENTICATED_AUDIENCE {
        return Err(TokenValidationError::WrongAudience(claims.aud.clone()));
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn claims_at(iat: DateTime<Utc>, ttl: Duration) -> SessionClaims {
        SessionClaims {
            sub: UserId::new(),
            email: "jane@x.com".to_string(),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            iat,
            exp: iat + ttl,
        }
    }

    #[test]
    fn accepts_token_inside_window() {
        let iat = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let claims = claims_at(iat, Duration::hours(1));
        assert_eq!(validate_claims(&claims, iat + Duration::minutes(5)), Ok(()));
    }

    #[test]
    fn rejects_expired_and_future_tokens() {
        let iat = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let claims = claims_at(iat, Duration::hours(1));
        assert_eq!(
            validate_claims(&claims, iat + Duration::hours(1)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, iat - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn rejects_inverted_window_and_foreign_audience() {
        let iat = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let inverted = claims_at(iat, Duration::seconds(0));
        assert_eq!(
            validate_claims(&inverted, iat),
            Err(TokenValidationError::InvalidTimeWindow)
        );

        let mut foreign = claims_at(iat, Duration::hours(1));
        foreign.aud = "service_role".to_string();
        assert_eq!(
            validate_claims(&foreign, iat),
            Err(TokenValidationError::WrongAudience("service_role".to_string()))
        );
    }
}
