use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::claims::{Claims, SessionIdentity},
    config::JwtConfig,
    state::AppState,
};

/// Lifetime of a session token and of the cookie carrying it.
pub const SESSION_TTL: Duration = Duration::days(7);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }

    pub fn sign(&self, identity: &SessionIdentity) -> anyhow::Result<String> {
        self.sign_at(identity, OffsetDateTime::now_utc())
    }

    /// Mints a token as if issued at `now`.
    pub fn sign_at(&self, identity: &SessionIdentity, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + SESSION_TTL;
        let claims = Claims {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role.clone(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %identity.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Checks signature, issuer and audience, then expiry against `now`.
    /// Every failure is an error; there is no partial success.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        // expiry is compared against the supplied clock below
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if now.unix_timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        })
    }

    fn identity() -> SessionIdentity {
        SessionIdentity {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            role: "user".into(),
        }
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let who = identity();
        let token = keys.sign(&who).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.identity(), who);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, SESSION_TTL.whole_seconds());
    }

    #[test]
    fn valid_until_just_before_expiry() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc();
        let token = keys.sign_at(&identity(), issued).unwrap();

        let almost = issued + SESSION_TTL - Duration::seconds(1);
        assert!(keys.verify_at(&token, almost).is_ok());

        let expired = issued + SESSION_TTL;
        assert!(matches!(
            keys.verify_at(&token, expired),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn token_issued_eight_days_ago_is_expired() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys
            .sign_at(&identity(), OffsetDateTime::now_utc() - Duration::days(8))
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn any_altered_byte_is_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign(&identity()).unwrap();
        let bytes = token.as_bytes();
        for i in 0..bytes.len() {
            let mut altered = bytes.to_vec();
            altered[i] = if altered[i] == b'A' { b'B' } else { b'A' };
            let altered = String::from_utf8(altered).unwrap();
            if altered == token {
                continue;
            }
            assert!(
                keys.verify(&altered).is_err(),
                "altered byte {i} was accepted"
            );
        }
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_keys("secret-a", "iss", "aud");
        let bad = make_keys("secret-b", "iss", "aud");
        let token = good.sign(&identity()).unwrap();
        assert!(matches!(bad.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good_keys.sign(&identity()).unwrap();
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.verify("").is_err());
        assert!(keys.verify("not.a.jwt").is_err());
    }
}
