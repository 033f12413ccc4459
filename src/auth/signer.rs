use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::models::{AccessTokenClaims, SessionPayload};
use crate::clock::Clock;
use crate::error::ServerError;

/// 签名器错误
#[derive(Debug, Error)]
pub enum SignerError {
    /// 签名不匹配或编码格式错误
    #[error("token signature is invalid or the token is malformed")]
    InvalidSignature,
    /// 签名有效但已过期
    #[error("token has expired")]
    Expired,
    /// iat + ttl 超出可表示的时间范围
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<SignerError> for ServerError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::InvalidSignature => ServerError::unauthorized("invalid token"),
            SignerError::Expired => ServerError::unauthorized("token has expired"),
            SignerError::Signing(_) | SignerError::ExpiryOutOfRange => {
                ServerError::internal("error generating access token").with_source(err)
            }
        }
    }
}

/// JWT 签发和验证 (HS256 对称加密)
///
/// 没有 I/O，也没有共享可变状态；过期判断使用注入的时钟而不是库自带的系统时间检查。
pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtSigner {
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        }
    }

    /// 签发令牌：iat = now，exp = now + ttl（整秒）
    pub fn issue(&self, payload: &SessionPayload, ttl: Duration) -> Result<String, SignerError> {
        let iat = self.clock.now().timestamp();
        let exp = iat
            .checked_add(ttl.num_seconds())
            .filter(|exp| DateTime::from_timestamp(*exp, 0).is_some())
            .ok_or(SignerError::ExpiryOutOfRange)?;
        let claims = AccessTokenClaims {
            payload: payload.clone(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(SignerError::Signing)
    }

    /// 验证令牌，返回载荷和绝对过期时间
    pub fn verify(&self, token: &str) -> Result<(SessionPayload, DateTime<Utc>), SignerError> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| SignerError::InvalidSignature)?;

        let claims = data.claims;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(SignerError::InvalidSignature)?;

        if self.clock.now() >= expires_at {
            return Err(SignerError::Expired);
        }

        Ok((claims.payload, expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::clock::ManualClock;

    const SECRET: &str = "test-secret-key-at-least-32-chars!!";

    fn payload() -> SessionPayload {
        SessionPayload {
            user_id: 42,
            role: Role::Employee,
            company_id: 7,
        }
    }

    fn signer() -> (JwtSigner, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (JwtSigner::new(SECRET, clock.clone()), clock)
    }

    #[test]
    fn test_issue_and_verify() {
        let (signer, clock) = signer();
        let token = signer.issue(&payload(), Duration::minutes(15)).unwrap();

        let (decoded, expires_at) = signer.verify(&token).unwrap();
        assert_eq!(decoded, payload());
        assert_eq!(expires_at, clock.now() + Duration::minutes(15));
    }

    #[test]
    fn test_issue_rejects_expiry_past_calendar_range() {
        let (signer, _clock) = signer();
        let err = signer
            .issue(&payload(), Duration::days(200_000_000))
            .unwrap_err();
        assert!(matches!(err, SignerError::ExpiryOutOfRange));
        assert_eq!(
            ServerError::from(err).kind(),
            crate::error::ErrorKind::Internal
        );
    }

    #[test]
    fn test_valid_until_just_before_expiry() {
        let (signer, clock) = signer();
        let token = signer.issue(&payload(), Duration::seconds(60)).unwrap();

        clock.advance(Duration::seconds(59));
        assert!(signer.verify(&token).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(matches!(signer.verify(&token), Err(SignerError::Expired)));
    }

    #[test]
    fn test_tampering_any_byte_is_rejected() {
        let (signer, _clock) = signer();
        let token = signer.issue(&payload(), Duration::minutes(15)).unwrap();

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert!(
                matches!(signer.verify(&tampered), Err(SignerError::InvalidSignature)),
                "tampered byte {} was accepted",
                i
            );
        }
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let (signer, clock) = signer();
        let other = JwtSigner::new("another-secret-key-at-least-32-chars", clock);
        let token = other.issue(&payload(), Duration::minutes(15)).unwrap();

        assert!(matches!(signer.verify(&token), Err(SignerError::InvalidSignature)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let (signer, _clock) = signer();
        assert!(matches!(
            signer.verify("invalid.token.here"),
            Err(SignerError::InvalidSignature)
        ));
        assert!(matches!(signer.verify(""), Err(SignerError::InvalidSignature)));
    }

    #[test]
    fn test_same_second_tokens_differ() {
        let (signer, _clock) = signer();
        let a = signer.issue(&payload(), Duration::minutes(15)).unwrap();
        let b = signer.issue(&payload(), Duration::minutes(15)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_error_classification() {
        let err: ServerError = SignerError::Expired.into();
        assert_eq!(err.kind(), crate::error::ErrorKind::Unauthorized);
        let err: ServerError = SignerError::InvalidSignature.into();
        assert_eq!(err.kind(), crate::error::ErrorKind::Unauthorized);
    }
}
