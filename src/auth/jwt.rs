//! Bearer tokens for API clients that do not keep cookies.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID};

/// How long a bearer token is valid for after log-in.
pub const BEARER_TOKEN_DURATION: Duration = Duration::hours(24);

/// The keys for signing and verifying bearer tokens with HS256.
#[derive(Clone)]
pub struct BearerKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl BearerKeys {
    /// Derive the signing and verification keys from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// The expiry time of the token as a Unix timestamp.
    pub exp: i64,
}

/// Issue a bearer token for `user_id` that expires after [BEARER_TOKEN_DURATION].
///
/// # Errors
///
/// Returns an [Error::TokenError] if the token could not be signed.
pub fn create_bearer_token(user_id: UserID, keys: &BearerKeys) -> Result<String, Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (OffsetDateTime::now_utc() + BEARER_TOKEN_DURATION).unix_timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenError(error.to_string()))
}

/// Check the signature and expiry of `token` and return the user it was issued to.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the token is malformed, has a bad signature or has expired.
pub fn verify_bearer_token(token: &str, keys: &BearerKeys) -> Result<UserID, Error> {
    let token_data =
        decode::<Claims>(token, &keys.decoding_key, &Validation::default()).map_err(|error| {
            tracing::debug!("Rejected bearer token: {error}");
            Error::Unauthorized
        })?;

    token_data
        .claims
        .sub
        .parse()
        .map(UserID::new)
        .map_err(|_| Error::Unauthorized)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use time::OffsetDateTime;

    use crate::{
        Error, UserID,
        auth::jwt::{BearerKeys, Claims, create_bearer_token, verify_bearer_token},
    };

    #[test]
    fn verify_gives_back_user_id() {
        let keys = BearerKeys::new("foobar");

        let token = create_bearer_token(UserID::new(42), &keys).unwrap();

        assert_eq!(verify_bearer_token(&token, &keys), Ok(UserID::new(42)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_bearer_token(UserID::new(42), &BearerKeys::new("foobar")).unwrap();

        let result = verify_bearer_token(&token, &BearerKeys::new("bazqux"));

        assert_eq!(result, Err(Error::Unauthorized));
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: "42".to_owned(),
            exp: OffsetDateTime::now_utc().unix_timestamp() - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"foobar"),
        )
        .unwrap();

        let result = verify_bearer_token(&token, &BearerKeys::new("foobar"));

        assert_eq!(result, Err(Error::Unauthorized));
    }

    #[test]
    fn garbage_is_rejected() {
        let result = verify_bearer_token("not.a.token", &BearerKeys::new("foobar"));

        assert_eq!(result, Err(Error::Unauthorized));
    }
}
