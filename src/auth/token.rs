//! Bearer tokens for the expense routes.
//!
//! A token is an HS256 JSON web token whose subject is the ID of the logged in
//! user. Handlers take [Claims] as an argument to require a valid token.

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// How long a token is valid for after log-in.
pub const TOKEN_DURATION: Duration = Duration::hours(1);

/// The keys used to sign and check tokens.
#[derive(Clone)]
pub struct JwtKeys {
    /// Signs new tokens.
    pub encoding: EncodingKey,
    /// Checks the signature of tokens sent by clients.
    pub decoding: DecodingKey,
}

impl JwtKeys {
    /// Create the keys from a shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The contents of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: UserID,
    /// When the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// When the token expires, in seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Check that `owner_id` refers to the user the token was issued to.
    ///
    /// # Errors
    ///
    /// Returns a:
    /// - [Error::InvalidOwnerIdentity] if `owner_id` is not a user ID,
    /// - or [Error::OwnerMismatch] if it is another user's ID.
    pub fn authorize(&self, owner_id: &str) -> Result<UserID, Error> {
        let user_id: UserID = owner_id.parse()?;

        if user_id != self.sub {
            tracing::warn!(
                "user {} tried to access the expenses of user {user_id}",
                self.sub
            );
            return Err(Error::OwnerMismatch);
        }

        Ok(user_id)
    }
}

impl<S> FromRequestParts<S> for Claims
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::InvalidToken)?;

        let keys = JwtKeys::from_ref(state);

        decode_jwt(bearer.token(), &keys.decoding)
    }
}

/// Create a token for `user_id` that expires after [TOKEN_DURATION].
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_jwt(user_id: UserID, encoding_key: &EncodingKey) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id,
        iat: now.unix_timestamp(),
        exp: (now + TOKEN_DURATION).unix_timestamp(),
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Check the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, signed with another
/// key or has expired.
pub fn decode_jwt(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("rejected auth token: {error}");
            Error::InvalidToken
        })
}
