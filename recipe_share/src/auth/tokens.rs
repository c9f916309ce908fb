//! Access-token issuance/verification and refresh-token generation.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;

use super::errors::{AuthError, AuthResult};
use super::models::{AccessTokenClaims, UserId};

/// Default access-token lifetime in seconds (15 minutes).
///
/// Access tokens are meant to be short-lived; session longevity comes from
/// the refresh token.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Random bytes behind an opaque refresh token (256 bits of entropy).
const REFRESH_TOKEN_BYTES: usize = 32;

/// Claims `token_type` value accepted for request authentication.
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Creates and verifies signed access tokens, and generates opaque refresh
/// tokens.
///
/// Access tokens are HS256 JWTs signed with a single server-held secret and
/// carry `{sub, email, token_type, iat, exp}`. They are fully self-contained:
/// verification never consults storage. Refresh tokens are random hex strings
/// with no embedded claims; they only mean something to the server-side store.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
}

impl TokenCodec {
    /// Create a codec with the default access-token lifetime.
    pub fn new(secret: &str) -> Self {
        Self::with_access_ttl(secret, Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS))
    }

    /// Create a codec with an explicit access-token lifetime.
    pub fn with_access_ttl(secret: &str, access_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
        }
    }

    /// Issue a signed access token for the given user.
    pub fn issue_access(&self, user_id: UserId, email: &str) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id,
            email: email.to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify an access token's signature, expiry, and type.
    ///
    /// Expired and structurally invalid tokens map to distinct error kinds
    /// for diagnostics, but [`AuthError::client_message`] presents both as a
    /// single generic rejection. A signed token whose `token_type` is not
    /// `"access"` is rejected, so refresh tokens can never stand in for
    /// access tokens.
    pub fn verify_access(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let mut validation = Validation::default();
        // No grace period: a token past `exp` is rejected immediately.
        validation.leeway = 0;

        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation).map_err(
            |err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenMalformed,
            },
        )?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::TokenMalformed);
        }

        Ok(data.claims)
    }

    /// Generate an opaque refresh token.
    ///
    /// 32 bytes from a CSPRNG, hex-encoded to a fixed 64-character string.
    /// The token is a capability reference: it carries no claims and is
    /// meaningless without the matching server-side record.
    pub fn issue_refresh(&self) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}
