//! Bearer-token authentication for inbound requests.

use super::errors::{AuthError, AuthResult};
use super::models::Principal;
use super::tokens::TokenCodec;

const BEARER_PREFIX: &str = "Bearer ";

/// Extracts and verifies the access token from a raw `Authorization` header
/// value, yielding the authenticated [`Principal`].
///
/// Pure computation over the header string and the signing secret; safe to
/// call on every request with no storage lookup and no side effects.
#[derive(Clone)]
pub struct RequestAuthenticator {
    codec: TokenCodec,
}

impl RequestAuthenticator {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    /// Authenticate a request from its raw `Authorization` header value.
    ///
    /// A missing header or one without the `Bearer ` scheme rejects with
    /// [`AuthError::TokenMissing`]; a present-but-invalid token surfaces the
    /// codec's rejection. The two carry different diagnostic messages but
    /// map to the same transport-level status.
    pub fn authenticate(&self, header: Option<&str>) -> AuthResult<Principal> {
        let header = header.ok_or(AuthError::TokenMissing)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::TokenMissing)?;

        let claims = self.codec.verify_access(token)?;

        Ok(Principal {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
