//! Integration tests for the storage-free authentication components.
//!
//! Covers the public token codec, password hasher, and request
//! authenticator surfaces end to end, without a database.

use proptest::prelude::*;
use recipe_share::auth::{AuthError, PasswordHasher, RequestAuthenticator, TokenCodec};

const SECRET: &str = "integration_test_signing_secret";

#[test]
fn issued_access_token_authenticates_a_request() {
    let codec = TokenCodec::new(SECRET);
    let authenticator = RequestAuthenticator::new(codec.clone());

    let token = codec.issue_access(12, "cook@example.com").unwrap();
    let principal = authenticator
        .authenticate(Some(&format!("Bearer {token}")))
        .unwrap();

    assert_eq!(principal.user_id, 12);
    assert_eq!(principal.email, "cook@example.com");
}

#[test]
fn request_without_header_is_distinguishable_from_bad_token() {
    let codec = TokenCodec::new(SECRET);
    let authenticator = RequestAuthenticator::new(codec);

    let missing = authenticator.authenticate(None).unwrap_err();
    let invalid = authenticator
        .authenticate(Some("Bearer garbage"))
        .unwrap_err();

    assert!(matches!(missing, AuthError::TokenMissing));
    assert!(matches!(invalid, AuthError::TokenMalformed));
    // Different diagnostics, but both map to the same client-facing family.
    assert_ne!(missing.to_string(), invalid.to_string());
}

#[test]
fn access_token_does_not_verify_under_a_rotated_secret() {
    let old_codec = TokenCodec::new(SECRET);
    let token = old_codec.issue_access(12, "cook@example.com").unwrap();

    let rotated = TokenCodec::new("a_new_signing_secret_after_rotation");
    assert!(rotated.verify_access(&token).is_err());

    // Refresh tokens are opaque and unaffected by signing-secret rotation.
    let refresh = old_codec.issue_refresh();
    assert_eq!(refresh.len(), rotated.issue_refresh().len());
}

#[test]
fn password_digests_are_salted_and_verifiable() {
    let hasher = PasswordHasher::new("integration_pepper");

    let first = hasher.hash("buttered6toast").unwrap();
    let second = hasher.hash("buttered6toast").unwrap();

    assert_ne!(first, second);
    assert!(hasher.verify("buttered6toast", &first));
    assert!(hasher.verify("buttered6toast", &second));
    assert!(!hasher.verify("buttered7toast", &first));
}

proptest! {
    /// Claims survive a codec round-trip for arbitrary user ids and emails.
    #[test]
    fn access_claims_round_trip(
        user_id in 1i64..i64::MAX / 2,
        email in "[a-z]{1,12}@[a-z]{1,12}\\.[a-z]{2,4}",
    ) {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue_access(user_id, &email).unwrap();
        let claims = codec.verify_access(&token).unwrap();

        prop_assert_eq!(claims.sub, user_id);
        prop_assert_eq!(claims.email, email);
    }

    /// Refresh tokens are always 64 hex characters, whatever else happens.
    #[test]
    fn refresh_tokens_are_uniform(_seed in 0u8..8) {
        let token = TokenCodec::new(SECRET).issue_refresh();
        prop_assert_eq!(token.len(), 64);
        prop_assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
