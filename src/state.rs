use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

/// Value for the `state` parameter of an authorization request, binding the
/// redirect to the session that started it (RFC 6749 §10.12).
pub fn generate_state() -> String {
    random_token()
}

/// 32 bytes from the thread-local CSPRNG, base64url without padding.
/// The 43 output characters are all unreserved, so they pass through the
/// form codec untouched.
pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
