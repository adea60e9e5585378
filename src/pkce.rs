use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::state::random_token;

/// How a PKCE code challenge is derived from its verifier (RFC 7636 §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeChallengeMethod {
    #[default]
    S256,
    Plain,
}

impl CodeChallengeMethod {
    /// Value of the `code_challenge_method` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            CodeChallengeMethod::S256 => "S256",
            CodeChallengeMethod::Plain => "plain",
        }
    }
}

/// A fresh code verifier of 43 unreserved characters, within the 43..=128
/// range RFC 7636 §4.1 allows.
pub fn generate_code_verifier() -> String {
    random_token()
}

pub fn create_code_challenge(verifier: &str, method: CodeChallengeMethod) -> String {
    match method {
        CodeChallengeMethod::S256 => URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())),
        CodeChallengeMethod::Plain => verifier.to_string(),
    }
}
