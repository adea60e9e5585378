//! Typed encoding of OAuth 2.0 grant requests and decoding of their
//! responses (RFC 6749).
//!
//! Every grant request type implements [`GrantRequest`]: it turns itself into
//! an [`HttpRequest`] and decodes the matching [`HttpResponse`] into an
//! [`Outcome`]. Sending the request is left to an [`HttpClient`].
//!
//! ```
//! use oauth2_wire::{
//!     AccessTokenResponseLike, ClientCredentialsRequest, GrantRequest, HttpResponse, Outcome,
//! };
//!
//! let grant = ClientCredentialsRequest::new("https://server.example.com/token")
//!     .with_scopes(&["read"]);
//! let request = grant.to_http_request()?;
//! assert_eq!(request.body.as_deref(), Some(&b"grant_type=client_credentials&scope=read"[..]));
//!
//! let response = HttpResponse::new(
//!     200,
//!     r#"{"access_token":"abc","token_type":"bearer","expires_in":3600}"#,
//! );
//! match grant.parse_response(&response)? {
//!     Outcome::Success(tokens) => assert_eq!(tokens.access_token(), "abc"),
//!     Outcome::Error(err) => panic!("server refused: {err:?}"),
//! }
//! # Ok::<(), oauth2_wire::Error>(())
//! ```

mod client;
mod config;
mod error;
mod error_code;
mod form;
mod grant;
mod http;
mod params;
mod pkce;
mod request;
mod response;
mod state;

// Core
pub use error::Error;
pub use grant::{Grant, GrantErrorResponse, GrantResponse};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use request::{
    AuthorizationCodeAccessTokenRequest, AuthorizationCodeRequest, ClientAuthMethod,
    ClientCredentialsRequest, Credentials, GrantKind, GrantRequest, ImplicitRequest,
    PkceChallenge, RefreshTokenRequest, ResourceOwnerPasswordCredentialsRequest,
    encode_basic_credentials,
};
pub use response::{
    AccessTokenErrorResponse, AccessTokenResponse, AccessTokenResponseLike,
    AuthorizationErrorResponse, AuthorizationResponse, ErrorResponse, ErrorResponseLike,
    ImplicitAccessTokenResponse, Outcome, RefreshableAccessTokenResponse,
    parse_authorization_response, parse_implicit_response, parse_token_response,
};

// Codec and parameter model
pub use error_code::{AccessTokenErrorCode, AuthorizationErrorCode, ErrorCode};
pub use form::{FormUrlEncoded, escape, unescape};
pub use params::{
    AuthorizationCodeTokenParam, AuthorizationParam, ClientAuthParameter, ClientCredentialsParam,
    ParameterName, ParameterSet, PasswordParam, RefreshTokenParam,
};

// Client
pub use client::{OAuth2Client, send_grant_request};
pub use config::ClientConfig;

// Utilities
pub use pkce::{CodeChallengeMethod, create_code_challenge, generate_code_verifier};
pub use state::generate_state;
