use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::form::{FormUrlEncoded, escape};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::params::{
    AuthorizationCodeTokenParam, AuthorizationParam, ClientAuthParameter, ClientCredentialsParam,
    ParameterSet, PasswordParam, RefreshTokenParam,
};
use crate::pkce::{CodeChallengeMethod, create_code_challenge};
use crate::response::{
    AccessTokenErrorResponse, AccessTokenResponse, AuthorizationErrorResponse,
    AuthorizationResponse, ImplicitAccessTokenResponse, Outcome, parse_authorization_response,
    parse_implicit_response, parse_token_response,
};

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantKind {
    AuthorizationCode,
    Implicit,
    AuthorizationCodeAccessToken,
    ResourceOwnerPasswordCredentials,
    ClientCredentials,
    RefreshToken,
}

impl GrantKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GrantKind::AuthorizationCode => "authorization_code_redirect",
            GrantKind::Implicit => "implicit",
            GrantKind::AuthorizationCodeAccessToken => "authorization_code",
            GrantKind::ResourceOwnerPasswordCredentials => "password",
            GrantKind::ClientCredentials => "client_credentials",
            GrantKind::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for GrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed OAuth2 request: encodes itself into an [`HttpRequest`] and knows
/// how to decode the matching response.
pub trait GrantRequest {
    type Success;
    type Error;

    fn kind(&self) -> GrantKind;

    /// Build the wire request. Fails only when the endpoint URL is unusable.
    fn to_http_request(&self) -> Result<HttpRequest, Error>;

    /// Decode the response into the grant's success or error value. `Err`
    /// means the response matched neither shape.
    fn parse_response(
        &self,
        response: &HttpResponse,
    ) -> Result<Outcome<Self::Success, Self::Error>, Error>;
}

/// Where token requests carry the client credentials (RFC 6749 §2.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// `client_id` / `client_secret` form parameters.
    #[default]
    RequestBody,
    /// HTTP Basic `Authorization` header; the body carries neither key.
    Basic,
}

/// Client identifier plus optional secret (public clients have none).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_method: ClientAuthMethod,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Some(client_secret.into()),
            auth_method: ClientAuthMethod::default(),
        }
    }

    pub fn public(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            auth_method: ClientAuthMethod::default(),
        }
    }

    pub fn with_auth_method(mut self, auth_method: ClientAuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("auth_method", &self.auth_method)
            .finish()
    }
}

/// PKCE parameters sent with the authorization redirect (RFC 7636 §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    pub challenge: String,
    pub method: CodeChallengeMethod,
}

impl PkceChallenge {
    pub fn from_verifier(verifier: &str, method: CodeChallengeMethod) -> Self {
        Self {
            challenge: create_code_challenge(verifier, method),
            method,
        }
    }
}

/// Browser redirect to the authorization endpoint, `response_type=code`
/// (RFC 6749 §4.1.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCodeRequest {
    pub endpoint: String,
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub pkce: Option<PkceChallenge>,
}

impl AuthorizationCodeRequest {
    pub fn new(endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            redirect_uri: None,
            scope: None,
            state: None,
            pkce: None,
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Scopes are sent space-delimited; an empty slice sends no `scope`.
    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scope = join_scopes(scopes);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_pkce(mut self, verifier: &str, method: CodeChallengeMethod) -> Self {
        self.pkce = Some(PkceChallenge::from_verifier(verifier, method));
        self
    }
}

impl GrantRequest for AuthorizationCodeRequest {
    type Success = AuthorizationResponse;
    type Error = AuthorizationErrorResponse;

    fn kind(&self) -> GrantKind {
        GrantKind::AuthorizationCode
    }

    fn to_http_request(&self) -> Result<HttpRequest, Error> {
        create_authorization_request(self.kind(), &self.endpoint, |params| {
            params
                .set(AuthorizationParam::ResponseType, "code")
                .set(AuthorizationParam::ClientId, &self.client_id)
                .set_opt(AuthorizationParam::RedirectUri, self.redirect_uri.as_deref())
                .set_opt(AuthorizationParam::Scope, self.scope.as_deref())
                .set_opt(AuthorizationParam::State, self.state.as_deref());

            if let Some(pkce) = &self.pkce {
                params
                    .set(AuthorizationParam::CodeChallenge, &pkce.challenge)
                    .set(AuthorizationParam::CodeChallengeMethod, pkce.method.as_str());
            }
        })
    }

    fn parse_response(
        &self,
        response: &HttpResponse,
    ) -> Result<Outcome<Self::Success, Self::Error>, Error> {
        parse_authorization_response(response)
    }
}

/// Browser redirect to the authorization endpoint, `response_type=token`
/// (RFC 6749 §4.2.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitRequest {
    pub endpoint: String,
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
}

impl ImplicitRequest {
    pub fn new(endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            redirect_uri: None,
            scope: None,
            state: None,
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scope = join_scopes(scopes);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

impl GrantRequest for ImplicitRequest {
    type Success = ImplicitAccessTokenResponse;
    type Error = AuthorizationErrorResponse;

    fn kind(&self) -> GrantKind {
        GrantKind::Implicit
    }

    fn to_http_request(&self) -> Result<HttpRequest, Error> {
        create_authorization_request(self.kind(), &self.endpoint, |params| {
            params
                .set(AuthorizationParam::ResponseType, "token")
                .set(AuthorizationParam::ClientId, &self.client_id)
                .set_opt(AuthorizationParam::RedirectUri, self.redirect_uri.as_deref())
                .set_opt(AuthorizationParam::Scope, self.scope.as_deref())
                .set_opt(AuthorizationParam::State, self.state.as_deref());
        })
    }

    fn parse_response(
        &self,
        response: &HttpResponse,
    ) -> Result<Outcome<Self::Success, Self::Error>, Error> {
        parse_implicit_response(response)
    }
}

/// Exchange of an authorization code at the token endpoint (RFC 6749 §4.1.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCodeAccessTokenRequest {
    pub endpoint: String,
    pub code: String,
    /// Must equal the `redirect_uri` of the authorization request, if one was sent.
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub credentials: Option<Credentials>,
}

impl AuthorizationCodeAccessTokenRequest {
    pub fn new(endpoint: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            code: code.into(),
            redirect_uri: None,
            code_verifier: None,
            credentials: None,
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_code_verifier(mut self, code_verifier: impl Into<String>) -> Self {
        self.code_verifier = Some(code_verifier.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

impl GrantRequest for AuthorizationCodeAccessTokenRequest {
    type Success = AccessTokenResponse;
    type Error = AccessTokenErrorResponse;

    fn kind(&self) -> GrantKind {
        GrantKind::AuthorizationCodeAccessToken
    }

    fn to_http_request(&self) -> Result<HttpRequest, Error> {
        let mut params = ParameterSet::new();
        params
            .set(AuthorizationCodeTokenParam::GrantType, "authorization_code")
            .set(AuthorizationCodeTokenParam::Code, &self.code)
            .set_opt(
                AuthorizationCodeTokenParam::RedirectUri,
                self.redirect_uri.as_deref(),
            )
            .set_opt(
                AuthorizationCodeTokenParam::CodeVerifier,
                self.code_verifier.as_deref(),
            );

        create_token_request(
            self.kind(),
            &self.endpoint,
            params,
            self.credentials.as_ref(),
        )
    }

    fn parse_response(
        &self,
        response: &HttpResponse,
    ) -> Result<Outcome<Self::Success, Self::Error>, Error> {
        parse_token_response(response)
    }
}

/// Resource owner password credentials grant (RFC 6749 §4.3.2).
#[derive(Clone, PartialEq, Eq)]
pub struct ResourceOwnerPasswordCredentialsRequest {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub scope: Option<String>,
    pub credentials: Option<Credentials>,
}

impl ResourceOwnerPasswordCredentialsRequest {
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            scope: None,
            credentials: None,
        }
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scope = join_scopes(scopes);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

impl fmt::Debug for ResourceOwnerPasswordCredentialsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceOwnerPasswordCredentialsRequest")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("scope", &self.scope)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl GrantRequest for ResourceOwnerPasswordCredentialsRequest {
    type Success = AccessTokenResponse;
    type Error = AccessTokenErrorResponse;

    fn kind(&self) -> GrantKind {
        GrantKind::ResourceOwnerPasswordCredentials
    }

    fn to_http_request(&self) -> Result<HttpRequest, Error> {
        let mut params = ParameterSet::new();
        params
            .set(PasswordParam::GrantType, "password")
            .set(PasswordParam::Username, &self.username)
            .set(PasswordParam::Password, &self.password)
            .set_opt(PasswordParam::Scope, self.scope.as_deref());

        create_token_request(
            self.kind(),
            &self.endpoint,
            params,
            self.credentials.as_ref(),
        )
    }

    fn parse_response(
        &self,
        response: &HttpResponse,
    ) -> Result<Outcome<Self::Success, Self::Error>, Error> {
        parse_token_response(response)
    }
}

/// Client credentials grant (RFC 6749 §4.4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentialsRequest {
    pub endpoint: String,
    pub scope: Option<String>,
    pub credentials: Option<Credentials>,
}

impl ClientCredentialsRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            scope: None,
            credentials: None,
        }
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scope = join_scopes(scopes);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

impl GrantRequest for ClientCredentialsRequest {
    type Success = AccessTokenResponse;
    type Error = AccessTokenErrorResponse;

    fn kind(&self) -> GrantKind {
        GrantKind::ClientCredentials
    }

    fn to_http_request(&self) -> Result<HttpRequest, Error> {
        let mut params = ParameterSet::new();
        params
            .set(ClientCredentialsParam::GrantType, "client_credentials")
            .set_opt(ClientCredentialsParam::Scope, self.scope.as_deref());

        create_token_request(
            self.kind(),
            &self.endpoint,
            params,
            self.credentials.as_ref(),
        )
    }

    fn parse_response(
        &self,
        response: &HttpResponse,
    ) -> Result<Outcome<Self::Success, Self::Error>, Error> {
        parse_token_response(response)
    }
}

/// Refresh of an access token (RFC 6749 §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRequest {
    pub endpoint: String,
    pub refresh_token: String,
    /// Must not include scopes beyond the original grant.
    pub scope: Option<String>,
    pub credentials: Option<Credentials>,
}

impl RefreshTokenRequest {
    pub fn new(endpoint: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            refresh_token: refresh_token.into(),
            scope: None,
            credentials: None,
        }
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scope = join_scopes(scopes);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

impl GrantRequest for RefreshTokenRequest {
    type Success = AccessTokenResponse;
    type Error = AccessTokenErrorResponse;

    fn kind(&self) -> GrantKind {
        GrantKind::RefreshToken
    }

    fn to_http_request(&self) -> Result<HttpRequest, Error> {
        let mut params = ParameterSet::new();
        params
            .set(RefreshTokenParam::GrantType, "refresh_token")
            .set(RefreshTokenParam::RefreshToken, &self.refresh_token)
            .set_opt(RefreshTokenParam::Scope, self.scope.as_deref());

        create_token_request(
            self.kind(),
            &self.endpoint,
            params,
            self.credentials.as_ref(),
        )
    }

    fn parse_response(
        &self,
        response: &HttpResponse,
    ) -> Result<Outcome<Self::Success, Self::Error>, Error> {
        parse_token_response(response)
    }
}

/// Parse and check an endpoint URL. Endpoints must be absolute, hierarchical
/// and carry no fragment (RFC 6749 §3.1, §3.2).
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url, Error> {
    let url = Url::parse(endpoint).map_err(|e| Error::invalid_endpoint(endpoint, e))?;

    if url.cannot_be_a_base() {
        return Err(Error::invalid_endpoint(endpoint, "not a hierarchical URL"));
    }
    if url.fragment().is_some() {
        return Err(Error::invalid_endpoint(endpoint, "endpoint must not have a fragment"));
    }

    Ok(url)
}

/// Build a `GET` to the authorization endpoint. Query parameters already on
/// the endpoint are kept, read leniently: a bare key such as `?prompt` is
/// re-sent as `prompt=`. Grant parameters of the same name replace them.
fn create_authorization_request(
    kind: GrantKind,
    endpoint: &str,
    fill: impl FnOnce(&mut ParameterSet<AuthorizationParam>),
) -> Result<HttpRequest, Error> {
    let mut url = parse_endpoint(endpoint)?;
    let existing: FormUrlEncoded = url.query_pairs().collect();

    let mut params = ParameterSet::from_form(existing);
    fill(&mut params);
    url.set_query(Some(&params.into_form().to_encoded_string()));

    tracing::debug!(grant = %kind, endpoint, "built authorization request");

    Ok(HttpRequest {
        method: HttpMethod::Get,
        url,
        headers: Vec::new(),
        body: None,
    })
}

/// Build a form-encoded `POST` to the token endpoint, adding client
/// credentials to the body or the `Authorization` header.
fn create_token_request<P: ClientAuthParameter>(
    kind: GrantKind,
    endpoint: &str,
    mut params: ParameterSet<P>,
    credentials: Option<&Credentials>,
) -> Result<HttpRequest, Error> {
    let url = parse_endpoint(endpoint)?;

    let mut headers = vec![
        ("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()),
        ("Accept".to_string(), "application/json".to_string()),
    ];

    if let Some(credentials) = credentials {
        match credentials.auth_method {
            ClientAuthMethod::RequestBody => {
                params
                    .set(P::CLIENT_ID, &credentials.client_id)
                    .set_opt(P::CLIENT_SECRET, credentials.client_secret.as_deref());
            }
            ClientAuthMethod::Basic => headers.push((
                "Authorization".to_string(),
                encode_basic_credentials(
                    &credentials.client_id,
                    credentials.client_secret.as_deref().unwrap_or_default(),
                ),
            )),
        }
    }

    tracing::debug!(
        grant = %kind,
        endpoint,
        client_auth = ?credentials.map(|c| c.auth_method),
        "built token request"
    );

    Ok(HttpRequest {
        method: HttpMethod::Post,
        url,
        headers,
        body: Some(params.into_form().encode()),
    })
}

/// `Basic <base64(client_id:client_secret)>`, with both parts
/// form-urlencoded first (RFC 6749 §2.3.1).
///
/// Parts are escaped with [`escape`], so a space becomes `%20` rather than
/// the `+` that HTML form encoding uses. Servers decode both.
pub fn encode_basic_credentials(client_id: &str, client_secret: &str) -> String {
    let credentials = format!("{}:{}", escape(client_id), escape(client_secret));
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
    format!("Basic {encoded}")
}

fn join_scopes(scopes: &[&str]) -> Option<String> {
    (!scopes.is_empty()).then(|| scopes.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_form(request: &HttpRequest) -> FormUrlEncoded {
        FormUrlEncoded::decode(request.body.as_deref().expect("token requests have a body"))
            .unwrap()
    }

    fn query_form(request: &HttpRequest) -> FormUrlEncoded {
        FormUrlEncoded::decode_str(request.url.query().unwrap_or("")).unwrap()
    }

    #[test]
    fn client_credentials_without_credentials_sends_only_grant_and_scope() {
        let request = ClientCredentialsRequest::new("https://server.example.com/token")
            .with_scopes(&["read"])
            .to_http_request()
            .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url.as_str(), "https://server.example.com/token");

        let expected: FormUrlEncoded = [("grant_type", "client_credentials"), ("scope", "read")]
            .into_iter()
            .collect();
        assert_eq!(body_form(&request), expected);
    }

    #[test]
    fn token_requests_set_form_headers() {
        let request = ClientCredentialsRequest::new("https://server.example.com/token")
            .to_http_request()
            .unwrap();

        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn client_credentials_in_body() {
        let request = ClientCredentialsRequest::new("https://server.example.com/token")
            .with_credentials(Credentials::new("s6BhdRkqt3", "7Fjfp0ZBr1KtDRbnfVdmIw"))
            .to_http_request()
            .unwrap();

        let form = body_form(&request);
        assert_eq!(form.get("client_id"), Some("s6BhdRkqt3"));
        assert_eq!(form.get("client_secret"), Some("7Fjfp0ZBr1KtDRbnfVdmIw"));
        assert!(!form.contains_key("scope"));
    }

    #[test]
    fn public_client_sends_id_without_secret() {
        let request = ClientCredentialsRequest::new("https://server.example.com/token")
            .with_credentials(Credentials::public("s6BhdRkqt3"))
            .to_http_request()
            .unwrap();

        let form = body_form(&request);
        assert_eq!(form.get("client_id"), Some("s6BhdRkqt3"));
        assert!(!form.contains_key("client_secret"));
    }

    #[test]
    fn basic_auth_moves_credentials_to_header() {
        let request = ClientCredentialsRequest::new("https://server.example.com/token")
            .with_credentials(
                Credentials::new("s6BhdRkqt3", "gX1fBat3bV")
                    .with_auth_method(ClientAuthMethod::Basic),
            )
            .to_http_request()
            .unwrap();

        assert_eq!(
            request.header("Authorization"),
            Some("Basic czZCaGRSa3F0MzpnWDFmQmF0M2JW")
        );
        let form = body_form(&request);
        assert!(!form.contains_key("client_id"));
        assert!(!form.contains_key("client_secret"));
    }

    #[test]
    fn basic_credentials_are_form_encoded_before_base64() {
        let header = encode_basic_credentials("client:id", "secret&value");
        let expected = base64::engine::general_purpose::STANDARD.encode("client%3Aid:secret%26value");
        assert_eq!(header, format!("Basic {expected}"));
    }

    #[test]
    fn basic_credentials_escape_space_as_percent_20() {
        let header = encode_basic_credentials("my client", "a+b");
        let expected = base64::engine::general_purpose::STANDARD.encode("my%20client:a%2Bb");
        assert_eq!(header, format!("Basic {expected}"));
    }

    #[test]
    fn password_request_body() {
        let request = ResourceOwnerPasswordCredentialsRequest::new(
            "https://server.example.com/token",
            "johndoe",
            "A3ddj3w",
        )
        .to_http_request()
        .unwrap();

        let expected: FormUrlEncoded = [
            ("grant_type", "password"),
            ("username", "johndoe"),
            ("password", "A3ddj3w"),
        ]
        .into_iter()
        .collect();
        assert_eq!(body_form(&request), expected);
    }

    #[test]
    fn password_request_debug_hides_password() {
        let request = ResourceOwnerPasswordCredentialsRequest::new(
            "https://server.example.com/token",
            "johndoe",
            "A3ddj3w",
        )
        .with_credentials(Credentials::new("id", "very-secret"));

        let debug = format!("{request:?}");
        assert!(!debug.contains("A3ddj3w"));
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("johndoe"));
    }

    #[test]
    fn authorization_code_exchange_is_a_post_with_correct_keys() {
        let request = AuthorizationCodeAccessTokenRequest::new(
            "https://server.example.com/token",
            "SplxlOBeZQQYbYS6WxSbIA",
        )
        .with_redirect_uri("https://client.example.com/cb")
        .with_credentials(Credentials::public("s6BhdRkqt3"))
        .to_http_request()
        .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url.query(), None);

        let form = body_form(&request);
        assert_eq!(form.get("grant_type"), Some("authorization_code"));
        assert_eq!(form.get("code"), Some("SplxlOBeZQQYbYS6WxSbIA"));
        assert_eq!(form.get("redirect_uri"), Some("https://client.example.com/cb"));
        assert_eq!(form.get("client_id"), Some("s6BhdRkqt3"));
        assert!(!form.contains_key("code_verifier"));
    }

    #[test]
    fn authorization_code_exchange_with_code_verifier() {
        let request = AuthorizationCodeAccessTokenRequest::new("https://server.example.com/token", "c")
            .with_code_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk")
            .to_http_request()
            .unwrap();

        assert_eq!(
            body_form(&request).get("code_verifier"),
            Some("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk")
        );
    }

    #[test]
    fn refresh_request_body() {
        let request = RefreshTokenRequest::new("https://server.example.com/token", "tGzv3JOkF0XG5Qx2TlKWIA")
            .with_scopes(&["read", "write"])
            .to_http_request()
            .unwrap();

        let form = body_form(&request);
        assert_eq!(form.get("grant_type"), Some("refresh_token"));
        assert_eq!(form.get("refresh_token"), Some("tGzv3JOkF0XG5Qx2TlKWIA"));
        assert_eq!(form.get("scope"), Some("read write"));
    }

    #[test]
    fn authorization_code_redirect_url() {
        let request = AuthorizationCodeRequest::new("https://server.example.com/authorize", "s6BhdRkqt3")
            .with_redirect_uri("https://client.example.com/cb")
            .with_state("xyz")
            .to_http_request()
            .unwrap();

        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
        assert_eq!(request.url.path(), "/authorize");

        let expected: FormUrlEncoded = [
            ("response_type", "code"),
            ("client_id", "s6BhdRkqt3"),
            ("redirect_uri", "https://client.example.com/cb"),
            ("state", "xyz"),
        ]
        .into_iter()
        .collect();
        assert_eq!(query_form(&request), expected);
    }

    #[test]
    fn authorization_code_redirect_escapes_scope_space() {
        let request = AuthorizationCodeRequest::new("https://server.example.com/authorize", "id")
            .with_scopes(&["openid", "email"])
            .to_http_request()
            .unwrap();

        assert!(request.url.query().unwrap().contains("scope=openid%20email"));
        assert_eq!(query_form(&request).get("scope"), Some("openid email"));
    }

    #[test]
    fn authorization_code_redirect_with_pkce() {
        let request = AuthorizationCodeRequest::new("https://server.example.com/authorize", "id")
            .with_pkce(
                "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk",
                CodeChallengeMethod::S256,
            )
            .to_http_request()
            .unwrap();

        let form = query_form(&request);
        assert_eq!(
            form.get("code_challenge"),
            Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM")
        );
        assert_eq!(form.get("code_challenge_method"), Some("S256"));
    }

    #[test]
    fn authorization_redirect_omits_absent_optionals() {
        let request = AuthorizationCodeRequest::new("https://server.example.com/authorize", "id")
            .to_http_request()
            .unwrap();

        let form = query_form(&request);
        assert_eq!(form.len(), 2);
        assert!(!form.contains_key("scope"));
        assert!(!form.contains_key("state"));
        assert!(!form.contains_key("redirect_uri"));
    }

    #[test]
    fn implicit_redirect_url() {
        let request = ImplicitRequest::new("https://server.example.com/authorize", "s6BhdRkqt3")
            .with_state("xyz")
            .to_http_request()
            .unwrap();

        let form = query_form(&request);
        assert_eq!(form.get("response_type"), Some("token"));
        assert_eq!(form.get("client_id"), Some("s6BhdRkqt3"));
        assert_eq!(form.get("state"), Some("xyz"));
    }

    #[test]
    fn authorization_endpoint_query_is_kept() {
        let request = ImplicitRequest::new("https://server.example.com/authorize?tenant=acme", "id")
            .to_http_request()
            .unwrap();

        let form = query_form(&request);
        assert_eq!(form.get("tenant"), Some("acme"));
        assert_eq!(form.get("response_type"), Some("token"));
    }

    #[test]
    fn invalid_endpoints_are_configuration_errors() {
        for endpoint in [
            "not a url",
            "/token",
            "mailto:admin@example.com",
            "https://server.example.com/token#frag",
        ] {
            let err = ClientCredentialsRequest::new(endpoint)
                .to_http_request()
                .unwrap_err();
            assert!(
                matches!(err, Error::InvalidEndpoint { .. }),
                "{endpoint}: expected InvalidEndpoint, got {err:?}"
            );
            assert!(!err.is_rejection());
        }
    }

    #[test]
    fn authorization_endpoint_with_loose_query_is_kept() {
        let request = AuthorizationCodeRequest::new(
            "https://server.example.com/authorize?prompt&hint=a=b&client_id=stale",
            "id",
        )
        .to_http_request()
        .unwrap();

        let form = query_form(&request);
        assert_eq!(form.get("prompt"), Some(""));
        assert_eq!(form.get("hint"), Some("a=b"));
        assert_eq!(form.get("client_id"), Some("id"));
        assert_eq!(form.get("response_type"), Some("code"));
    }

    #[test]
    fn empty_scope_list_sends_no_scope() {
        let request = ClientCredentialsRequest::new("https://server.example.com/token")
            .with_scopes(&[]);
        assert_eq!(request.scope, None);
    }
}
