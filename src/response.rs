use std::time::{Duration, SystemTime};

use serde_json::Value;
use url::Url;

use crate::Error;
use crate::error_code::{AccessTokenErrorCode, AuthorizationErrorCode, ErrorCode};
use crate::form::FormUrlEncoded;
use crate::http::HttpResponse;

/// A response that matched one of the two shapes a grant defines.
///
/// A response matching neither is reported through [`Error`] instead; an
/// OAuth2 error sent by the server is an ordinary `Outcome::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    Success(T),
    Error(E),
}

impl<T, E> Outcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(self) -> Option<E> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Error(err) => Some(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U, E> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Error(err) => Outcome::Error(err),
        }
    }

    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> Outcome<T, F> {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            Outcome::Error(err) => Outcome::Error(f(err)),
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Error(err) => Err(err),
        }
    }
}

/// Anything that carries an access token.
pub trait AccessTokenResponseLike {
    fn access_token(&self) -> &str;

    fn token_type(&self) -> &str;

    /// Lifetime of the access token in seconds, when the server sent one.
    fn expires_in(&self) -> Option<u64>;

    fn scope(&self) -> Option<&str>;

    /// The granted scope split on spaces (RFC 6749 §3.3).
    fn scopes(&self) -> Vec<&str> {
        self.scope()
            .map(|s| s.split(' ').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// When the token expires, counting from the moment the response arrived.
    /// `None` when no lifetime was sent or it overflows the clock.
    fn expires_at(&self, received_at: SystemTime) -> Option<SystemTime> {
        self.expires_in()
            .and_then(|secs| received_at.checked_add(Duration::from_secs(secs)))
    }
}

/// Access token responses that may carry a refresh token.
pub trait RefreshableAccessTokenResponse: AccessTokenResponseLike {
    fn refresh_token(&self) -> Option<&str>;
}

pub trait ErrorResponseLike {
    type Code: ErrorCode;

    fn code(&self) -> Self::Code;

    fn error_description(&self) -> Option<&str>;

    fn error_uri(&self) -> Option<&str>;
}

/// Successful token endpoint response (RFC 6749 §5.1).
#[derive(Debug, Clone, PartialEq)]
pub struct AccessTokenResponse {
    access_token: String,
    token_type: String,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    scope: Option<String>,
    data: Value,
}

impl AccessTokenResponse {
    pub fn from_json(data: Value) -> Result<Self, Error> {
        if !data.is_object() {
            return Err(Error::MissingField {
                field: "access_token",
            });
        }

        Ok(Self {
            access_token: required_str(&data, "access_token")?,
            token_type: required_str(&data, "token_type")?,
            expires_in: optional_seconds(&data),
            refresh_token: optional_str(&data, "refresh_token"),
            scope: optional_str(&data, "scope"),
            data,
        })
    }

    /// The full JSON object, including extension fields such as `id_token`.
    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl AccessTokenResponseLike for AccessTokenResponse {
    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn token_type(&self) -> &str {
        &self.token_type
    }

    fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl RefreshableAccessTokenResponse for AccessTokenResponse {
    fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

/// Access token delivered in the redirect fragment of the implicit grant
/// (RFC 6749 §4.2.2). Never carries a refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitAccessTokenResponse {
    access_token: String,
    token_type: String,
    expires_in: Option<u64>,
    scope: Option<String>,
    state: Option<String>,
}

impl ImplicitAccessTokenResponse {
    pub fn from_params(params: &FormUrlEncoded) -> Result<Self, Error> {
        let expires_in = params
            .get("expires_in")
            .and_then(|v| match v.parse::<u64>() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    tracing::warn!(value = v, "ignoring unparseable expires_in");
                    None
                }
            });

        Ok(Self {
            access_token: required_param(params, "access_token")?,
            token_type: required_param(params, "token_type")?,
            expires_in,
            scope: params.get("scope").map(String::from),
            state: params.get("state").map(String::from),
        })
    }

    /// Decode the fragment of the URL the browser was redirected to.
    /// No status code is involved, so only the parameters are checked.
    pub fn from_redirect_url(
        url: &Url,
    ) -> Result<Outcome<Self, AuthorizationErrorResponse>, Error> {
        let params = FormUrlEncoded::decode_str(url.fragment().unwrap_or(""))?;
        discriminate_redirect(&params, None, "access_token", Self::from_params)
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn verify_state(&self, expected: Option<&str>) -> Result<(), Error> {
        verify_state(self.state(), expected)
    }
}

impl AccessTokenResponseLike for ImplicitAccessTokenResponse {
    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn token_type(&self) -> &str {
        &self.token_type
    }

    fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

/// Authorization code delivered in the redirect query (RFC 6749 §4.1.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    code: String,
    state: Option<String>,
}

impl AuthorizationResponse {
    pub fn from_params(params: &FormUrlEncoded) -> Result<Self, Error> {
        Ok(Self {
            code: required_param(params, "code")?,
            state: params.get("state").map(String::from),
        })
    }

    /// Decode the query of the URL the browser was redirected to.
    /// No status code is involved, so only the parameters are checked.
    pub fn from_redirect_url(
        url: &Url,
    ) -> Result<Outcome<Self, AuthorizationErrorResponse>, Error> {
        let params = FormUrlEncoded::decode_str(url.query().unwrap_or(""))?;
        discriminate_redirect(&params, None, "code", Self::from_params)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Check the echoed `state` against the value sent in the request.
    /// When a state was sent, the response must echo it exactly.
    pub fn verify_state(&self, expected: Option<&str>) -> Result<(), Error> {
        verify_state(self.state(), expected)
    }
}

/// OAuth2 error reported by the server, with a code from a closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse<C> {
    code: C,
    error_description: Option<String>,
    error_uri: Option<String>,
    state: Option<String>,
}

/// Error redirect from the authorization endpoint.
pub type AuthorizationErrorResponse = ErrorResponse<AuthorizationErrorCode>;

/// Error body from the token endpoint.
pub type AccessTokenErrorResponse = ErrorResponse<AccessTokenErrorCode>;

impl<C: ErrorCode> ErrorResponse<C> {
    pub fn from_json(data: &Value) -> Result<Self, Error> {
        Ok(Self {
            code: parse_code(&required_str(data, "error")?)?,
            error_description: optional_str(data, "error_description"),
            error_uri: optional_str(data, "error_uri"),
            state: optional_str(data, "state"),
        })
    }

    pub fn from_params(params: &FormUrlEncoded) -> Result<Self, Error> {
        Ok(Self {
            code: parse_code(&required_param(params, "error")?)?,
            error_description: params.get("error_description").map(String::from),
            error_uri: params.get("error_uri").map(String::from),
            state: params.get("state").map(String::from),
        })
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }
}

impl<C: ErrorCode> ErrorResponseLike for ErrorResponse<C> {
    type Code = C;

    fn code(&self) -> C {
        self.code
    }

    fn error_description(&self) -> Option<&str> {
        self.error_description.as_deref()
    }

    fn error_uri(&self) -> Option<&str> {
        self.error_uri.as_deref()
    }
}

/// Decode a token endpoint response.
/// - 200 with `access_token` and `token_type` -> `Outcome::Success`
/// - 400/401 with a known `error` code -> `Outcome::Error`
/// - anything else -> `Err`
pub fn parse_token_response(
    response: &HttpResponse,
) -> Result<Outcome<AccessTokenResponse, AccessTokenErrorResponse>, Error> {
    let status = response.status;
    if !matches!(status, 200 | 400 | 401) {
        tracing::debug!(status, "token response has unexpected status");
        return Err(Error::UnexpectedResponse { status });
    }

    let json = json_object(response)?;
    let outcome = if status == 200 {
        AccessTokenResponse::from_json(json).map(Outcome::Success)
    } else {
        AccessTokenErrorResponse::from_json(&json).map(Outcome::Error)
    };

    match &outcome {
        Ok(Outcome::Success(_)) => tracing::debug!(status, "token response accepted"),
        Ok(Outcome::Error(err)) => {
            tracing::debug!(status, code = %err.code(), "token endpoint returned an OAuth2 error")
        }
        Err(err) => tracing::debug!(status, %err, "token response rejected"),
    }
    outcome
}

/// Decode the redirect that ends the authorization code grant's browser step.
/// Success needs a `302 Found` carrying `code`; an error may arrive with any
/// redirect status.
pub fn parse_authorization_response(
    response: &HttpResponse,
) -> Result<Outcome<AuthorizationResponse, AuthorizationErrorResponse>, Error> {
    let url = redirect_url(response)?;
    let params = FormUrlEncoded::decode_str(url.query().unwrap_or(""))?;
    discriminate_redirect(
        &params,
        Some(response.status),
        "code",
        AuthorizationResponse::from_params,
    )
}

/// Decode the redirect that ends the implicit grant. Parameters are read from
/// the URL fragment.
pub fn parse_implicit_response(
    response: &HttpResponse,
) -> Result<Outcome<ImplicitAccessTokenResponse, AuthorizationErrorResponse>, Error> {
    let url = redirect_url(response)?;
    let params = FormUrlEncoded::decode_str(url.fragment().unwrap_or(""))?;
    discriminate_redirect(
        &params,
        Some(response.status),
        "access_token",
        ImplicitAccessTokenResponse::from_params,
    )
}

fn redirect_url(response: &HttpResponse) -> Result<Url, Error> {
    let status = response.status;
    if !(300..400).contains(&status) {
        tracing::debug!(status, "authorization response is not a redirect");
        return Err(Error::UnexpectedResponse { status });
    }

    if let Some(url) = &response.final_url {
        return Ok(url.clone());
    }

    let location = response
        .header("Location")
        .ok_or(Error::MissingRedirect { status })?;
    Url::parse(location).map_err(|e| {
        tracing::debug!(status, location, error = %e, "Location header is not an absolute URL");
        Error::MissingRedirect { status }
    })
}

/// `status` is `None` when the caller holds the redirect URL itself.
fn discriminate_redirect<T>(
    params: &FormUrlEncoded,
    status: Option<u16>,
    required: &'static str,
    success: impl FnOnce(&FormUrlEncoded) -> Result<T, Error>,
) -> Result<Outcome<T, AuthorizationErrorResponse>, Error> {
    let success_status = status.is_none_or(|s| s == 302);

    if success_status && params.contains_key(required) {
        return success(params).map(Outcome::Success);
    }

    if params.contains_key("error") {
        let err = AuthorizationErrorResponse::from_params(params)?;
        tracing::debug!(
            code = %err.code(),
            "authorization endpoint returned an OAuth2 error"
        );
        return Ok(Outcome::Error(err));
    }

    match status {
        Some(status) if !success_status => Err(Error::UnexpectedResponse { status }),
        _ => Err(Error::MissingField { field: required }),
    }
}

fn json_object(response: &HttpResponse) -> Result<Value, Error> {
    let unexpected_body = || Error::UnexpectedBody {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    };

    let text = std::str::from_utf8(&response.body).map_err(|_| unexpected_body())?;
    match serde_json::from_str::<Value>(text) {
        Ok(json) if json.is_object() => Ok(json),
        _ => Err(unexpected_body()),
    }
}

fn parse_code<C: ErrorCode>(code: &str) -> Result<C, Error> {
    C::from_wire(code).ok_or_else(|| Error::UnknownErrorCode {
        code: code.to_string(),
    })
}

fn required_str(data: &Value, field: &'static str) -> Result<String, Error> {
    data.get(field)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(Error::MissingField { field })
}

/// Optional fields never decide the outcome; a value of the wrong type is
/// dropped.
fn optional_str(data: &Value, field: &'static str) -> Option<String> {
    match data.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => {
            tracing::warn!(field, value = %other, "ignoring optional field of unexpected type");
            None
        }
    }
}

/// `expires_in` as an integer, or as a decimal string as some servers send it.
fn optional_seconds(data: &Value) -> Option<u64> {
    let value = data.get("expires_in")?;
    let secs = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_u64(),
    };
    if secs.is_none() {
        tracing::warn!(value = %value, "ignoring unparseable expires_in");
    }
    secs
}

fn required_param(params: &FormUrlEncoded, field: &'static str) -> Result<String, Error> {
    params
        .get(field)
        .map(String::from)
        .ok_or(Error::MissingField { field })
}

fn verify_state(actual: Option<&str>, expected: Option<&str>) -> Result<(), Error> {
    match expected {
        Some(expected) if actual != Some(expected) => Err(Error::StateMismatch),
        _ => Ok(()),
    }
}
