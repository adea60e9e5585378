use crate::Error;
use crate::http::{HttpRequest, HttpResponse};
use crate::request::{
    AuthorizationCodeAccessTokenRequest, AuthorizationCodeRequest, ClientCredentialsRequest,
    GrantKind, GrantRequest, ImplicitRequest, RefreshTokenRequest,
    ResourceOwnerPasswordCredentialsRequest,
};
use crate::response::{
    AccessTokenErrorResponse, AccessTokenResponse, AuthorizationErrorResponse,
    AuthorizationResponse, ImplicitAccessTokenResponse, Outcome,
};

/// Any grant request, for call sites that handle every grant type alike.
/// When the grant is known statically, use the concrete request type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    AuthorizationCode(AuthorizationCodeRequest),
    Implicit(ImplicitRequest),
    AuthorizationCodeAccessToken(AuthorizationCodeAccessTokenRequest),
    ResourceOwnerPasswordCredentials(ResourceOwnerPasswordCredentialsRequest),
    ClientCredentials(ClientCredentialsRequest),
    RefreshToken(RefreshTokenRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GrantResponse {
    Authorization(AuthorizationResponse),
    ImplicitAccessToken(ImplicitAccessTokenResponse),
    AccessToken(AccessTokenResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantErrorResponse {
    Authorization(AuthorizationErrorResponse),
    AccessToken(AccessTokenErrorResponse),
}

impl GrantRequest for Grant {
    type Success = GrantResponse;
    type Error = GrantErrorResponse;

    fn kind(&self) -> GrantKind {
        match self {
            Grant::AuthorizationCode(r) => r.kind(),
            Grant::Implicit(r) => r.kind(),
            Grant::AuthorizationCodeAccessToken(r) => r.kind(),
            Grant::ResourceOwnerPasswordCredentials(r) => r.kind(),
            Grant::ClientCredentials(r) => r.kind(),
            Grant::RefreshToken(r) => r.kind(),
        }
    }

    fn to_http_request(&self) -> Result<HttpRequest, Error> {
        match self {
            Grant::AuthorizationCode(r) => r.to_http_request(),
            Grant::Implicit(r) => r.to_http_request(),
            Grant::AuthorizationCodeAccessToken(r) => r.to_http_request(),
            Grant::ResourceOwnerPasswordCredentials(r) => r.to_http_request(),
            Grant::ClientCredentials(r) => r.to_http_request(),
            Grant::RefreshToken(r) => r.to_http_request(),
        }
    }

    fn parse_response(
        &self,
        response: &HttpResponse,
    ) -> Result<Outcome<GrantResponse, GrantErrorResponse>, Error> {
        let outcome = match self {
            Grant::AuthorizationCode(r) => r
                .parse_response(response)?
                .map(GrantResponse::Authorization)
                .map_err(GrantErrorResponse::Authorization),
            Grant::Implicit(r) => r
                .parse_response(response)?
                .map(GrantResponse::ImplicitAccessToken)
                .map_err(GrantErrorResponse::Authorization),
            Grant::AuthorizationCodeAccessToken(r) => token_outcome(r.parse_response(response)?),
            Grant::ResourceOwnerPasswordCredentials(r) => {
                token_outcome(r.parse_response(response)?)
            }
            Grant::ClientCredentials(r) => token_outcome(r.parse_response(response)?),
            Grant::RefreshToken(r) => token_outcome(r.parse_response(response)?),
        };
        Ok(outcome)
    }
}

fn token_outcome(
    outcome: Outcome<AccessTokenResponse, AccessTokenErrorResponse>,
) -> Outcome<GrantResponse, GrantErrorResponse> {
    outcome
        .map(GrantResponse::AccessToken)
        .map_err(GrantErrorResponse::AccessToken)
}

macro_rules! impl_from_request {
    ($($variant:ident($request:ty)),+ $(,)?) => {
        $(
            impl From<$request> for Grant {
                fn from(request: $request) -> Self {
                    Grant::$variant(request)
                }
            }
        )+
    };
}

impl_from_request!(
    AuthorizationCode(AuthorizationCodeRequest),
    Implicit(ImplicitRequest),
    AuthorizationCodeAccessToken(AuthorizationCodeAccessTokenRequest),
    ResourceOwnerPasswordCredentials(ResourceOwnerPasswordCredentialsRequest),
    ClientCredentials(ClientCredentialsRequest),
    RefreshToken(RefreshTokenRequest),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_code::{AccessTokenErrorCode, AuthorizationErrorCode};
    use crate::http::HttpMethod;
    use crate::response::{AccessTokenResponseLike, ErrorResponseLike};
    use serde_json::json;

    #[test]
    fn dispatches_building_by_variant() {
        let grants: Vec<Grant> = vec![
            AuthorizationCodeRequest::new("https://as.example.com/authorize", "id").into(),
            ImplicitRequest::new("https://as.example.com/authorize", "id").into(),
            AuthorizationCodeAccessTokenRequest::new("https://as.example.com/token", "c").into(),
            ResourceOwnerPasswordCredentialsRequest::new("https://as.example.com/token", "u", "p")
                .into(),
            ClientCredentialsRequest::new("https://as.example.com/token").into(),
            RefreshTokenRequest::new("https://as.example.com/token", "r").into(),
        ];

        let methods: Vec<HttpMethod> = grants
            .iter()
            .map(|g| g.to_http_request().unwrap().method)
            .collect();
        assert_eq!(
            methods,
            vec![
                HttpMethod::Get,
                HttpMethod::Get,
                HttpMethod::Post,
                HttpMethod::Post,
                HttpMethod::Post,
                HttpMethod::Post,
            ]
        );
        assert_eq!(grants[4].kind(), GrantKind::ClientCredentials);
    }

    #[test]
    fn token_grant_parses_into_access_token_variant() {
        let grant: Grant = ClientCredentialsRequest::new("https://as.example.com/token").into();
        let response = HttpResponse::new(
            200,
            serde_json::to_vec(&json!({"access_token": "abc", "token_type": "bearer"})).unwrap(),
        );

        match grant.parse_response(&response).unwrap() {
            Outcome::Success(GrantResponse::AccessToken(tokens)) => {
                assert_eq!(tokens.access_token(), "abc")
            }
            other => panic!("Expected access token, got: {other:?}"),
        }
    }

    #[test]
    fn token_grant_error_variant() {
        let grant: Grant = RefreshTokenRequest::new("https://as.example.com/token", "r").into();
        let response = HttpResponse::new(
            400,
            serde_json::to_vec(&json!({"error": "invalid_grant"})).unwrap(),
        );

        match grant.parse_response(&response).unwrap() {
            Outcome::Error(GrantErrorResponse::AccessToken(err)) => {
                assert_eq!(err.code(), AccessTokenErrorCode::InvalidGrant)
            }
            other => panic!("Expected token error, got: {other:?}"),
        }
    }

    #[test]
    fn redirect_grant_error_variant() {
        let grant: Grant = AuthorizationCodeRequest::new("https://as.example.com/authorize", "id").into();
        let response = HttpResponse::new(302, Vec::new())
            .with_header("Location", "https://client.example.com/cb?error=access_denied");

        match grant.parse_response(&response).unwrap() {
            Outcome::Error(GrantErrorResponse::Authorization(err)) => {
                assert_eq!(err.code(), AuthorizationErrorCode::AccessDenied)
            }
            other => panic!("Expected authorization error, got: {other:?}"),
        }
    }

    #[test]
    fn rejection_passes_through() {
        let grant: Grant = ImplicitRequest::new("https://as.example.com/authorize", "id").into();
        let response = HttpResponse::new(200, "ok");
        assert!(grant.parse_response(&response).unwrap_err().is_rejection());
    }
}
