use crate::config::ClientConfig;
use crate::error::Error;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::pkce::CodeChallengeMethod;
use crate::request::{
    AuthorizationCodeAccessTokenRequest, AuthorizationCodeRequest, ClientCredentialsRequest,
    Credentials, GrantRequest, ImplicitRequest, RefreshTokenRequest,
    ResourceOwnerPasswordCredentialsRequest,
};
use crate::response::Outcome;

/// Builds grant requests pre-filled from a validated [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    config: ClientConfig,
}

impl OAuth2Client {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Browser redirect for the authorization code grant.
    pub fn authorization_code_request(&self, state: &str) -> Result<AuthorizationCodeRequest, Error> {
        let mut request =
            AuthorizationCodeRequest::new(self.authorization_endpoint()?, &self.config.client_id)
                .with_state(state);
        request.redirect_uri = self.config.redirect_uri.clone();
        request.scope = self.scope();
        Ok(request)
    }

    /// Browser redirect for the authorization code grant with a PKCE challenge
    /// derived from `code_verifier`. Keep the verifier for the code exchange.
    pub fn authorization_code_request_with_pkce(
        &self,
        state: &str,
        code_verifier: &str,
        method: CodeChallengeMethod,
    ) -> Result<AuthorizationCodeRequest, Error> {
        Ok(self
            .authorization_code_request(state)?
            .with_pkce(code_verifier, method))
    }

    /// Browser redirect for the implicit grant.
    pub fn implicit_request(&self, state: &str) -> Result<ImplicitRequest, Error> {
        let mut request =
            ImplicitRequest::new(self.authorization_endpoint()?, &self.config.client_id)
                .with_state(state);
        request.redirect_uri = self.config.redirect_uri.clone();
        request.scope = self.scope();
        Ok(request)
    }

    /// Exchange an authorization code. The configured `redirect_uri` is
    /// repeated, as RFC 6749 §4.1.3 requires when it was sent before.
    pub fn authorization_code_token_request(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthorizationCodeAccessTokenRequest, Error> {
        let mut request = AuthorizationCodeAccessTokenRequest::new(self.token_endpoint()?, code)
            .with_credentials(self.credentials());
        request.redirect_uri = self.config.redirect_uri.clone();
        request.code_verifier = code_verifier.map(String::from);
        Ok(request)
    }

    pub fn password_request(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ResourceOwnerPasswordCredentialsRequest, Error> {
        let mut request =
            ResourceOwnerPasswordCredentialsRequest::new(self.token_endpoint()?, username, password)
                .with_credentials(self.credentials());
        request.scope = self.scope();
        Ok(request)
    }

    pub fn client_credentials_request(&self) -> Result<ClientCredentialsRequest, Error> {
        let mut request = ClientCredentialsRequest::new(self.token_endpoint()?)
            .with_credentials(self.credentials());
        request.scope = self.scope();
        Ok(request)
    }

    /// Refresh an access token. No `scope` is sent, so the server keeps the
    /// originally granted one.
    pub fn refresh_token_request(&self, refresh_token: &str) -> Result<RefreshTokenRequest, Error> {
        Ok(
            RefreshTokenRequest::new(self.token_endpoint()?, refresh_token)
                .with_credentials(self.credentials()),
        )
    }

    /// Send any grant request through `http_client` and decode the response.
    pub async fn send<G: GrantRequest>(
        &self,
        http_client: &(impl HttpClient + ?Sized),
        grant: &G,
    ) -> Result<Outcome<G::Success, G::Error>, Error> {
        send_grant_request(http_client, grant).await
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            auth_method: self.config.auth_method,
        }
    }

    fn scope(&self) -> Option<String> {
        (!self.config.scopes.is_empty()).then(|| self.config.scopes.join(" "))
    }

    fn authorization_endpoint(&self) -> Result<&str, Error> {
        self.config
            .authorization_endpoint
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig {
                reason: "authorization_endpoint is not configured".to_string(),
            })
    }

    fn token_endpoint(&self) -> Result<&str, Error> {
        self.config
            .token_endpoint
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig {
                reason: "token_endpoint is not configured".to_string(),
            })
    }
}

/// Encode `grant`, send it, and decode the response.
/// - transport failure -> `Err(Error::Http)`
/// - response of neither expected shape -> `Err` (see [`Error::is_rejection`])
/// - OAuth2 error from the server -> `Ok(Outcome::Error)`
pub async fn send_grant_request<G: GrantRequest>(
    http_client: &(impl HttpClient + ?Sized),
    grant: &G,
) -> Result<Outcome<G::Success, G::Error>, Error> {
    let request = grant.to_http_request()?;
    let kind = grant.kind();

    tracing::debug!(
        grant = %kind,
        method = %request.method,
        host = request.url.host_str().unwrap_or_default(),
        path = request.url.path(),
        "sending grant request"
    );

    let response = client_send(http_client, request).await?;
    tracing::debug!(grant = %kind, status = response.status, "received grant response");

    let outcome = grant.parse_response(&response);
    if let Err(err) = &outcome {
        tracing::warn!(grant = %kind, status = response.status, %err, "grant response rejected");
    }
    outcome
}

async fn client_send(
    http_client: &(impl HttpClient + ?Sized),
    request: HttpRequest,
) -> Result<HttpResponse, Error> {
    http_client.send(request).await.map_err(|e| {
        tracing::warn!(error = %e, "transport failed");
        Error::Http(e)
    })
}
