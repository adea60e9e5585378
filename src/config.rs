use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::request::{ClientAuthMethod, parse_endpoint};

/// Static settings of one OAuth2 client registration.
///
/// Deserializes from any serde format; absent optional keys take their
/// defaults:
///
/// ```json
/// {
///   "client_id": "s6BhdRkqt3",
///   "client_secret": "7Fjfp0ZBr1KtDRbnfVdmIw",
///   "auth_method": "basic",
///   "authorization_endpoint": "https://server.example.com/authorize",
///   "token_endpoint": "https://server.example.com/token",
///   "redirect_uri": "https://client.example.com/cb",
///   "scopes": ["read", "write"]
/// }
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub auth_method: ClientAuthMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            auth_method: ClientAuthMethod::default(),
            authorization_endpoint: None,
            token_endpoint: None,
            redirect_uri: None,
            scopes: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig {
            reason: e.to_string(),
        })
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_auth_method(mut self, auth_method: ClientAuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    pub fn with_authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorization_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Check every URL up front so that request building cannot fail later
    /// on a bad endpoint.
    pub fn validate(&self) -> Result<(), Error> {
        if self.client_id.is_empty() {
            return Err(Error::InvalidConfig {
                reason: "client_id must not be empty".to_string(),
            });
        }
        if self.auth_method == ClientAuthMethod::Basic && self.client_secret.is_none() {
            return Err(Error::InvalidConfig {
                reason: "basic client authentication requires a client_secret".to_string(),
            });
        }
        if let Some(scope) = self.scopes.iter().find(|s| s.is_empty() || s.contains(' ')) {
            return Err(Error::InvalidConfig {
                reason: format!("invalid scope token {scope:?}"),
            });
        }

        for endpoint in [
            &self.authorization_endpoint,
            &self.token_endpoint,
            &self.redirect_uri,
        ]
        .into_iter()
        .flatten()
        {
            parse_endpoint(endpoint)?;
        }

        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("auth_method", &self.auth_method)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config = ClientConfig::from_json(r#"{"client_id": "abc"}"#).unwrap();
        assert_eq!(config, ClientConfig::new("abc"));
        assert_eq!(config.auth_method, ClientAuthMethod::RequestBody);
        assert!(config.scopes.is_empty());
    }

    #[test]
    fn deserializes_full_config() {
        let config = ClientConfig::from_json(
            r#"{
                "client_id": "s6BhdRkqt3",
                "client_secret": "7Fjfp0ZBr1KtDRbnfVdmIw",
                "auth_method": "basic",
                "authorization_endpoint": "https://server.example.com/authorize",
                "token_endpoint": "https://server.example.com/token",
                "redirect_uri": "https://client.example.com/cb",
                "scopes": ["read", "write"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.auth_method, ClientAuthMethod::Basic);
        assert_eq!(config.scopes, vec!["read", "write"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_auth_method_is_a_config_error() {
        let err = ClientConfig::from_json(r#"{"client_id": "a", "auth_method": "jwt"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        let err = ClientConfig::new("abc")
            .with_token_endpoint("server.example.com/token")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
    }

    #[test]
    fn validate_rejects_basic_without_secret() {
        let err = ClientConfig::new("abc")
            .with_auth_method(ClientAuthMethod::Basic)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn validate_rejects_empty_client_id_and_bad_scopes() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(
            ClientConfig::new("abc")
                .with_scopes(&["read write"])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let config = ClientConfig::new("abc").with_client_secret("hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
