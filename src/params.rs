use std::marker::PhantomData;

use crate::form::FormUrlEncoded;

/// A closed set of outgoing parameter names for one request shape.
pub trait ParameterName: Copy {
    /// The parameter name as it appears on the wire.
    fn as_str(self) -> &'static str;
}

/// Parameter sets for token endpoint requests, which may carry client
/// credentials in the body (RFC 6749 §2.3.1).
pub trait ClientAuthParameter: ParameterName {
    const CLIENT_ID: Self;
    const CLIENT_SECRET: Self;
}

macro_rules! parameter_names {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl ParameterName for $name {
            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }
    };
}

macro_rules! client_auth_parameter {
    ($name:ident) => {
        impl ClientAuthParameter for $name {
            const CLIENT_ID: Self = Self::ClientId;
            const CLIENT_SECRET: Self = Self::ClientSecret;
        }
    };
}

parameter_names! {
    /// Query parameters of the authorization endpoint redirect
    /// (authorization code and implicit grants).
    AuthorizationParam {
        ResponseType => "response_type",
        ClientId => "client_id",
        RedirectUri => "redirect_uri",
        Scope => "scope",
        State => "state",
        CodeChallenge => "code_challenge",
        CodeChallengeMethod => "code_challenge_method",
    }
}

parameter_names! {
    /// Body parameters of the authorization code exchange (RFC 6749 §4.1.3).
    AuthorizationCodeTokenParam {
        GrantType => "grant_type",
        Code => "code",
        RedirectUri => "redirect_uri",
        CodeVerifier => "code_verifier",
        ClientId => "client_id",
        ClientSecret => "client_secret",
    }
}

parameter_names! {
    /// Body parameters of the resource owner password credentials grant (RFC 6749 §4.3.2).
    PasswordParam {
        GrantType => "grant_type",
        Username => "username",
        Password => "password",
        Scope => "scope",
        ClientId => "client_id",
        ClientSecret => "client_secret",
    }
}

parameter_names! {
    /// Body parameters of the client credentials grant (RFC 6749 §4.4.2).
    ClientCredentialsParam {
        GrantType => "grant_type",
        Scope => "scope",
        ClientId => "client_id",
        ClientSecret => "client_secret",
    }
}

parameter_names! {
    /// Body parameters of a refresh request (RFC 6749 §6).
    RefreshTokenParam {
        GrantType => "grant_type",
        RefreshToken => "refresh_token",
        Scope => "scope",
        ClientId => "client_id",
        ClientSecret => "client_secret",
    }
}

client_auth_parameter!(AuthorizationCodeTokenParam);
client_auth_parameter!(PasswordParam);
client_auth_parameter!(ClientCredentialsParam);
client_auth_parameter!(RefreshTokenParam);

/// Outgoing parameters keyed by one grant's parameter enumeration.
/// Absent optional values are left out entirely, never sent as `key=`.
#[derive(Debug, Clone)]
pub struct ParameterSet<P> {
    form: FormUrlEncoded,
    _names: PhantomData<P>,
}

impl<P: ParameterName> ParameterSet<P> {
    pub fn new() -> Self {
        Self::from_form(FormUrlEncoded::new())
    }

    /// Start from parameters that are already present, e.g. the query of an
    /// authorization endpoint URL.
    pub(crate) fn from_form(form: FormUrlEncoded) -> Self {
        Self {
            form,
            _names: PhantomData,
        }
    }

    pub fn set(&mut self, name: P, value: impl Into<String>) -> &mut Self {
        self.form.insert(name.as_str(), value);
        self
    }

    pub fn set_opt(&mut self, name: P, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    pub fn get(&self, name: P) -> Option<&str> {
        self.form.get(name.as_str())
    }

    pub fn into_form(self) -> FormUrlEncoded {
        self.form
    }
}

impl<P: ParameterName> Default for ParameterSet<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_rfc() {
        assert_eq!(AuthorizationParam::ResponseType.as_str(), "response_type");
        assert_eq!(AuthorizationParam::RedirectUri.as_str(), "redirect_uri");
        assert_eq!(AuthorizationCodeTokenParam::Code.as_str(), "code");
        assert_eq!(PasswordParam::Username.as_str(), "username");
        assert_eq!(ClientCredentialsParam::GrantType.as_str(), "grant_type");
        assert_eq!(RefreshTokenParam::RefreshToken.as_str(), "refresh_token");
    }

    #[test]
    fn client_auth_constants_point_at_client_fields() {
        assert_eq!(PasswordParam::CLIENT_ID.as_str(), "client_id");
        assert_eq!(ClientCredentialsParam::CLIENT_SECRET.as_str(), "client_secret");
    }

    #[test]
    fn set_opt_omits_absent_values() {
        let mut params = ParameterSet::<ClientCredentialsParam>::new();
        params
            .set(ClientCredentialsParam::GrantType, "client_credentials")
            .set_opt(ClientCredentialsParam::Scope, None)
            .set_opt(ClientCredentialsParam::ClientId, Some("abc"));

        assert_eq!(params.get(ClientCredentialsParam::Scope), None);
        assert_eq!(params.get(ClientCredentialsParam::ClientId), Some("abc"));

        let form = params.into_form();
        assert_eq!(form.len(), 2);
        assert!(!form.contains_key("scope"));
    }

    #[test]
    fn set_opt_keeps_present_empty_value() {
        let mut params = ParameterSet::<AuthorizationParam>::new();
        params.set_opt(AuthorizationParam::State, Some(""));
        assert_eq!(params.get(AuthorizationParam::State), Some(""));
    }
}
