//! Credentials and client authentication state.
//!
//! The exchange accepts either an API key or a bearer access token. When both are configured
//! the API key takes precedence and the token is never sent.

#[cfg(feature = "rest")]
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
/// Secret string types that redact values in debug output for security.
pub use secrecy::{ExposeSecret, SecretString};
#[cfg(feature = "ws")]
use url::Url;

#[cfg(feature = "rest")]
use crate::Result;
use crate::{ACCESS_TOKEN_VAR, API_KEY_VAR};

/// Header carrying the API key on REST requests.
pub const API_KEY_HEADER: &str = "X-API-Key";
/// Query parameter carrying the API key on the WebSocket endpoint.
pub const API_KEY_PARAM: &str = "api_key";
/// Query parameter carrying the bearer token on the WebSocket endpoint.
pub const TOKEN_PARAM: &str = "token";

/// Authentication material for the exchange APIs.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    api_key: Option<SecretString>,
    access_token: Option<SecretString>,
}

/// The single piece of authentication material that is actually presented to the API.
#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub enum AuthMethod<'creds> {
    ApiKey(&'creds SecretString),
    Bearer(&'creds SecretString),
}

impl Credentials {
    #[must_use]
    pub fn new(api_key: Option<String>, access_token: Option<String>) -> Self {
        Self {
            api_key: api_key.map(SecretString::from),
            access_token: access_token.map(SecretString::from),
        }
    }

    #[must_use]
    pub fn api_key<S: Into<String>>(api_key: S) -> Self {
        Self::new(Some(api_key.into()), None)
    }

    #[must_use]
    pub fn bearer<S: Into<String>>(access_token: S) -> Self {
        Self::new(None, Some(access_token.into()))
    }

    /// Reads [`API_KEY_VAR`] and [`ACCESS_TOKEN_VAR`] from the environment.
    ///
    /// Returns `None` when neither variable is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from the variables `lookup` resolves; `None` when neither is present.
    fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Self::new(lookup(API_KEY_VAR), lookup(ACCESS_TOKEN_VAR));
        credentials.method().is_some().then_some(credentials)
    }

    /// Returns the material that will be presented, API key first.
    #[must_use]
    pub fn method(&self) -> Option<AuthMethod<'_>> {
        match (&self.api_key, &self.access_token) {
            (Some(key), _) => Some(AuthMethod::ApiKey(key)),
            (None, Some(token)) => Some(AuthMethod::Bearer(token)),
            (None, None) => None,
        }
    }

    /// Appends the authentication query parameter to a WebSocket endpoint.
    #[cfg(feature = "ws")]
    pub(crate) fn apply_to_url(&self, url: &mut Url) {
        match self.method() {
            Some(AuthMethod::ApiKey(key)) => {
                url.query_pairs_mut()
                    .append_pair(API_KEY_PARAM, key.expose_secret());
            }
            Some(AuthMethod::Bearer(token)) => {
                url.query_pairs_mut()
                    .append_pair(TOKEN_PARAM, token.expose_secret());
            }
            None => {}
        }
    }

    /// Returns the headers that authenticate a REST request.
    #[cfg(feature = "rest")]
    pub(crate) fn headers(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        match self.method() {
            Some(AuthMethod::ApiKey(key)) => {
                let mut value = HeaderValue::from_str(key.expose_secret())?;
                value.set_sensitive(true);
                map.insert(API_KEY_HEADER, value);
            }
            Some(AuthMethod::Bearer(token)) => {
                let mut value =
                    HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
                value.set_sensitive(true);
                map.insert(AUTHORIZATION, value);
            }
            None => {}
        }
        Ok(map)
    }
}

/// Each client can exist in one state at a time, i.e. [`state::Unauthenticated`] or
/// [`state::Authenticated`].
pub mod state {
    use crate::auth::Credentials;

    /// The initial state of the client
    #[non_exhaustive]
    #[derive(Clone, Debug)]
    pub struct Unauthenticated;

    /// The elevated state of the client, reached through
    /// [`crate::rest::Client::authenticate`].
    #[non_exhaustive]
    #[derive(Clone, Debug)]
    pub struct Authenticated {
        /// The [`Credentials`] attached to every private request.
        pub(crate) credentials: Credentials,
    }

    /// The client state can only be [`Unauthenticated`] or [`Authenticated`].
    pub trait State: sealed::Sealed {}

    impl State for Unauthenticated {}
    impl sealed::Sealed for Unauthenticated {}

    impl State for Authenticated {}
    impl sealed::Sealed for Authenticated {}

    mod sealed {
        pub trait Sealed {}
    }
}
