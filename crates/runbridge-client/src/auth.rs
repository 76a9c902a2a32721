//! Credentials attached to every request sent to the remote service.

use runbridge_core::{BridgeConfig, Error, Result};

/// Authentication configuration for remote requests.
#[derive(Clone)]
pub enum AuthConfig {
    /// Bearer token authentication (Authorization: Bearer <token>)
    Bearer {
        /// The bearer token
        token: String,
    },

    /// API key sent in a custom header
    ApiKey {
        /// Name of the header
        header: String,
        /// The API key value
        key: String,
    },
}

impl AuthConfig {
    /// Create bearer token authentication.
    ///
    /// # Example
    ///
    /// ```
    /// use runbridge_client::AuthConfig;
    ///
    /// let auth = AuthConfig::bearer("my-bearer-token");
    /// ```
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Create API key authentication in a header.
    pub fn api_key_header(header: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ApiKey {
            header: header.into(),
            key: key.into(),
        }
    }

    /// Bearer credential from configuration. A missing key is a
    /// configuration error, not something to discover on the first call.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        config
            .api_key()
            .map(Self::bearer)
            .ok_or_else(|| Error::config_error("no API key configured for the remote service"))
    }

    /// Apply authentication to a reqwest RequestBuilder.
    pub(crate) fn apply_to_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        match self {
            AuthConfig::Bearer { token } => builder.bearer_auth(token),
            AuthConfig::ApiKey { header, key } => builder.header(header, key),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            AuthConfig::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .field("key", &"***")
                .finish(),
        }
    }
}
