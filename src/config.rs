//! Storefront configuration types.
//!
//! The storefront's process-wide settings, deserialized from TOML. Every
//! field has a declared default so an absent or partial configuration file
//! still yields a usable value; callers that need hard guarantees run
//! [`StorefrontConfig::validate`] after loading.
//!
//! The OAuth2 endpoints are carried here for the externally implemented
//! token flows; this crate never calls them itself. The token obtained from
//! those flows is attached to the client via
//! [`set_bearer_token`](crate::ApiClient::set_bearer_token).

use serde::Deserialize;
use url::Url;

use crate::error::{ErrorKind, Result, UserError};

/// Root storefront configuration.
///
/// # Examples
///
/// ```
/// use storefront_client::StorefrontConfig;
///
/// let toml = r#"
///     api_base_url = "https://api.example.com/v1"
///     merchant_id = 21
///     tax_percentage = 15
///
///     [oauth]
///     client_id = "storefront"
///     token_endpoint = "https://auth.example.com/token"
/// "#;
///
/// let config = StorefrontConfig::from_toml(toml).unwrap();
/// assert_eq!(config.merchant_id, 21);
/// assert!(!config.developer_mode);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorefrontConfig {
    /// Base URL of the payment API, e.g. `https://api.example.com/v1`.
    #[serde(default)]
    pub api_base_url: String,

    /// Identifier of the merchant this storefront sells for.
    #[serde(default)]
    pub merchant_id: i64,

    /// OAuth2 settings for the externally implemented token flows.
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Tax applied at checkout, whole percent.
    #[serde(default)]
    pub tax_percentage: i64,

    /// Enables the developer request-inspection UI.
    #[serde(default)]
    pub developer_mode: bool,
}

/// OAuth2 client settings.
///
/// Only carried through to the external flow; the secret never appears in
/// logs or diagnostics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthConfig {
    /// Client id issued by the payment provider.
    #[serde(default)]
    pub client_id: String,

    /// Client secret issued by the payment provider.
    #[serde(default)]
    pub client_secret: String,

    /// Token endpoint for the client-credentials / code exchange.
    #[serde(default)]
    pub token_endpoint: String,

    /// Authorize endpoint for the authorization-code flow.
    #[serde(default)]
    pub authorize_endpoint: String,
}

impl StorefrontConfig {
    /// Parses configuration from TOML text.
    ///
    /// Missing fields take their defaults; only syntactically invalid TOML
    /// or type mismatches fail.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`ErrorKind::State`] when parsing fails.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| UserError::new(ErrorKind::State, format!("invalid configuration: {e}")))
    }

    /// Validates that every configured URL is well-formed HTTPS.
    ///
    /// Empty URLs are allowed — they mean "not configured" — matching the
    /// defaulting behavior of the rest of this type.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`ErrorKind::State`] naming the offending
    /// setting.
    pub fn validate(&self) -> Result<()> {
        validate_https("api_base_url", &self.api_base_url)?;
        validate_https("oauth.token_endpoint", &self.oauth.token_endpoint)?;
        validate_https("oauth.authorize_endpoint", &self.oauth.authorize_endpoint)?;
        Ok(())
    }
}

fn validate_https(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    let url = Url::parse(value)
        .map_err(|e| UserError::new(ErrorKind::State, format!("{name} is not a valid URL: {e}")))?;
    if url.scheme() != "https" {
        return Err(UserError::new(ErrorKind::State, format!("{name} must use HTTPS")));
    }
    Ok(())
}
