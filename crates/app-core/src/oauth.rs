//! OAuth2 provider adapters for the web login flow.
//!
//! Each provider owns its client credentials and endpoint pair and implements
//! the two-step protocol: build the consent-page URL, then turn a returned
//! authorization code into a normalized [`UserProfile`].

use std::collections::HashMap;
use std::sync::Arc;

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use reqwest::{Client, ClientBuilder, redirect};
use serde::Deserialize;
use thiserror::Error;

pub const PROVIDER_GOOGLE: &str = "google";
pub const PROVIDER_GITHUB: &str = "github";

// Fixed anti-forgery state values, checked verbatim on callback.
const GOOGLE_STATE_TOKEN: &str = "random";
const GITHUB_STATE_TOKEN: &str = "githubstate";

// GitHub's API rejects requests without a User-Agent header.
const API_USER_AGENT: &str = "sso-login";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid OAuth state token")]
    InvalidState,

    #[error("OAuth token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Failed to fetch user profile: {0}")]
    ProfileFetch(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),
}

/// The provider-agnostic user record consumed by the presentation layer.
///
/// Fields a provider lacks hold an empty string. `picture` is the raw avatar
/// URL as reported by the provider; `picture_inline` is filled in by the
/// login pipeline with a `data:` URI, or falls back to the raw URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub locale: String,
    pub picture: String,
    pub picture_inline: String,
    pub verified_email: bool,
}

#[async_trait::async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync + std::fmt::Debug {
    /// Builds the consent-page URL embedding client id, redirect URL, scopes
    /// and the fixed state token. Pure function of the stored configuration.
    fn auth_url(&self) -> String;

    /// The state value this provider expects back on callback.
    fn state_token(&self) -> &str;

    /// Exchanges an authorization code for an access token.
    async fn exchange_code(&self, code: String) -> Result<String, OAuthError>;

    /// Fetches the user's profile and maps it onto [`UserProfile`]. Avatar
    /// inlining is not part of this step.
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, OAuthError>;
}

fn api_client() -> Result<Client, OAuthError> {
    ClientBuilder::new()
        .user_agent(API_USER_AGENT)
        .redirect(redirect::Policy::none())
        .build()
        .map_err(OAuthError::HttpClient)
}

fn describe_token_error<RE, TE>(err: &oauth2::RequestTokenError<RE, TE>) -> String
where
    RE: std::error::Error + 'static,
    TE: oauth2::ErrorResponse,
{
    match err {
        oauth2::RequestTokenError::ServerResponse(inner) => {
            format!("Server response error: {inner:?}")
        },
        oauth2::RequestTokenError::Parse(_, body) => {
            if let Ok(body_str) = std::str::from_utf8(body) {
                format!("Parse error. Response body: {body_str}")
            } else {
                "Parse error with non-UTF8 response".to_string()
            }
        },
        _ => format!("Token exchange error: {err:?}"),
    }
}

/// Endpoint pair and userinfo URL for Google. Overridable so tests can point
/// the provider at a stub server.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct GoogleProvider {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    userinfo_url: String,
    state_token: String,
    http: Client,
}

impl GoogleProvider {
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Result<Self, OAuthError> {
        Self::with_endpoints(client_id, client_secret, redirect_url, GoogleEndpoints::default())
    }

    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        redirect_url: String,
        endpoints: GoogleEndpoints,
    ) -> Result<Self, OAuthError> {
        Ok(Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            auth_url: AuthUrl::new(endpoints.auth_url)?,
            token_url: TokenUrl::new(endpoints.token_url)?,
            redirect_url: RedirectUrl::new(redirect_url)?,
            userinfo_url: endpoints.userinfo_url,
            state_token: GOOGLE_STATE_TOKEN.to_string(),
            http: api_client()?,
        })
    }
}

/// Userinfo v2 response. Google omits fields the user has not populated, so
/// everything defaults to empty.
#[derive(Deserialize)]
struct GoogleUser {
    #[serde(default)]
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    verified_email: bool,
    #[serde(default)]
    name: String,
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    family_name: String,
    #[serde(default)]
    picture: String,
    #[serde(default)]
    locale: String,
}

#[async_trait::async_trait]
impl AuthProvider for GoogleProvider {
    fn auth_url(&self) -> String {
        let (auth_url, _csrf_token) = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .authorize_url(|| CsrfToken::new(self.state_token.clone()))
            .add_scope(Scope::new("https://www.googleapis.com/auth/userinfo.email".to_string()))
            .add_scope(Scope::new("https://www.googleapis.com/auth/userinfo.profile".to_string()))
            .url();

        auth_url.to_string()
    }

    fn state_token(&self) -> &str {
        &self.state_token
    }

    async fn exchange_code(&self, code: String) -> Result<String, OAuthError> {
        let token_result = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                let error_msg = describe_token_error(&e);
                tracing::warn!("Google token exchange failed: {}", error_msg);
                OAuthError::TokenExchange(error_msg)
            })?;

        Ok(token_result.access_token().secret().to_string())
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, OAuthError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::ProfileFetch(format!(
                "userinfo endpoint returned status {}",
                response.status()
            )));
        }

        let user: GoogleUser = response
            .json()
            .await
            .map_err(|e| OAuthError::ProfileFetch(format!("malformed userinfo response: {e}")))?;

        Ok(UserProfile {
            id: user.id,
            name: user.name,
            email: user.email,
            given_name: user.given_name,
            family_name: user.family_name,
            locale: user.locale,
            picture: user.picture,
            picture_inline: String::new(),
            verified_email: user.verified_email,
        })
    }
}

/// Endpoint set for GitHub, including the secondary email-list URL.
#[derive(Debug, Clone)]
pub struct GitHubEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub user_url: String,
    pub emails_url: String,
}

impl Default for GitHubEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            user_url: "https://api.github.com/user".to_string(),
            emails_url: "https://api.github.com/user/emails".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct GitHubProvider {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    user_url: String,
    emails_url: String,
    state_token: String,
    http: Client,
}

impl GitHubProvider {
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Result<Self, OAuthError> {
        Self::with_endpoints(client_id, client_secret, redirect_url, GitHubEndpoints::default())
    }

    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        redirect_url: String,
        endpoints: GitHubEndpoints,
    ) -> Result<Self, OAuthError> {
        Ok(Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            auth_url: AuthUrl::new(endpoints.auth_url)?,
            token_url: TokenUrl::new(endpoints.token_url)?,
            redirect_url: RedirectUrl::new(redirect_url)?,
            user_url: endpoints.user_url,
            emails_url: endpoints.emails_url,
            state_token: GITHUB_STATE_TOKEN.to_string(),
            http: api_client()?,
        })
    }

    /// GitHub hides the email by default; this asks the email-list endpoint
    /// instead. Any failure here is non-fatal for the caller.
    async fn fetch_primary_email(&self, access_token: &str) -> Result<Option<String>, OAuthError> {
        let response = self
            .http
            .get(&self.emails_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::ProfileFetch(format!(
                "email endpoint returned status {}",
                response.status()
            )));
        }

        let emails: Vec<GitHubEmail> = response
            .json()
            .await
            .map_err(|e| OAuthError::ProfileFetch(format!("malformed email response: {e}")))?;

        Ok(select_email(&emails).map(str::to_string))
    }
}

#[derive(Deserialize)]
struct GitHubUser {
    id: i64,
    #[serde(default)]
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar_url: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Picks the entry flagged both primary and verified, falling back to the
/// first entry; `None` when the list is empty.
fn select_email(emails: &[GitHubEmail]) -> Option<&str> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.first())
        .map(|e| e.email.as_str())
}

#[async_trait::async_trait]
impl AuthProvider for GitHubProvider {
    fn auth_url(&self) -> String {
        let (auth_url, _csrf_token) = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .authorize_url(|| CsrfToken::new(self.state_token.clone()))
            .add_scope(Scope::new("user:email".to_string()))
            .url();

        auth_url.to_string()
    }

    fn state_token(&self) -> &str {
        &self.state_token
    }

    async fn exchange_code(&self, code: String) -> Result<String, OAuthError> {
        let token_result = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                let error_msg = describe_token_error(&e);
                tracing::warn!("GitHub token exchange failed: {}", error_msg);
                OAuthError::TokenExchange(error_msg)
            })?;

        Ok(token_result.access_token().secret().to_string())
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, OAuthError> {
        let response = self
            .http
            .get(&self.user_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::ProfileFetch(format!(
                "user endpoint returned status {}",
                response.status()
            )));
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| OAuthError::ProfileFetch(format!("malformed user response: {e}")))?;

        let mut email = user.email.unwrap_or_default();
        if email.is_empty() {
            match self.fetch_primary_email(access_token).await {
                Ok(found) => email = found.unwrap_or_default(),
                Err(err) => {
                    tracing::debug!("GitHub email lookup failed, leaving email empty: {}", err);
                },
            }
        }

        Ok(UserProfile {
            id: user.id.to_string(),
            name: user.name.unwrap_or_default(),
            email,
            // GitHub has no given/family name split; the login name stands in.
            given_name: user.login,
            family_name: String::new(),
            locale: user.location.unwrap_or_default(),
            picture: user.avatar_url,
            picture_inline: String::new(),
            verified_email: true,
        })
    }
}

/// Name-indexed set of configured providers, shared read-only across requests.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn AuthProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self { providers: HashMap::new() }
    }

    pub fn add_provider(&mut self, name: &str, provider: Arc<dyn AuthProvider>) {
        self.providers.insert(name.to_string(), provider);
    }

    pub fn get_provider(&self, name: &str) -> Result<&Arc<dyn AuthProvider>, OAuthError> {
        self.providers
            .get(name)
            .ok_or_else(|| OAuthError::ProviderNotFound(name.to_string()))
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}
