//! The shared login pipeline: one implementation of the state-check /
//! token-exchange / profile-fetch / avatar-inline sequence, parameterized by
//! the provider adapters.

use std::sync::Arc;

use app_core::avatar::AvatarFetcher;
use app_core::error::AppError;
use app_core::oauth::{OAuthError, ProviderRegistry, UserProfile};
use async_trait::async_trait;

use crate::domain::inout::CallbackInput;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait LoginUseCase: Send + Sync {
    /// The consent-page URL to redirect the browser to.
    fn auth_url(&self, provider: &str) -> Result<String, AppError>;

    /// Runs the full callback pipeline and returns the profile to render.
    async fn handle_callback(&self, input: CallbackInput) -> Result<UserProfile, AppError>;
}

pub struct LoginService {
    providers: ProviderRegistry,
    avatars: Arc<dyn AvatarFetcher>,
}

impl LoginService {
    pub fn new(providers: ProviderRegistry, avatars: Arc<dyn AvatarFetcher>) -> Self {
        Self { providers, avatars }
    }
}

#[async_trait]
impl LoginUseCase for LoginService {
    fn auth_url(&self, provider: &str) -> Result<String, AppError> {
        Ok(self.providers.get_provider(provider)?.auth_url())
    }

    async fn handle_callback(&self, input: CallbackInput) -> Result<UserProfile, AppError> {
        let provider = self.providers.get_provider(&input.provider)?;

        // Sole CSRF defense: the returned state must equal the token issued
        // for this provider. Reject before any network call.
        if input.state != provider.state_token() {
            return Err(AppError::OAuth(OAuthError::InvalidState));
        }

        let access_token = provider.exchange_code(input.code).await?;
        let mut profile = provider.fetch_profile(&access_token).await?;

        // Avatar inlining is best-effort: any failure falls back to the raw
        // URL without surfacing an error to the browser.
        profile.picture_inline = if profile.picture.is_empty() {
            String::new()
        } else {
            match self.avatars.fetch_data_uri(&profile.picture).await {
                Ok(data_uri) => data_uri,
                Err(err) => {
                    tracing::debug!("Avatar fetch failed, falling back to raw URL: {}", err);
                    profile.picture.clone()
                },
            }
        };

        Ok(profile)
    }
}
