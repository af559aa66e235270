use app_core::error::AppError;
use app_core::extractors::AppQuery;
use app_core::oauth::{PROVIDER_GITHUB, PROVIDER_GOOGLE, UserProfile};
use askama::Template;
use axum::debug_handler;
use axum::extract::State;
use axum::response::{Html, Redirect};

use crate::domain::inout::CallbackInput;
use crate::inbound::model::CallbackRequest;
use crate::inbound::state::LoginState;
use crate::inbound::view::IndexPage;

#[debug_handler]
pub async fn index() -> Result<Html<String>, AppError> {
    render_page(None)
}

#[debug_handler]
pub async fn google_login(State(state): State<LoginState>) -> Result<Redirect, AppError> {
    begin_login(&state, PROVIDER_GOOGLE)
}

#[debug_handler]
pub async fn github_login(State(state): State<LoginState>) -> Result<Redirect, AppError> {
    begin_login(&state, PROVIDER_GITHUB)
}

#[debug_handler]
pub async fn google_callback(
    State(state): State<LoginState>,
    AppQuery(req): AppQuery<CallbackRequest>,
) -> Result<Html<String>, AppError> {
    finish_login(&state, PROVIDER_GOOGLE, req).await
}

#[debug_handler]
pub async fn github_callback(
    State(state): State<LoginState>,
    AppQuery(req): AppQuery<CallbackRequest>,
) -> Result<Html<String>, AppError> {
    finish_login(&state, PROVIDER_GITHUB, req).await
}

fn begin_login(state: &LoginState, provider: &str) -> Result<Redirect, AppError> {
    let url = state.login.auth_url(provider)?;

    // 307, so the browser re-issues the GET against the consent page.
    Ok(Redirect::temporary(&url))
}

async fn finish_login(state: &LoginState, provider: &str, req: CallbackRequest) -> Result<Html<String>, AppError> {
    let profile = state
        .login
        .handle_callback(CallbackInput { provider: provider.to_string(), state: req.state, code: req.code })
        .await?;

    tracing::info!(provider, name = %profile.name, email = %profile.email, "User authenticated");

    render_page(Some(&profile))
}

fn render_page(user: Option<&UserProfile>) -> Result<Html<String>, AppError> {
    let page = IndexPage { user };

    Ok(Html(page.render()?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use app_core::oauth::OAuthError;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::inbound::router::create_router;
    use crate::usecase::login::MockLoginUseCase;

    fn app(usecase: MockLoginUseCase) -> axum::Router {
        create_router(LoginState::new(Arc::new(usecase)))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn sample_profile() -> UserProfile {
        UserProfile {
            id: "1".to_string(),
            name: String::new(),
            email: "a@x.com".to_string(),
            given_name: "octocat".to_string(),
            family_name: String::new(),
            locale: String::new(),
            picture: "https://x/a.png".to_string(),
            picture_inline: "data:image/png;base64,AAAA".to_string(),
            verified_email: true,
        }
    }

    #[tokio::test]
    async fn test_index_renders_login_links() {
        let response = app(MockLoginUseCase::new())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("href=\"/login\""));
        assert!(body.contains("href=\"/github.login\""));
    }

    #[tokio::test]
    async fn test_google_login_redirects_to_consent_page() {
        let mut usecase = MockLoginUseCase::new();
        usecase
            .expect_auth_url()
            .withf(|provider| provider == "google")
            .returning(|_| Ok("https://accounts.google.com/o/oauth2/auth?state=random".to_string()));

        let response = app(usecase)
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://accounts.google.com/o/oauth2/auth?state=random"
        );
    }

    #[tokio::test]
    async fn test_github_login_redirects_to_consent_page() {
        let mut usecase = MockLoginUseCase::new();
        usecase
            .expect_auth_url()
            .withf(|provider| provider == "github")
            .returning(|_| Ok("https://github.com/login/oauth/authorize?state=githubstate".to_string()));

        let response = app(usecase)
            .oneshot(Request::builder().uri("/github.login").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn test_github_callback_renders_profile() {
        let mut usecase = MockLoginUseCase::new();
        usecase
            .expect_handle_callback()
            .withf(|input| input.provider == "github" && input.state == "githubstate" && input.code == "abc")
            .returning(|_| Box::pin(async { Ok(sample_profile()) }));

        let response = app(usecase)
            .oneshot(
                Request::builder()
                    .uri("/github.callback?state=githubstate&code=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("ID:</span> 1</p>"));
        assert!(body.contains("a@x.com"));
        assert!(body.contains("octocat"));
        assert!(body.contains("src=\"data:image/png;base64,AAAA\""));
    }

    #[tokio::test]
    async fn test_callback_with_invalid_state_is_bad_request() {
        let mut usecase = MockLoginUseCase::new();
        usecase
            .expect_handle_callback()
            .returning(|_| Box::pin(async { Err(AppError::OAuth(OAuthError::InvalidState)) }));

        let response = app(usecase)
            .oneshot(
                Request::builder()
                    .uri("/callback?state=forged&code=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        assert!(body.contains("Invalid OAuth state token"));
    }

    #[tokio::test]
    async fn test_callback_without_parameters_still_reaches_state_check() {
        let mut usecase = MockLoginUseCase::new();
        usecase
            .expect_handle_callback()
            .withf(|input| input.state.is_empty() && input.code.is_empty())
            .returning(|_| Box::pin(async { Err(AppError::OAuth(OAuthError::InvalidState)) }));

        let response = app(usecase)
            .oneshot(Request::builder().uri("/callback").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app(MockLoginUseCase::new())
            .oneshot(Request::builder().uri("/logout").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
