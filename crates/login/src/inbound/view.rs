use app_core::oauth::UserProfile;
use askama::Template;

/// The single page of the application: a login prompt when no user is
/// present, the profile card after a successful callback.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub user: Option<&'a UserProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logged_out_view_lists_both_providers() {
        let page = IndexPage { user: None };

        let html = page.render().unwrap();

        assert!(html.contains("href=\"/login\""));
        assert!(html.contains("href=\"/github.login\""));
        assert!(!html.contains("Verified Email"));
    }

    #[test]
    fn test_logged_in_view_renders_profile_fields() {
        let user = UserProfile {
            id: "1".to_string(),
            name: "Octo Cat".to_string(),
            email: "a@x.com".to_string(),
            given_name: "octocat".to_string(),
            family_name: String::new(),
            locale: "San Francisco".to_string(),
            picture: "https://x/a.png".to_string(),
            picture_inline: "data:image/png;base64,AAAA".to_string(),
            verified_email: true,
        };
        let page = IndexPage { user: Some(&user) };

        let html = page.render().unwrap();

        assert!(html.contains("Octo Cat"));
        assert!(html.contains("a@x.com"));
        assert!(html.contains("octocat"));
        assert!(html.contains("San Francisco"));
        assert!(html.contains("src=\"data:image/png;base64,AAAA\""));
        assert!(html.contains("true"));
        assert!(!html.contains("href=\"/login\""));
    }
}
