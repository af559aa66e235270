mod domain;
mod inbound;
mod usecase;

use std::sync::Arc;

use app_core::avatar::AvatarFetcher;
use app_core::oauth::ProviderRegistry;
pub use inbound::router::create_router;

use crate::inbound::state::LoginState;
use crate::usecase::login::LoginService;

/// Everything the login module needs from the outside, injected explicitly
/// so tests can substitute fakes.
pub struct Dependency {
    pub providers: ProviderRegistry,
    pub avatars: Arc<dyn AvatarFetcher>,
}

pub fn new(dep: Dependency) -> LoginState {
    let login_svc = Arc::new(LoginService::new(dep.providers, dep.avatars));

    LoginState::new(login_svc)
}
