use std::sync::Arc;

use crate::usecase::login::LoginUseCase;

#[derive(Clone)]
pub struct LoginState {
    pub login: Arc<dyn LoginUseCase>,
}

impl LoginState {
    pub fn new(login: Arc<dyn LoginUseCase>) -> Self {
        Self { login }
    }
}
