/// What a provider callback carries into the login pipeline. `state` and
/// `code` arrive as query parameters; absent values are empty strings, which
/// the state check then rejects.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackInput {
    pub provider: String,
    pub state: String,
    pub code: String,
}
