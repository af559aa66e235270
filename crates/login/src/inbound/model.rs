use serde::Deserialize;

/// Query parameters a provider sends back to the callback route. Both
/// default to empty so an absent `state` still reaches the pipeline's
/// mismatch check instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
}
