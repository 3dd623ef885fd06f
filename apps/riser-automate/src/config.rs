//! User-supplied function inputs, collected by the host per the schema
//! the automation publishes.

use datafusr_sdk::Secret;
use serde::Deserialize;

fn default_aspect_ratio() -> f64 {
    2.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionInputs {
    pub username: String,
    pub speckle_token: Secret,
    pub api_url: Secret,
    pub api_token: Secret,
    /// Target width:depth ratio for derived shaft rectangles.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f64,
}
