/// Backend endpoint configuration.
///
/// The browser build has no runtime environment, so the base URL is baked in
/// at compile time via `VIGIL_API_URL` and falls back to the local
/// development backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::new(option_env!("VIGIL_API_URL").unwrap_or(DEFAULT_BASE_URL))
    }

    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
