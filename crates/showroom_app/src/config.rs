use std::path::PathBuf;

use showroom_client::ClientConfig;

/// App-level configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    /// Where the session file lives; `SHOWROOM_STATE_DIR` overrides.
    pub state_dir: PathBuf,
    /// Optional non-interactive login credentials.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let state_dir = std::env::var("SHOWROOM_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(".showroom")
            });

        Self {
            client: ClientConfig::from_env(),
            state_dir,
            username: non_empty_var("SHOWROOM_USERNAME"),
            password: non_empty_var("SHOWROOM_PASSWORD"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
