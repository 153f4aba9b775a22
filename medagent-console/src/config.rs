use clap::Args;
use medagent_core::service::DEFAULT_BASE_URL;
use medagent_core::{ClientConfig, LanguageCode};

/// Settings shared by every command, read from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct ConsoleConfig {
    /// Base URL of the analysis service
    #[arg(long, env = "MEDAGENT_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub api_url: String,

    /// Language for page chrome; also seeds each workflow's output language
    #[arg(long, env = "MEDAGENT_UI_LANGUAGE", default_value = "en", global = true)]
    pub ui_language: LanguageCode,
}

impl ConsoleConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
        }
    }
}
