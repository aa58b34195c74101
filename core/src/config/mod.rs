//! Configuration management
//!
//! Settings live in `tidyagent.toml`, looked up in the working directory and
//! then in the user config directory. Environment variables override the
//! file; API keys are only ever read from the environment (or `.env`).

pub mod store;

pub use store::{AgentSection, Config, LlmSection, LoggingSection, CONFIG_FILE_NAME};

use std::path::PathBuf;

/// Find the configuration file in standard locations
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(dir) = get_config_dir() {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Get the configuration directory path
pub fn get_config_dir() -> Option<PathBuf> {
    use dirs::config_dir;
    use home::home_dir;

    if let Some(dir) = config_dir() {
        return Some(dir.join("tidyagent"));
    }

    if let Some(home) = home_dir() {
        return Some(home.join(".config").join("tidyagent"));
    }

    None
}
